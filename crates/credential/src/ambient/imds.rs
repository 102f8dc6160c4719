//! EC2 instance metadata service as the host identity source

use super::HostIdentityClient;
use crate::core::{AmbientError, Identity};
use async_trait::async_trait;
use aws_config::imds::client::Client;
use aws_config::imds::credentials::ImdsCredentialsProvider;
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_sts::error::DisplayErrorContext;
use std::fmt;

/// Reads the instance role's credentials from IMDS
pub struct ImdsHostIdentity {
    provider: ImdsCredentialsProvider,
    endpoint: Option<String>,
}

impl ImdsHostIdentity {
    /// Client against the default metadata endpoint
    pub fn new() -> Self {
        Self {
            provider: ImdsCredentialsProvider::builder().build(),
            endpoint: None,
        }
    }

    /// Client against a custom metadata endpoint
    pub fn with_endpoint(endpoint: &str) -> Result<Self, AmbientError> {
        let client = Client::builder()
            .endpoint(endpoint)
            .map_err(|e| AmbientError::ClientInit(format!("invalid IMDS endpoint '{endpoint}': {e}")))?
            .build();

        Ok(Self {
            provider: ImdsCredentialsProvider::builder().imds_client(client).build(),
            endpoint: Some(endpoint.to_owned()),
        })
    }
}

impl Default for ImdsHostIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ImdsHostIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImdsHostIdentity")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[async_trait]
impl HostIdentityClient for ImdsHostIdentity {
    async fn fetch(&self) -> Result<Identity, AmbientError> {
        let credentials = self
            .provider
            .provide_credentials()
            .await
            .map_err(|e| AmbientError::Unavailable(DisplayErrorContext(&e).to_string()))?;

        tracing::debug!(
            expires_at = ?credentials.expiry(),
            "Loaded host identity from instance metadata"
        );

        Ok(Identity::new(
            credentials.access_key_id(),
            credentials.secret_access_key(),
            credentials.session_token().map(str::to_owned),
        ))
    }
}
