//! AWS Security Token Service delegation client

use super::DelegationClient;
use crate::config::ProviderConfig;
use crate::core::{DelegatedSession, ExchangeError, Identity};
use async_trait::async_trait;
use aws_sdk_sts::config::retry::RetryConfig;
use aws_sdk_sts::config::timeout::TimeoutConfig;
use aws_sdk_sts::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_sts::error::{DisplayErrorContext, SdkError};
use std::fmt;
use std::time::{Duration, SystemTime};

const CREDENTIALS_PROVIDER_NAME: &str = "tempcred-explicit";

/// `AssumeRole` over the AWS STS API
///
/// The base SDK configuration (region, endpoint, timeouts) is built once;
/// each exchange layers the caller's identity on top as static credentials,
/// so the underlying HTTP client is shared between calls.
///
/// SDK retries are disabled: a failed exchange is reported immediately.
#[derive(Clone)]
pub struct StsDelegationClient {
    base: aws_sdk_sts::Config,
    region: String,
    endpoint: Option<String>,
    timeout: Duration,
}

impl StsDelegationClient {
    /// Create a client from provider settings
    pub fn from_config(config: &ProviderConfig) -> Self {
        let mut builder = aws_sdk_sts::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .retry_config(RetryConfig::disabled())
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(config.exchange_timeout)
                    .build(),
            );

        if let Some(endpoint) = &config.sts_endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        tracing::debug!(
            region = %config.region,
            endpoint = ?config.sts_endpoint,
            timeout = ?config.exchange_timeout,
            "Initialized STS delegation client"
        );

        Self {
            base: builder.build(),
            region: config.region.clone(),
            endpoint: config.sts_endpoint.clone(),
            timeout: config.exchange_timeout,
        }
    }

    fn classify<E, R>(&self, err: SdkError<E, R>) -> ExchangeError
    where
        E: std::error::Error + 'static,
        R: fmt::Debug,
    {
        match &err {
            SdkError::TimeoutError(_) => ExchangeError::Timeout {
                duration: self.timeout,
            },
            SdkError::ServiceError(_) => {
                ExchangeError::Rejected(DisplayErrorContext(&err).to_string())
            }
            SdkError::ResponseError(_) => {
                ExchangeError::MalformedResponse(DisplayErrorContext(&err).to_string())
            }
            _ => ExchangeError::Transport(DisplayErrorContext(&err).to_string()),
        }
    }
}

impl fmt::Debug for StsDelegationClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StsDelegationClient")
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl DelegationClient for StsDelegationClient {
    #[tracing::instrument(skip(self, identity), fields(access_key_id = %identity.access_key_id()))]
    async fn assume_role(
        &self,
        identity: &Identity,
        role_arn: &str,
        session_name: &str,
        duration: Duration,
    ) -> Result<DelegatedSession, ExchangeError> {
        let credentials = Credentials::new(
            identity.access_key_id(),
            identity.secret_access_key().expose_secret(str::to_owned),
            identity
                .session_token()
                .map(|token| token.expose_secret(str::to_owned)),
            None,
            CREDENTIALS_PROVIDER_NAME,
        );
        let client = aws_sdk_sts::Client::from_conf(
            self.base
                .to_builder()
                .credentials_provider(credentials)
                .build(),
        );

        let output = client
            .assume_role()
            .role_arn(role_arn)
            .role_session_name(session_name)
            .duration_seconds(i32::try_from(duration.as_secs()).unwrap_or(i32::MAX))
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let issued = output.credentials().ok_or_else(|| {
            ExchangeError::MalformedResponse("AssumeRole response carried no credentials".into())
        })?;

        let expires_at = SystemTime::try_from(*issued.expiration()).map_err(|e| {
            ExchangeError::MalformedResponse(format!(
                "expiration {} is not representable: {e}",
                issued.expiration()
            ))
        })?;

        Ok(DelegatedSession::new(
            issued.access_key_id(),
            issued.secret_access_key(),
            issued.session_token(),
            expires_at,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_config() -> ProviderConfig {
        ProviderConfig {
            region: "eu-central-1".into(),
            // Nothing listens on port 1
            sts_endpoint: Some("http://127.0.0.1:1".into()),
            exchange_timeout: Duration::from_secs(2),
            ..Default::default()
        }
    }

    #[test]
    fn test_from_config_uses_region_and_endpoint() {
        let client = StsDelegationClient::from_config(&unreachable_config());
        assert_eq!(
            client.base.region().map(ToString::to_string).as_deref(),
            Some("eu-central-1")
        );

        let debug = format!("{client:?}");
        assert!(debug.contains("eu-central-1"));
        assert!(debug.contains("127.0.0.1:1"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_failure() {
        let client = StsDelegationClient::from_config(&unreachable_config());
        let identity = Identity::new("AKIAEXAMPLE", "secret", Some("token".into()));

        let err = client
            .assume_role(
                &identity,
                "arn:aws:iam::123:role/X",
                "tempcred-1",
                Duration::from_secs(900),
            )
            .await
            .expect_err("nothing is listening");

        assert!(
            matches!(
                err,
                ExchangeError::Transport(_) | ExchangeError::Timeout { .. }
            ),
            "unexpected error: {err:?}"
        );
    }
}
