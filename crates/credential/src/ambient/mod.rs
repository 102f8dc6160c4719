//! Ambient (host-provided) identity
//!
//! The host identity client is created lazily on first use and the identity
//! it returns is kept for the lifetime of the source. Concurrent first
//! callers wait on a single initialization; a failed attempt is not
//! remembered, so the next caller tries again.

mod imds;

pub use imds::ImdsHostIdentity;

use crate::config::ProviderConfig;
use crate::core::{AmbientError, Identity};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Client for the host's identity service
#[async_trait]
pub trait HostIdentityClient: Send + Sync + fmt::Debug {
    /// Fetch the host's current identity
    async fn fetch(&self) -> Result<Identity, AmbientError>;
}

type ClientFactory =
    Box<dyn Fn() -> Result<Arc<dyn HostIdentityClient>, AmbientError> + Send + Sync>;

/// Process-wide ambient credential source
///
/// Share one instance (behind an `Arc`) between every provider in a process.
pub struct AmbientCredentialSource {
    factory: ClientFactory,
    client: OnceCell<Arc<dyn HostIdentityClient>>,
    identity: OnceCell<Identity>,
}

impl AmbientCredentialSource {
    /// Source whose client is built by `factory` on first use
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn HostIdentityClient>, AmbientError> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            client: OnceCell::new(),
            identity: OnceCell::new(),
        }
    }

    /// Source backed by the EC2 instance metadata service
    pub fn imds() -> Self {
        Self::new(|| Ok(Arc::new(ImdsHostIdentity::new()) as Arc<dyn HostIdentityClient>))
    }

    /// IMDS source honoring the configured metadata endpoint
    ///
    /// An invalid endpoint surfaces as [`AmbientError::ClientInit`] on first use.
    pub fn from_config(config: &ProviderConfig) -> Self {
        match config.imds_endpoint.clone() {
            Some(endpoint) => Self::new(move || {
                let client = ImdsHostIdentity::with_endpoint(&endpoint)?;
                Ok(Arc::new(client) as Arc<dyn HostIdentityClient>)
            }),
            None => Self::imds(),
        }
    }

    /// Source backed by an already constructed client
    pub fn with_client(client: Arc<dyn HostIdentityClient>) -> Self {
        Self::new(move || Ok(Arc::clone(&client)))
    }

    /// The host identity, fetched at most once per source
    pub async fn get(&self) -> Result<Identity, AmbientError> {
        let identity = self
            .identity
            .get_or_try_init(|| async {
                let client = self
                    .client
                    .get_or_try_init(|| async {
                        tracing::debug!("Creating host identity client");
                        (self.factory)()
                    })
                    .await?;

                let identity = client.fetch().await?;
                tracing::info!(
                    access_key_id = %identity.access_key_id(),
                    "Ambient identity initialized"
                );
                Ok::<_, AmbientError>(identity)
            })
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Ambient identity unavailable"))?;

        Ok(identity.clone())
    }

    /// Whether the identity has already been fetched
    pub fn is_populated(&self) -> bool {
        self.identity.initialized()
    }
}

impl fmt::Debug for AmbientCredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AmbientCredentialSource")
            .field("client", &self.client.get())
            .field("populated", &self.is_populated())
            .finish_non_exhaustive()
    }
}
