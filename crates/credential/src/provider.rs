//! Public entry point: resolves, caches and returns credentials per target

use crate::ambient::AmbientCredentialSource;
use crate::cache::{CacheState, CacheStats, CredentialCache, RenewalSettings};
use crate::clock::{Clock, SystemClock};
use crate::config::ProviderConfig;
use crate::core::{ConfigError, CredentialError, DelegatedSession, Identity, ResourceTarget, Result};
use crate::delegation::{DelegationClient, StsDelegationClient};
use crate::policy::{self, Resolution};
use std::sync::Arc;
use std::time::SystemTime;

/// Hands out credentials for resource targets
///
/// Each provider owns its own [`CredentialCache`]; the ambient source is
/// shared between providers by passing the same `Arc` to each builder.
///
/// # Example
///
/// ```no_run
/// use tempcred_credential::{CredentialProvider, ProviderConfig, ResourceTarget};
///
/// # async fn run() -> tempcred_credential::Result<()> {
/// let provider = CredentialProvider::builder(ProviderConfig::from_env()?).build()?;
/// let identity = provider
///     .get_credentials(&ResourceTarget::new("s3://bucket-a/key"))
///     .await?;
/// println!("{}", identity.access_key_id());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CredentialProvider {
    inner: std::result::Result<Ready, ConfigError>,
}

#[derive(Debug)]
struct Ready {
    config: ProviderConfig,
    ambient: Arc<AmbientCredentialSource>,
    explicit: Option<Identity>,
    delegated: Option<Delegated>,
}

#[derive(Debug)]
struct Delegated {
    client: Arc<dyn DelegationClient>,
    identity: Identity,
    role_arn: String,
    cache: CredentialCache,
}

impl Delegated {
    async fn session(&self) -> Result<DelegatedSession> {
        self.cache
            .get_or_renew(self.client.as_ref(), &self.identity, &self.role_arn)
            .await
    }
}

impl CredentialProvider {
    /// Start building a provider
    pub fn builder(config: ProviderConfig) -> CredentialProviderBuilder {
        CredentialProviderBuilder::new(config)
    }

    /// Credentials for `target`
    ///
    /// # Errors
    ///
    /// - [`CredentialError::Initialization`] if construction failed
    /// - [`CredentialError::Delegation`] if no usable delegated session exists
    /// - [`CredentialError::AmbientUnavailable`] if the host identity can't be read
    #[tracing::instrument(skip(self), fields(target = %target))]
    pub async fn get_credentials(&self, target: &ResourceTarget) -> Result<Identity> {
        let ready = self.ready()?;
        let resolution = policy::resolve(target, &ready.config);
        tracing::debug!(%resolution, "Resolved credential path");

        match (resolution, &ready.explicit, &ready.delegated) {
            (Resolution::DelegatedRole, _, Some(delegated)) => {
                Ok(delegated.session().await?.to_identity())
            }
            (Resolution::ExplicitSession, Some(identity), _) => Ok(identity.clone()),
            _ => ready
                .ambient
                .get()
                .await
                .map_err(|source| CredentialError::AmbientUnavailable { source }),
        }
    }

    /// Force renewal of the delegated session
    ///
    /// Does nothing when no role is configured.
    #[tracing::instrument(skip(self))]
    pub async fn refresh(&self) -> Result<()> {
        let ready = self.ready()?;
        if let Some(delegated) = &ready.delegated {
            delegated
                .cache
                .force_renew(delegated.client.as_ref(), &delegated.identity, &delegated.role_arn)
                .await?;
        }
        Ok(())
    }

    /// Which path would serve `target`
    pub fn resolution(&self, target: &ResourceTarget) -> Result<Resolution> {
        Ok(policy::resolve(target, &self.ready()?.config))
    }

    /// Validated configuration
    pub fn config(&self) -> Result<&ProviderConfig> {
        Ok(&self.ready()?.config)
    }

    /// State of the delegated session cache, if delegation is configured
    pub async fn cache_state(&self) -> Option<CacheState> {
        match self.delegated() {
            Some(delegated) => Some(delegated.cache.state().await),
            None => None,
        }
    }

    /// Hard expiry of the cached delegated session, if there is one
    pub async fn session_expires_at(&self) -> Option<SystemTime> {
        let delegated = self.delegated()?;
        delegated
            .cache
            .current()
            .await
            .map(|session| session.expires_at())
    }

    /// Cache counters, if delegation is configured
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.delegated().map(|d| d.cache.stats())
    }

    fn ready(&self) -> Result<&Ready> {
        self.inner
            .as_ref()
            .map_err(|source| CredentialError::Initialization {
                source: source.clone(),
            })
    }

    fn delegated(&self) -> Option<&Delegated> {
        self.inner.as_ref().ok()?.delegated.as_ref()
    }
}

/// Builder for [`CredentialProvider`]
pub struct CredentialProviderBuilder {
    config: std::result::Result<ProviderConfig, ConfigError>,
    ambient: Option<Arc<AmbientCredentialSource>>,
    delegation: Option<Arc<dyn DelegationClient>>,
    clock: Option<Arc<dyn Clock>>,
}

impl CredentialProviderBuilder {
    /// Builder for an already loaded configuration
    pub fn new(config: ProviderConfig) -> Self {
        Self::from_lookup(Ok(config))
    }

    /// Builder for the outcome of a configuration lookup
    ///
    /// A lookup error is reported by [`build`](Self::build), or held by
    /// [`build_deferred`](Self::build_deferred) until the first request.
    pub fn from_lookup(config: std::result::Result<ProviderConfig, ConfigError>) -> Self {
        Self {
            config,
            ambient: None,
            delegation: None,
            clock: None,
        }
    }

    /// Ambient source to fall back on (defaults to a new IMDS source)
    pub fn ambient(mut self, ambient: Arc<AmbientCredentialSource>) -> Self {
        self.ambient = Some(ambient);
        self
    }

    /// Token-exchange client (defaults to STS when a role is configured)
    pub fn delegation(mut self, client: Arc<dyn DelegationClient>) -> Self {
        self.delegation = Some(client);
        self
    }

    /// Time source (defaults to the system clock)
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Validate the configuration and build
    ///
    /// # Errors
    ///
    /// [`CredentialError::Configuration`] if lookup or validation failed.
    pub fn build(self) -> Result<CredentialProvider> {
        let (config, parts) = self.split();
        let ready = parts.assemble(config?);
        Ok(CredentialProvider { inner: Ok(ready) })
    }

    /// Build without failing
    ///
    /// A configuration error is returned as [`CredentialError::Initialization`]
    /// from every request made through the provider.
    pub fn build_deferred(self) -> CredentialProvider {
        let (config, parts) = self.split();
        let inner = config.map(|config| parts.assemble(config)).inspect_err(|e| {
            tracing::warn!(error = %e, "Credential provider configuration is invalid");
        });
        CredentialProvider { inner }
    }

    fn split(self) -> (std::result::Result<ProviderConfig, ConfigError>, Parts) {
        let config = self.config.and_then(|config| {
            config.validate()?;
            Ok(config)
        });
        let parts = Parts {
            ambient: self.ambient,
            delegation: self.delegation,
            clock: self.clock,
        };
        (config, parts)
    }
}

struct Parts {
    ambient: Option<Arc<AmbientCredentialSource>>,
    delegation: Option<Arc<dyn DelegationClient>>,
    clock: Option<Arc<dyn Clock>>,
}

impl Parts {
    fn assemble(self, config: ProviderConfig) -> Ready {
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let ambient = self
            .ambient
            .unwrap_or_else(|| Arc::new(AmbientCredentialSource::from_config(&config)));

        let explicit = config.complete_identity().cloned();
        let delegated = match (&explicit, config.role_arn()) {
            (Some(identity), Some(role_arn)) => {
                let client = self
                    .delegation
                    .unwrap_or_else(|| Arc::new(StsDelegationClient::from_config(&config)));
                Some(Delegated {
                    client,
                    identity: identity.clone(),
                    role_arn: role_arn.to_owned(),
                    cache: CredentialCache::new(RenewalSettings::from_config(&config), clock),
                })
            }
            _ => None,
        };

        tracing::info!(
            explicit_identity = explicit.is_some(),
            role_arn = config.role_arn(),
            resource_prefix = config.resource_prefix(),
            "Credential provider initialized"
        );

        Ready {
            config,
            ambient,
            explicit,
            delegated,
        }
    }
}
