//! Provider configuration
//!
//! [`ProviderConfig`] is loaded once (from a keyed lookup, the process
//! environment, or any serde source) and validated before a provider is
//! built. It is never mutated afterwards.
//!
//! Durations are `std::time::Duration` end to end. Keyed inputs carry their
//! unit in the key name (`*_SECS`, `*_MILLIS`); serde inputs use humantime
//! strings such as `"60s"` or `"1h"`.

use crate::core::{ConfigError, Identity};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lifetime requested for each delegated session
pub const DEFAULT_SESSION_DURATION: Duration = Duration::from_secs(3600);
/// Renew this long before the session's hard expiry
pub const DEFAULT_RENEWAL_SKEW: Duration = Duration::from_secs(60);
/// Upper bound on a single token exchange
pub const DEFAULT_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(10);
/// Session names are this prefix followed by the current Unix time in milliseconds
pub const DEFAULT_SESSION_NAME_PREFIX: &str = "tempcred-";
/// Region used for the token-exchange endpoint
pub const DEFAULT_REGION: &str = "us-east-1";

// AssumeRole limits
const MIN_SESSION_DURATION: Duration = Duration::from_secs(900);
const MAX_SESSION_DURATION: Duration = Duration::from_secs(43_200);
const MAX_ROLE_SESSION_NAME_LEN: usize = 64;
const SESSION_NAME_SUFFIX_LEN: usize = 13;

/// Keys read by [`ProviderConfig::from_lookup`]
pub mod keys {
    /// Long-lived access key id
    pub const ACCESS_KEY_ID: &str = "TEMPCRED_ACCESS_KEY_ID";
    /// Long-lived secret access key
    pub const SECRET_ACCESS_KEY: &str = "TEMPCRED_SECRET_ACCESS_KEY";
    /// Session token paired with the long-lived keys
    pub const SESSION_TOKEN: &str = "TEMPCRED_SESSION_TOKEN";
    /// Role to assume
    pub const ROLE_ARN: &str = "TEMPCRED_ROLE_ARN";
    /// Consulted when [`ROLE_ARN`] is not set
    pub const ROLE_ARN_FALLBACK: &str = "AWS_ROLE_ARN";
    /// Locator prefix that scopes the explicit/delegated paths
    pub const RESOURCE_PREFIX: &str = "TEMPCRED_RESOURCE_PREFIX";
    /// Session lifetime in seconds
    pub const SESSION_DURATION_SECS: &str = "TEMPCRED_SESSION_DURATION_SECS";
    /// Renewal skew in milliseconds
    pub const RENEWAL_SKEW_MILLIS: &str = "TEMPCRED_RENEWAL_SKEW_MILLIS";
    /// Exchange timeout in seconds
    pub const EXCHANGE_TIMEOUT_SECS: &str = "TEMPCRED_EXCHANGE_TIMEOUT_SECS";
    /// Session name prefix
    pub const SESSION_NAME_PREFIX: &str = "TEMPCRED_SESSION_NAME_PREFIX";
    /// Token-exchange region
    pub const REGION: &str = "TEMPCRED_REGION";
    /// Token-exchange endpoint override
    pub const STS_ENDPOINT: &str = "TEMPCRED_STS_ENDPOINT";
    /// Instance metadata endpoint override
    pub const IMDS_ENDPOINT: &str = "TEMPCRED_IMDS_ENDPOINT";
}

/// Configuration for a [`CredentialProvider`](crate::provider::CredentialProvider)
///
/// # Example
///
/// ```
/// use tempcred_credential::{Identity, ProviderConfig};
///
/// let config = ProviderConfig {
///     explicit_identity: Some(Identity::new("AKIAEXAMPLE", "secret", Some("token".into()))),
///     role_arn: Some("arn:aws:iam::123456789012:role/reader".into()),
///     resource_prefix: Some("s3://bucket-a/".into()),
///     ..Default::default()
/// };
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Long-lived identity used directly or exchanged for a delegated session
    pub explicit_identity: Option<Identity>,

    /// Role to assume; when absent the explicit identity is used as-is
    pub role_arn: Option<String>,

    /// Only targets under this prefix use the explicit identity
    ///
    /// Absent or empty matches every target.
    pub resource_prefix: Option<String>,

    /// Lifetime requested for each delegated session
    ///
    /// **Validation**: between 15 minutes and 12 hours
    #[serde(with = "humantime_serde")]
    pub session_duration: Duration,

    /// Sessions are renewed once `now >= expires_at - renewal_skew`
    ///
    /// **Validation**: shorter than `session_duration`
    #[serde(with = "humantime_serde")]
    pub renewal_skew: Duration,

    /// Upper bound on a single token exchange
    ///
    /// **Validation**: between 1 and 60 seconds
    #[serde(with = "humantime_serde")]
    pub exchange_timeout: Duration,

    /// Prefix of the role session name sent with each exchange
    pub session_name_prefix: String,

    /// Region of the token-exchange endpoint
    pub region: String,

    /// Custom token-exchange endpoint (e.g. LocalStack `http://localhost:4566`)
    pub sts_endpoint: Option<String>,

    /// Custom instance metadata endpoint for the ambient identity
    ///
    /// Only used when the provider builds its own ambient source.
    pub imds_endpoint: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            explicit_identity: None,
            role_arn: None,
            resource_prefix: None,
            session_duration: DEFAULT_SESSION_DURATION,
            renewal_skew: DEFAULT_RENEWAL_SKEW,
            exchange_timeout: DEFAULT_EXCHANGE_TIMEOUT,
            session_name_prefix: DEFAULT_SESSION_NAME_PREFIX.to_string(),
            region: DEFAULT_REGION.to_string(),
            sts_endpoint: None,
            imds_endpoint: None,
        }
    }
}

impl ProviderConfig {
    /// Configured role, ignoring an empty string
    pub fn role_arn(&self) -> Option<&str> {
        self.role_arn.as_deref().filter(|arn| !arn.is_empty())
    }

    /// Configured resource prefix, ignoring an empty string
    pub fn resource_prefix(&self) -> Option<&str> {
        self.resource_prefix.as_deref().filter(|p| !p.is_empty())
    }

    /// Explicit identity, only when all of its fields are populated
    pub fn complete_identity(&self) -> Option<&Identity> {
        self.explicit_identity.as_ref().filter(|i| i.is_complete())
    }

    /// Validate every setting
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_SESSION_DURATION..=MAX_SESSION_DURATION).contains(&self.session_duration) {
            return Err(ConfigError::invalid(
                "session_duration",
                format!(
                    "must be between {} and {} seconds, got {} seconds",
                    MIN_SESSION_DURATION.as_secs(),
                    MAX_SESSION_DURATION.as_secs(),
                    self.session_duration.as_secs()
                ),
            ));
        }

        if self.renewal_skew >= self.session_duration {
            return Err(ConfigError::invalid(
                "renewal_skew",
                format!(
                    "must be shorter than session_duration ({:?} >= {:?})",
                    self.renewal_skew, self.session_duration
                ),
            ));
        }

        let timeout_secs = self.exchange_timeout.as_secs();
        if !(1..=60).contains(&timeout_secs) {
            return Err(ConfigError::invalid(
                "exchange_timeout",
                format!("must be between 1 and 60 seconds, got {timeout_secs} seconds"),
            ));
        }

        if let Some(arn) = self.role_arn()
            && !arn.starts_with("arn:")
        {
            return Err(ConfigError::invalid(
                "role_arn",
                format!("'{arn}' is not an ARN"),
            ));
        }

        let max_prefix = MAX_ROLE_SESSION_NAME_LEN - SESSION_NAME_SUFFIX_LEN;
        if self.session_name_prefix.len() > max_prefix {
            return Err(ConfigError::invalid(
                "session_name_prefix",
                format!(
                    "exceeds {max_prefix} character limit ({})",
                    self.session_name_prefix.len()
                ),
            ));
        }
        if !self
            .session_name_prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "+=,.@_-".contains(c))
        {
            return Err(ConfigError::invalid(
                "session_name_prefix",
                "may only contain letters, digits and + = , . @ _ -",
            ));
        }

        if self.region.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "region".into(),
            });
        }

        Ok(())
    }

    /// Load configuration through a string-keyed lookup
    ///
    /// Values are trimmed and empty values count as absent. The role falls
    /// back to [`keys::ROLE_ARN_FALLBACK`] when [`keys::ROLE_ARN`] is not set.
    /// The result is not validated; providers validate when they are built.
    ///
    /// # Errors
    ///
    /// - `ConfigError::Lookup` if the lookup itself fails
    /// - `ConfigError::InvalidValue` if a numeric setting does not parse
    ///
    /// # Example
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use tempcred_credential::ProviderConfig;
    /// use tempcred_credential::config::keys;
    ///
    /// let store = HashMap::from([(keys::ROLE_ARN, "arn:aws:iam::1:role/r")]);
    /// let config = ProviderConfig::from_lookup(|key| Ok(store.get(key).map(|v| v.to_string())))?;
    /// assert_eq!(config.role_arn(), Some("arn:aws:iam::1:role/r"));
    /// # Ok::<(), tempcred_credential::ConfigError>(())
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<Option<String>, ConfigError>,
    {
        let get = |key: &str| -> Result<Option<String>, ConfigError> {
            Ok(lookup(key)?
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()))
        };

        let mut config = Self::default();

        let access_key_id = get(keys::ACCESS_KEY_ID)?;
        let secret_access_key = get(keys::SECRET_ACCESS_KEY)?;
        let session_token = get(keys::SESSION_TOKEN)?;
        if access_key_id.is_some() || secret_access_key.is_some() || session_token.is_some() {
            config.explicit_identity = Some(Identity::new(
                access_key_id.unwrap_or_default(),
                secret_access_key.unwrap_or_default(),
                session_token,
            ));
        }

        config.role_arn = match get(keys::ROLE_ARN)? {
            Some(arn) => Some(arn),
            None => {
                let fallback = get(keys::ROLE_ARN_FALLBACK)?;
                match &fallback {
                    Some(arn) => tracing::warn!(
                        key = keys::ROLE_ARN_FALLBACK,
                        role_arn = %arn,
                        "No role configured; using role from fallback variable"
                    ),
                    None => tracing::debug!("No role configured; delegated sessions disabled"),
                }
                fallback
            }
        };

        config.resource_prefix = get(keys::RESOURCE_PREFIX)?;
        config = config.with_duration_overrides(&lookup)?;

        if let Some(prefix) = get(keys::SESSION_NAME_PREFIX)? {
            config.session_name_prefix = prefix;
        }
        if let Some(region) = get(keys::REGION)? {
            config.region = region;
        }
        config.sts_endpoint = get(keys::STS_ENDPOINT)?;
        config.imds_endpoint = get(keys::IMDS_ENDPOINT)?;

        Ok(config)
    }

    /// Override durations from the unit-suffixed keys
    ///
    /// Reads [`keys::SESSION_DURATION_SECS`], [`keys::RENEWAL_SKEW_MILLIS`]
    /// and [`keys::EXCHANGE_TIMEOUT_SECS`]; absent or empty keys leave the
    /// current value alone.
    ///
    /// # Errors
    ///
    /// - `ConfigError::Lookup` if the lookup itself fails
    /// - `ConfigError::InvalidValue` if a value is not a whole number
    pub fn with_duration_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<Option<String>, ConfigError>,
    {
        let number = |key: &str| -> Result<Option<u64>, ConfigError> {
            match lookup(key)?.as_deref().map(str::trim) {
                None | Some("") => Ok(None),
                Some(value) => parse_number(key, value).map(Some),
            }
        };

        if let Some(secs) = number(keys::SESSION_DURATION_SECS)? {
            self.session_duration = Duration::from_secs(secs);
        }
        if let Some(millis) = number(keys::RENEWAL_SKEW_MILLIS)? {
            self.renewal_skew = Duration::from_millis(millis);
        }
        if let Some(secs) = number(keys::EXCHANGE_TIMEOUT_SECS)? {
            self.exchange_timeout = Duration::from_secs(secs);
        }
        Ok(self)
    }

    /// Load configuration from process environment variables
    ///
    /// See [`keys`] for the variable names.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }
}

/// Lookup over the process environment
///
/// # Errors
///
/// `ConfigError::Lookup` if the variable is set but not valid Unicode.
pub fn env_lookup(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(ConfigError::Lookup {
            key: key.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .parse()
        .map_err(|e| ConfigError::invalid(key, format!("'{value}' is not a number: {e}")))
}
