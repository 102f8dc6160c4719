//! Error types for credential resolution
//!
//! This module defines the error hierarchy:
//! - [`CredentialError`]: what a caller of the provider sees
//! - [`ConfigError`]: missing or malformed settings
//! - [`ExchangeError`]: the token-exchange call failed
//! - [`AmbientError`]: the host identity service could not be reached
//!
//! # Error Conversion Examples
//!
//! ```
//! use tempcred_credential::core::{ConfigError, CredentialError};
//!
//! let config_err = ConfigError::MissingRequired {
//!     field: "region".to_string(),
//! };
//! let cred_err: CredentialError = config_err.into();
//! assert!(cred_err.to_string().contains("region"));
//! ```

use std::time::Duration;
use thiserror::Error;

/// Top-level credential error
///
/// All variants are `Clone`: a provider whose construction failed keeps the
/// original cause and hands a copy to every subsequent request.
#[derive(Debug, Clone, Error)]
pub enum CredentialError {
    /// Settings were rejected while building the provider
    #[error("Configuration error: {source}")]
    Configuration {
        /// Underlying configuration error
        #[from]
        source: ConfigError,
    },

    /// The provider was built in deferred mode and its configuration was bad
    #[error("Credential provider failed to initialize: {source}")]
    Initialization {
        /// The cause recorded at construction time
        #[source]
        source: ConfigError,
    },

    /// Renewing the delegated session failed and no usable session was cached
    #[error("Delegation to role '{role_arn}' failed: {source}")]
    Delegation {
        /// Role that was being assumed
        role_arn: String,
        /// Underlying exchange error
        #[source]
        source: ExchangeError,
    },

    /// The host identity service could not supply credentials
    #[error("Ambient credentials unavailable: {source}")]
    AmbientUnavailable {
        /// Underlying host identity error
        #[source]
        source: AmbientError,
    },
}

impl CredentialError {
    /// Whether retrying the same request later can succeed
    ///
    /// Exchange and host identity failures are transient; configuration
    /// problems are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Delegation { .. } | Self::AmbientUnavailable { .. })
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A value is present but not acceptable
    #[error("Invalid configuration: {field}: {reason}")]
    InvalidValue {
        /// Offending setting
        field: String,
        /// What is wrong with it
        reason: String,
    },

    /// A required setting is absent
    #[error("Missing required configuration: {field}")]
    MissingRequired {
        /// Missing setting
        field: String,
    },

    /// The configuration store could not be read
    #[error("Cannot read configuration option '{key}': {reason}")]
    Lookup {
        /// Key that was being read
        key: String,
        /// Why the lookup failed
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Token exchange errors
///
/// Produced by a [`DelegationClient`](crate::delegation::DelegationClient).
/// None of these are retried where they occur.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExchangeError {
    /// The request never produced a response
    #[error("Token exchange transport failure: {0}")]
    Transport(String),

    /// The service answered with an error (bad credentials, denied role, throttling)
    #[error("Token exchange rejected: {0}")]
    Rejected(String),

    /// The response could not be turned into a usable session
    #[error("Malformed token exchange response: {0}")]
    MalformedResponse(String),

    /// The exchange did not complete in time
    #[error("Token exchange timed out after {duration:?}")]
    Timeout {
        /// Timeout that elapsed
        duration: Duration,
    },
}

/// Host identity service errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmbientError {
    /// The client for the host identity service could not be created
    #[error("Host identity client could not be created: {0}")]
    ClientInit(String),

    /// The host identity service did not return credentials
    #[error("Host identity service unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for credential operations
pub type Result<T, E = CredentialError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::invalid("renewal_skew", "must be shorter than session_duration");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: renewal_skew: must be shorter than session_duration"
        );
    }

    #[test]
    fn test_credential_error_from_config() {
        let err: CredentialError = ConfigError::MissingRequired {
            field: "region".into(),
        }
        .into();
        assert!(matches!(err, CredentialError::Configuration { .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_delegation_error_keeps_source_chain() {
        let err = CredentialError::Delegation {
            role_arn: "arn:aws:iam::123:role/X".into(),
            source: ExchangeError::Rejected("AccessDenied".into()),
        };
        assert!(err.is_transient());
        assert!(err.to_string().contains("arn:aws:iam::123:role/X"));

        let source = err.source().expect("delegation error has a source");
        assert!(source.to_string().contains("AccessDenied"));
    }

    #[test]
    fn test_initialization_error_surfaces_original_cause() {
        let err = CredentialError::Initialization {
            source: ConfigError::Lookup {
                key: "TEMPCRED_SECRET_ACCESS_KEY".into(),
                reason: "not unicode".into(),
            },
        };
        assert!(err.to_string().contains("failed to initialize"));
        assert!(
            err.source()
                .expect("source")
                .to_string()
                .contains("TEMPCRED_SECRET_ACCESS_KEY")
        );
    }

    #[test]
    fn test_exchange_timeout_display() {
        let err = ExchangeError::Timeout {
            duration: Duration::from_secs(10),
        };
        assert_eq!(err.to_string(), "Token exchange timed out after 10s");
    }
}
