//! Tempcred Credential - temporary credential resolution and caching
//!
//! Given a long-lived identity and a target resource, a [`CredentialProvider`]
//! decides between three credential paths:
//!
//! - **Delegated role** - exchange the identity for a short-lived session via
//!   AWS STS `AssumeRole`, cached until shortly before expiry
//! - **Explicit session** - hand out the configured identity unchanged
//! - **Ambient** - use the host's own identity (EC2 instance metadata)
//!
//! Concurrent callers share a single renewal, and a failed renewal falls back
//! to the previous session while it has not yet expired.
#![forbid(unsafe_code)]

/// Ambient host identity
pub mod ambient;
/// Delegated session cache
pub mod cache;
/// Injectable time source
pub mod clock;
/// Provider configuration
pub mod config;
/// Core types and errors
pub mod core;
/// Token exchange
pub mod delegation;
/// Resolution policy
pub mod policy;
/// Credential provider facade
pub mod provider;
/// Mocks and fixtures for tests
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
/// Utilities for secrets and time
pub mod utils;

// ── Root re-exports ─────────────────────────────────────────────────────────

pub use crate::ambient::{AmbientCredentialSource, HostIdentityClient, ImdsHostIdentity};
pub use crate::cache::{CacheState, CacheStats, CredentialCache, RenewalSettings};
pub use crate::clock::{Clock, SystemClock};
pub use crate::config::ProviderConfig;
pub use crate::core::{
    AmbientError, ConfigError, CredentialError, DelegatedSession, ExchangeError, Identity,
    ResourceTarget, Result, SecretString,
};
pub use crate::delegation::{DelegationClient, StsDelegationClient};
pub use crate::policy::Resolution;
pub use crate::provider::{CredentialProvider, CredentialProviderBuilder};

/// Commonly used types and traits
pub mod prelude {
    pub use crate::ambient::{AmbientCredentialSource, HostIdentityClient};
    pub use crate::clock::Clock;
    pub use crate::config::ProviderConfig;
    pub use crate::core::{CredentialError, Identity, ResourceTarget, SecretString};
    pub use crate::delegation::DelegationClient;
    pub use crate::policy::Resolution;
    pub use crate::provider::{CredentialProvider, CredentialProviderBuilder};
}
