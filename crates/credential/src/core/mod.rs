//! Core types for credential resolution

mod error;
mod identity;
mod session;
mod target;

pub use error::{AmbientError, ConfigError, CredentialError, ExchangeError, Result};
pub use identity::Identity;
pub use session::DelegatedSession;
pub use target::ResourceTarget;

// Re-exports from utils
pub use crate::utils::{SecretString, unix_millis};
