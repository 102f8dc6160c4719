//! Tempcred Log - tracing subscriber setup
//!
//! ```no_run
//! let _guard = tempcred_log::init()?;
//! tracing::info!("ready");
//! # Ok::<(), tempcred_log::LogError>(())
//! ```
#![forbid(unsafe_code)]

mod builder;
mod config;
mod error;

pub use builder::{LoggerBuilder, LoggerGuard};
pub use config::{Config, DisplayConfig, Format};
pub use error::{LogError, LogResult};

/// Initialize logging from `TEMPCRED_LOG` / `RUST_LOG` and `TEMPCRED_LOG_FORMAT`
///
/// # Errors
///
/// See [`init_with`].
pub fn init() -> LogResult<LoggerGuard> {
    init_with(Config::from_env())
}

/// Initialize logging with an explicit configuration
///
/// # Errors
///
/// - [`LogError::Filter`] if the level directive does not parse
/// - [`LogError::AlreadyInitialized`] if a global subscriber is already set
pub fn init_with(config: Config) -> LogResult<LoggerGuard> {
    LoggerBuilder::from_config(config).build()
}
