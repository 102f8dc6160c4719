use thiserror::Error;

/// Logging setup errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogError {
    /// The level directive could not be parsed
    #[error("Invalid log filter: {0}")]
    Filter(String),

    /// Unknown output format name
    #[error("Unknown log format '{0}' (expected compact, pretty or json)")]
    Format(String),

    /// A global subscriber was installed earlier
    #[error("Logger already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Result type for logging setup
pub type LogResult<T> = Result<T, LogError>;
