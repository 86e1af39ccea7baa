//! Error types for logger setup.

/// Errors raised while building a logger.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LogError {
    /// The filter directive string could not be parsed.
    #[error("invalid filter: {0}")]
    Filter(String),

    /// A configuration value was out of range or malformed.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result alias for logger operations.
pub type LogResult<T> = Result<T, LogError>;
