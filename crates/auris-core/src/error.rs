use thiserror::Error;

/// Top-level error type for the Auris system.
///
/// Each variant wraps a subsystem-specific failure. Subsystem crates define
/// their own error types and convert into `AurisError` so that the `?`
/// operator works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AurisError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Aggregation error: {0}")]
    Aggregation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for AurisError {
    fn from(err: toml::de::Error) -> Self {
        AurisError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for AurisError {
    fn from(err: toml::ser::Error) -> Self {
        AurisError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for AurisError {
    fn from(err: serde_json::Error) -> Self {
        AurisError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Auris operations.
pub type Result<T> = std::result::Result<T, AurisError>;
