use thiserror::Error;

/// Top-level error type for the OptimalAI workspace.
///
/// Subsystem crates define their own error types and implement
/// `From<OptimalError>` so that `?` works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OptimalError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("User state not found: {0}")]
    UserNotFound(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

impl From<toml::de::Error> for OptimalError {
    fn from(err: toml::de::Error) -> Self {
        OptimalError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for OptimalError {
    fn from(err: toml::ser::Error) -> Self {
        OptimalError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for OptimalError {
    fn from(err: serde_json::Error) -> Self {
        OptimalError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for OptimalAI operations.
pub type Result<T> = std::result::Result<T, OptimalError>;
