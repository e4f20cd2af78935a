//! Error handling for the mining engine
//!
//! An exhausted search is not an error: it is reported as
//! [`MiningResult::Exhausted`](crate::engine::MiningResult). The variants here
//! cover rejected input, bad configuration and cancellation, all of which are
//! reported before any hashing starts (cancellation excepted).

use thiserror::Error;

/// Result type alias for mining operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the mining engine
#[derive(Error, Debug)]
pub enum Error {
    /// Caller supplied input the engine refuses to work on
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Target outside of the representable digest range
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// Worker pool errors
    #[error("Worker error: {0}")]
    Worker(String),

    /// Search stopped by an external cancellation request
    #[error("Operation was cancelled: {0}")]
    Cancelled(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML configuration parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML configuration parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid target error
    pub fn invalid_target(msg: impl Into<String>) -> Self {
        Self::InvalidTarget(msg.into())
    }

    /// Create a worker error
    pub fn worker(msg: impl Into<String>) -> Self {
        Self::Worker(msg.into())
    }

    /// Create a cancellation error
    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::Cancelled(operation.into())
    }

    /// Whether this error belongs to the configuration class: bad settings,
    /// an unparseable configuration file or a target outside of the digest range
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::Config(_)
                | Error::InvalidTarget(_)
                | Error::Json(_)
                | Error::Yaml(_)
                | Error::Toml(_)
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "invalid_input",
            Error::Config(_) => "config",
            Error::InvalidTarget(_) => "target",
            Error::Worker(_) => "worker",
            Error::Cancelled(_) => "cancelled",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
            Error::Yaml(_) => "yaml",
            Error::Toml(_) => "toml",
        }
    }
}
