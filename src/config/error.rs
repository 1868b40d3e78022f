//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Intent timeout must be between 1 and 60000 ms")]
    InvalidIntentTimeout,

    #[error("Lookup timeout must be between 1 and 60000 ms")]
    InvalidLookupTimeout,

    #[error("Store timeout must be between 1 and 60000 ms")]
    InvalidStoreTimeout,

    #[error("Conversation TTL must be at most 31536000 seconds")]
    InvalidTtl,

    #[error("File storage path cannot be empty")]
    InvalidFilePath,

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,
}
