//! Rapport error types

use thiserror::Error;

/// Rapport error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Memory store error
    #[error("Memory error: {0}")]
    Memory(String),

    /// Quality validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Persistence boundary error (accepted suggestion could not be written)
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type alias for Rapport operations
pub type Result<T> = std::result::Result<T, Error>;
