//! Error types for juke
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for the juke orchestrator
#[derive(Error, Debug)]
pub enum Error {
    /// Coordination store access errors (lock poisoning, backend faults)
    #[error("Store error: {0}")]
    Store(String),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Audio engine unreachable or rejecting a command
    #[error("Engine error: {0}")]
    Engine(String),

    /// Malformed JSON in a stored record or request body
    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using the juke Error
pub type Result<T> = std::result::Result<T, Error>;
