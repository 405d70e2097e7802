//! Common error types for DriveBridge.

use thiserror::Error;

/// Top-level error type for DriveBridge operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Required configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credential material is missing, invalid, or rejected by the provider.
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// The provider refused the operation.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The provider rejected the request for a non-transient reason.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Transient transport or upstream failure.
    #[error("Network error: {0}")]
    Network(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
