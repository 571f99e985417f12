//! Error types for datakeep-core

use thiserror::Error;

/// Result type alias for facade and configuration operations
pub type Result<T> = std::result::Result<T, DataError>;

/// Result type alias for backend adapter and capability operations
pub type AdapterResult<T> = std::result::Result<T, AdapterError>;

/// Failures of the value codec
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Value cannot be encoded: {0}")]
    Unencodable(String),

    #[error("Stored bytes do not match the expected shape: {0}")]
    Malformed(String),
}

/// Failures reported by a storage backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error("Secure store is not configured - provide a service identifier first")]
    NotConfigured,

    #[error("I/O failure: {0}")]
    IoFailure(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

impl From<std::io::Error> for AdapterError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => AdapterError::AccessDenied(err.to_string()),
            _ => AdapterError::IoFailure(err.to_string()),
        }
    }
}

/// Crate-level error type
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Storage error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Encryption failed: {0}")]
    EncryptionError(String),

    #[error("Decryption failed: {0}")]
    DecryptionError(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
