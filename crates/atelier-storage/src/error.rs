//! Storage error types.

use thiserror::Error;

/// Errors that can occur with storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A collection name or document id failed validation.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// A document could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The backing store could not be opened.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The backing store failed mid-operation.
    #[error("Internal storage error: {0}")]
    Internal(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
