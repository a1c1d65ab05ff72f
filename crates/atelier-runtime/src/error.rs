//! Runtime error types.

use thiserror::Error;

/// Errors that can occur while constructing or extending the runtime.
///
/// Invocation-time failures never surface here; they are folded into the
/// `{success: false, ...}` envelope returned by
/// [`ActionRuntime::invoke`](crate::ActionRuntime::invoke).
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] atelier_config::ConfigError),

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(#[from] atelier_storage::StorageError),

    /// Capability registration error.
    #[error("Capability error: {0}")]
    Capability(#[from] atelier_capabilities::CapabilityError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
