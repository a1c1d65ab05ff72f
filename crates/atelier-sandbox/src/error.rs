//! Sandbox error types.

use thiserror::Error;

/// Errors that can occur with sandbox operations.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// A path argument would resolve outside its session root.
    #[error("path {path:?} escapes the root of session {session}")]
    PathEscape {
        /// The offending session.
        session: String,
        /// The rejected path as supplied by the caller.
        path: String,
    },

    /// The target path does not exist.
    #[error("path not found: {path:?} in session {session}")]
    PathNotFound {
        /// The session.
        session: String,
        /// The missing path.
        path: String,
    },

    /// The shell process could not be spawned.
    #[error("failed to spawn shell: {message}")]
    Spawn {
        /// The spawn failure detail.
        message: String,
    },

    /// The caller-supplied deadline elapsed; the command was killed.
    #[error("command timed out after {millis}ms")]
    Timeout {
        /// The deadline in milliseconds.
        millis: u64,
    },

    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for sandbox operations.
pub type SandboxResult<T> = Result<T, SandboxError>;
