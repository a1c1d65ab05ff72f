//! Browser session error types.

use thiserror::Error;

/// Errors that can occur with browser sessions.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// A session with this id is already active.
    #[error("browser session already active: {session}")]
    SessionExists {
        /// The duplicate session id.
        session: String,
    },

    /// No active session under this id (never started, closed, or expired).
    #[error("no active browser session: {session}")]
    SessionNotFound {
        /// The unknown session id.
        session: String,
    },

    /// The engine could not allocate a browser instance. Transient
    /// infrastructure failure, distinct from a bad request.
    #[error("browser engine unavailable: {message}")]
    Unavailable {
        /// What failed to allocate.
        message: String,
    },

    /// A page operation failed (navigation error, crashed tab, ...).
    #[error("browser operation failed: {message}")]
    Page {
        /// Captured failure detail.
        message: String,
    },
}

/// Result type for browser operations.
pub type BrowserResult<T> = Result<T, BrowserError>;
