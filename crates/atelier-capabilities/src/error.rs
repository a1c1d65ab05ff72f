//! Capability error taxonomy.
//!
//! Four classes: validation errors (bad request, handler never runs),
//! execution errors (the action itself failed), resource errors (transient
//! infrastructure failure), and internal errors (bookkeeping faults that
//! fail the single invocation). Each variant maps to a stable wire code via
//! [`CapabilityError::code`].

use thiserror::Error;

/// Errors that can occur when registering or invoking capabilities.
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// No capability is registered under the requested name.
    #[error("unknown capability: {name}")]
    UnknownCapability {
        /// The requested capability name.
        name: String,
    },

    /// A capability with this name is already registered.
    #[error("capability already registered: {name}")]
    AlreadyRegistered {
        /// The duplicate name.
        name: String,
    },

    /// The supplied arguments failed schema validation.
    #[error("invalid arguments: {message}")]
    InvalidArguments {
        /// What was wrong with the arguments.
        message: String,
    },

    /// The request was well-formed but rejected by domain rules
    /// (e.g. a path escaping its sandbox root, a duplicate session).
    #[error("{message}")]
    Rejected {
        /// Stable wire code for this rejection (e.g. `"path_escape"`).
        code: &'static str,
        /// Human-readable detail.
        message: String,
    },

    /// The action was attempted and failed.
    #[error("execution failed: {message}")]
    Execution {
        /// Captured failure detail.
        message: String,
    },

    /// The caller-requested deadline elapsed and the operation was aborted.
    #[error("timed out after {millis}ms")]
    Timeout {
        /// The elapsed deadline in milliseconds.
        millis: u64,
    },

    /// A required resource could not be allocated (transient infrastructure
    /// failure, distinct from a bad request).
    #[error("resource unavailable: {message}")]
    Unavailable {
        /// What could not be allocated.
        message: String,
    },

    /// Internal bookkeeping fault. Fails the single invocation, never the
    /// process.
    #[error("internal error: {message}")]
    Internal {
        /// Diagnostic detail.
        message: String,
    },
}

impl CapabilityError {
    /// Stable wire code carried in the failure envelope's `error` field.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownCapability { .. } => "unknown_capability",
            Self::AlreadyRegistered { .. } => "already_registered",
            Self::InvalidArguments { .. } => "invalid_arguments",
            Self::Rejected { code, .. } => code,
            Self::Execution { .. } => "execution_failed",
            Self::Timeout { .. } => "timeout",
            Self::Unavailable { .. } => "unavailable",
            Self::Internal { .. } => "internal",
        }
    }

    /// Whether this error was raised before the handler ran.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UnknownCapability { .. }
                | Self::AlreadyRegistered { .. }
                | Self::InvalidArguments { .. }
                | Self::Rejected { .. }
        )
    }
}

/// Result type for capability operations.
pub type CapabilityResult<T> = Result<T, CapabilityError>;
