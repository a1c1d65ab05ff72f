//! Job queue error types.

use atelier_core::JobId;
use thiserror::Error;

use crate::job::JobStatus;

/// Errors that can occur with job queue operations.
#[derive(Debug, Error)]
pub enum JobError {
    /// No job exists under this id.
    #[error("job not found: {id}")]
    NotFound {
        /// The unknown job id.
        id: JobId,
    },

    /// The job spec was malformed (missing type or title).
    #[error("invalid job spec: {message}")]
    InvalidSpec {
        /// What was wrong with the spec.
        message: String,
    },

    /// The requested status change is not a legal transition. This is also
    /// how a lost claim race surfaces: the second claimer sees
    /// `Running → Running`.
    #[error("job {id}: illegal transition {from} -> {to}")]
    InvalidTransition {
        /// The job id.
        id: JobId,
        /// Current status.
        from: JobStatus,
        /// Requested status.
        to: JobStatus,
    },

    /// The backing document store failed.
    #[error("storage error: {0}")]
    Storage(#[from] atelier_storage::StorageError),
}

/// Result type for job queue operations.
pub type JobResult<T> = Result<T, JobError>;
