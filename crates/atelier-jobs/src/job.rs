//! The job record and its status state machine.

use atelier_core::JobId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Waiting to be claimed by a worker.
    Queued,
    /// Claimed and executing.
    Running,
    /// Finished successfully. Terminal.
    Done,
    /// Finished unsuccessfully. Terminal (no automatic retry).
    Failed,
}

impl JobStatus {
    /// Whether this status admits no further automatic transitions.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// The legal transitions: `Queued → Running → Done | Failed`, plus the
    /// explicit retry path `Failed → Queued`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Running)
                | (Self::Running, Self::Done | Self::Failed)
                | (Self::Failed, Self::Queued)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// A durable, asynchronously-processed unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique job id.
    pub id: JobId,
    /// What kind of work this is (e.g. `"website"`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Short human-readable title.
    pub title: String,
    /// Longer description of the work.
    #[serde(default)]
    pub description: String,
    /// Current lifecycle state.
    pub status: JobStatus,
    /// Scheduling priority; higher runs first.
    #[serde(default)]
    pub priority: i64,
    /// Number of execution attempts so far (incremented at claim time).
    #[serde(default)]
    pub attempts: u32,
    /// Failure reason from the most recent attempt, if any.
    #[serde(default)]
    pub error: Option<String>,
    /// When the job was enqueued.
    pub created_at: DateTime<Utc>,
    /// When the job was last mutated.
    pub updated_at: DateTime<Utc>,
}

/// What a producer supplies to enqueue a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSpec {
    /// What kind of work this is. Required, non-empty.
    #[serde(rename = "type")]
    pub kind: String,
    /// Short title. Required, non-empty.
    pub title: String,
    /// Longer description.
    #[serde(default)]
    pub description: String,
    /// Scheduling priority; higher runs first.
    #[serde(default)]
    pub priority: i64,
}

impl JobSpec {
    /// A spec with empty description and default priority.
    #[must_use]
    pub fn new(kind: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            title: title.into(),
            description: String::new(),
            priority: 0,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }
}
