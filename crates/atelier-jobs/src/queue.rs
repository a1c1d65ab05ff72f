//! The job queue over the document-store boundary.

use std::cmp::Reverse;
use std::sync::Arc;

use atelier_core::JobId;
use atelier_storage::{Collection, DocumentStore, StorageResult};
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{JobError, JobResult};
use crate::job::{Job, JobSpec, JobStatus};

/// Durable queue of [`Job`] records.
///
/// Producers call [`enqueue`](Self::enqueue); the external worker calls
/// [`claim_next`](Self::claim_next) / [`claim`](Self::claim), then exactly
/// one of [`complete`](Self::complete) or [`fail`](Self::fail). Every
/// conditional status change runs under one internal lock, making the
/// check-and-update a single atomic step: two concurrent claims of the same
/// job yield one `Running` transition and one
/// [`JobError::InvalidTransition`].
pub struct JobQueue {
    jobs: Collection<Job>,
    transition_lock: Mutex<()>,
}

impl JobQueue {
    /// Create a queue over `collection` on the given store.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the collection name is invalid.
    pub fn new(store: Arc<dyn DocumentStore>, collection: &str) -> StorageResult<Self> {
        Ok(Self {
            jobs: Collection::new(store, collection)?,
            transition_lock: Mutex::new(()),
        })
    }

    /// Validate a spec and insert a `QUEUED` record, returning its id.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::InvalidSpec`] if `type` or `title` is empty, or a
    /// storage error if the insert fails.
    pub async fn enqueue(&self, spec: JobSpec) -> JobResult<JobId> {
        if spec.kind.trim().is_empty() {
            return Err(JobError::InvalidSpec {
                message: "job type must not be empty".into(),
            });
        }
        if spec.title.trim().is_empty() {
            return Err(JobError::InvalidSpec {
                message: "job title must not be empty".into(),
            });
        }

        let now = Utc::now();
        let job = Job {
            id: JobId::new(),
            kind: spec.kind,
            title: spec.title,
            description: spec.description,
            status: JobStatus::Queued,
            priority: spec.priority,
            attempts: 0,
            error: None,
            created_at: now,
            updated_at: now,
        };
        self.jobs.put(&job.id.to_string(), &job).await?;
        info!(job = %job.id, kind = %job.kind, "enqueued job");
        Ok(job.id)
    }

    /// Fetch a job in any state.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the read fails.
    pub async fn get(&self, id: JobId) -> JobResult<Option<Job>> {
        Ok(self.jobs.get(&id.to_string()).await?)
    }

    /// Every job, newest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error if a read fails.
    pub async fn list(&self) -> JobResult<Vec<Job>> {
        let mut jobs = self.jobs.all().await?;
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }

    /// Every job in the given state, newest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error if a read fails.
    pub async fn list_by_status(&self, status: JobStatus) -> JobResult<Vec<Job>> {
        let mut jobs = self.list().await?;
        jobs.retain(|j| j.status == status);
        Ok(jobs)
    }

    /// Atomically claim a specific job: `QUEUED → RUNNING`, incrementing
    /// `attempts`.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::NotFound`] for an unknown id and
    /// [`JobError::InvalidTransition`] if the job is not `QUEUED` (the
    /// losing side of a claim race sees `RUNNING → RUNNING`).
    pub async fn claim(&self, id: JobId) -> JobResult<Job> {
        let _guard = self.transition_lock.lock().await;
        let mut job = self
            .jobs
            .get(&id.to_string())
            .await?
            .ok_or(JobError::NotFound { id })?;
        self.apply_claim(&mut job).await?;
        Ok(job)
    }

    /// Atomically claim the best queued job: highest `priority`, then oldest
    /// `created_at`. Returns `None` when nothing is queued.
    ///
    /// # Errors
    ///
    /// Returns a storage error if a read or the write fails.
    pub async fn claim_next(&self) -> JobResult<Option<Job>> {
        let _guard = self.transition_lock.lock().await;
        let mut queued: Vec<Job> = self.jobs.all().await?;
        queued.retain(|j| j.status == JobStatus::Queued);
        queued.sort_by_key(|j| (Reverse(j.priority), j.created_at));

        let Some(mut job) = queued.into_iter().next() else {
            return Ok(None);
        };
        self.apply_claim(&mut job).await?;
        Ok(Some(job))
    }

    /// Mark a running job `DONE`.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::NotFound`] for an unknown id and
    /// [`JobError::InvalidTransition`] if the job is not `RUNNING`.
    pub async fn complete(&self, id: JobId) -> JobResult<Job> {
        let _guard = self.transition_lock.lock().await;
        self.transition(id, JobStatus::Done, None).await
    }

    /// Mark a running job `FAILED`, recording the reason.
    ///
    /// The failed record stays queryable; it is never requeued
    /// automatically.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::NotFound`] for an unknown id and
    /// [`JobError::InvalidTransition`] if the job is not `RUNNING`.
    pub async fn fail(&self, id: JobId, reason: impl Into<String>) -> JobResult<Job> {
        let _guard = self.transition_lock.lock().await;
        self.transition(id, JobStatus::Failed, Some(reason.into()))
            .await
    }

    /// Explicit retry: move a failed job back to `QUEUED`.
    ///
    /// `attempts` is preserved; the next claim increments it again.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::NotFound`] for an unknown id and
    /// [`JobError::InvalidTransition`] if the job is not `FAILED`.
    pub async fn requeue(&self, id: JobId) -> JobResult<Job> {
        let _guard = self.transition_lock.lock().await;
        self.transition(id, JobStatus::Queued, None).await
    }

    /// Claim `job`: must hold the transition lock.
    async fn apply_claim(&self, job: &mut Job) -> JobResult<()> {
        if !job.status.can_transition_to(JobStatus::Running) {
            return Err(JobError::InvalidTransition {
                id: job.id,
                from: job.status,
                to: JobStatus::Running,
            });
        }
        job.status = JobStatus::Running;
        job.attempts = job.attempts.saturating_add(1);
        job.updated_at = Utc::now();
        self.jobs.put(&job.id.to_string(), job).await?;
        debug!(job = %job.id, attempts = job.attempts, "claimed job");
        Ok(())
    }

    /// Apply a checked status change: must hold the transition lock.
    async fn transition(&self, id: JobId, to: JobStatus, error: Option<String>) -> JobResult<Job> {
        let mut job = self
            .jobs
            .get(&id.to_string())
            .await?
            .ok_or(JobError::NotFound { id })?;
        if !job.status.can_transition_to(to) {
            return Err(JobError::InvalidTransition {
                id,
                from: job.status,
                to,
            });
        }
        job.status = to;
        job.error = error;
        job.updated_at = Utc::now();
        self.jobs.put(&job.id.to_string(), &job).await?;
        info!(job = %id, status = %to, "job transition");
        Ok(job)
    }
}

impl std::fmt::Debug for JobQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobQueue").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_storage::MemoryDocumentStore;

    fn queue() -> Arc<JobQueue> {
        let store = Arc::new(MemoryDocumentStore::new());
        Arc::new(JobQueue::new(store, "jobs").unwrap())
    }

    #[tokio::test]
    async fn enqueue_creates_queued_job() {
        let queue = queue();
        let id = queue
            .enqueue(JobSpec::new("website", "Demo"))
            .await
            .unwrap();

        let job = queue.get(id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.kind, "website");
        assert_eq!(job.title, "Demo");
        assert_eq!(job.attempts, 0);
    }

    #[tokio::test]
    async fn enqueue_assigns_unique_ids() {
        let queue = queue();
        let a = queue.enqueue(JobSpec::new("website", "A")).await.unwrap();
        let b = queue.enqueue(JobSpec::new("website", "B")).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn enqueue_rejects_empty_fields() {
        let queue = queue();
        assert!(matches!(
            queue.enqueue(JobSpec::new("", "Demo")).await,
            Err(JobError::InvalidSpec { .. })
        ));
        assert!(matches!(
            queue.enqueue(JobSpec::new("website", "  ")).await,
            Err(JobError::InvalidSpec { .. })
        ));
    }

    #[tokio::test]
    async fn lifecycle_queued_running_failed() {
        let queue = queue();
        let id = queue
            .enqueue(JobSpec::new("website", "Demo"))
            .await
            .unwrap();

        let claimed = queue.claim(id).await.unwrap();
        assert_eq!(claimed.status, JobStatus::Running);
        assert_eq!(claimed.attempts, 1);

        let failed = queue.fail(id, "generator crashed").await.unwrap();
        assert_eq!(failed.status, JobStatus::Failed);
        assert!(failed.attempts >= 1);
        assert_eq!(failed.error.as_deref(), Some("generator crashed"));

        // Still queryable after failure.
        let fetched = queue.get(id).await.unwrap().unwrap();
        assert_eq!(fetched.status, JobStatus::Failed);
    }

    #[tokio::test]
    async fn complete_marks_done() {
        let queue = queue();
        let id = queue
            .enqueue(JobSpec::new("website", "Demo"))
            .await
            .unwrap();
        queue.claim(id).await.unwrap();
        let done = queue.complete(id).await.unwrap();
        assert_eq!(done.status, JobStatus::Done);
    }

    #[tokio::test]
    async fn terminal_states_are_set_exactly_once() {
        let queue = queue();
        let id = queue
            .enqueue(JobSpec::new("website", "Demo"))
            .await
            .unwrap();
        queue.claim(id).await.unwrap();
        queue.complete(id).await.unwrap();

        assert!(matches!(
            queue.complete(id).await,
            Err(JobError::InvalidTransition { .. })
        ));
        assert!(matches!(
            queue.fail(id, "late").await,
            Err(JobError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn cannot_complete_unclaimed_job() {
        let queue = queue();
        let id = queue
            .enqueue(JobSpec::new("website", "Demo"))
            .await
            .unwrap();
        assert!(matches!(
            queue.complete(id).await,
            Err(JobError::InvalidTransition {
                from: JobStatus::Queued,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn concurrent_claims_yield_one_winner() {
        let queue = queue();
        let id = queue
            .enqueue(JobSpec::new("website", "Demo"))
            .await
            .unwrap();

        let first = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.claim(id).await })
        };
        let second = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.claim(id).await })
        };

        let results = [first.await.unwrap(), second.await.unwrap()];
        let wins = results.iter().filter(|r| r.is_ok()).count();
        let rejections = results
            .iter()
            .filter(|r| matches!(r, Err(JobError::InvalidTransition { .. })))
            .count();
        assert_eq!(wins, 1);
        assert_eq!(rejections, 1);

        let job = queue.get(id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(job.attempts, 1);
    }

    #[tokio::test]
    async fn claim_next_orders_by_priority_then_age() {
        let queue = queue();
        let low = queue
            .enqueue(JobSpec::new("website", "low").with_priority(1))
            .await
            .unwrap();
        let high = queue
            .enqueue(JobSpec::new("website", "high").with_priority(5))
            .await
            .unwrap();
        let high_later = queue
            .enqueue(JobSpec::new("website", "high-later").with_priority(5))
            .await
            .unwrap();

        assert_eq!(queue.claim_next().await.unwrap().unwrap().id, high);
        assert_eq!(queue.claim_next().await.unwrap().unwrap().id, high_later);
        assert_eq!(queue.claim_next().await.unwrap().unwrap().id, low);
        assert!(queue.claim_next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn requeue_is_the_only_retry_path() {
        let queue = queue();
        let id = queue
            .enqueue(JobSpec::new("website", "Demo"))
            .await
            .unwrap();
        queue.claim(id).await.unwrap();
        queue.fail(id, "flaky network").await.unwrap();

        // Failed jobs are not requeued automatically.
        assert!(queue.claim_next().await.unwrap().is_none());

        let requeued = queue.requeue(id).await.unwrap();
        assert_eq!(requeued.status, JobStatus::Queued);
        assert_eq!(requeued.attempts, 1);

        let reclaimed = queue.claim_next().await.unwrap().unwrap();
        assert_eq!(reclaimed.id, id);
        assert_eq!(reclaimed.attempts, 2);
    }

    #[tokio::test]
    async fn list_by_status_filters() {
        let queue = queue();
        let a = queue.enqueue(JobSpec::new("website", "A")).await.unwrap();
        let _b = queue.enqueue(JobSpec::new("website", "B")).await.unwrap();
        queue.claim(a).await.unwrap();

        let queued = queue.list_by_status(JobStatus::Queued).await.unwrap();
        assert_eq!(queued.len(), 1);
        let running = queue.list_by_status(JobStatus::Running).await.unwrap();
        assert_eq!(running.len(), 1);
        assert_eq!(running[0].id, a);
    }

    #[tokio::test]
    async fn unknown_job_is_not_found() {
        let queue = queue();
        assert!(matches!(
            queue.claim(JobId::new()).await,
            Err(JobError::NotFound { .. })
        ));
    }
}
