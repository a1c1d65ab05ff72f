//! The `queue_project` capability.

use std::sync::Arc;

use async_trait::async_trait;
use atelier_capabilities::{
    Capability, CapabilityResult, ParameterSchema, PropertySchema, Registry,
};
use atelier_jobs::{JobQueue, JobSpec};
use serde_json::{Value, json};

use super::{job_error, optional_i64, optional_str, required_str};
use crate::error::RuntimeResult;

/// Project kinds the generator worker knows how to build.
const PROJECT_KINDS: [&str; 5] = ["website", "app", "api", "automation", "report"];

/// Queues a long-running project-generation job.
///
/// The work itself is performed by the external worker process; this
/// capability only writes a well-formed `QUEUED` record and returns its id
/// immediately.
struct QueueProject {
    jobs: Arc<JobQueue>,
}

#[async_trait]
impl Capability for QueueProject {
    fn name(&self) -> &str {
        "queue_project"
    }

    fn description(&self) -> &str {
        "Queues a project-generation job for the background worker and \
         returns its id immediately. Use the id to poll for completion."
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new()
            .property(
                "type",
                PropertySchema::string("Kind of project to generate").one_of(PROJECT_KINDS),
            )
            .property("title", PropertySchema::string("Short project title"))
            .property(
                "description",
                PropertySchema::string("What the project should contain"),
            )
            .property(
                "priority",
                PropertySchema::integer("Scheduling priority; higher runs first"),
            )
            .required("type")
            .required("title")
    }

    async fn invoke(&self, args: Value) -> CapabilityResult<Value> {
        let kind = required_str(&args, "type")?;
        let title = required_str(&args, "title")?;

        let mut spec = JobSpec::new(kind, title);
        if let Some(description) = optional_str(&args, "description") {
            spec = spec.with_description(description);
        }
        if let Some(priority) = optional_i64(&args, "priority") {
            spec = spec.with_priority(priority);
        }

        let id = self.jobs.enqueue(spec).await.map_err(job_error)?;

        Ok(json!({
            "job_id": id.to_string(),
            "status": "QUEUED",
        }))
    }
}

/// Register the job capabilities bound to `jobs`.
pub(crate) async fn register_job_capabilities(
    registry: &Registry,
    jobs: &Arc<JobQueue>,
) -> RuntimeResult<()> {
    registry
        .register(Arc::new(QueueProject {
            jobs: Arc::clone(jobs),
        }))
        .await?;
    Ok(())
}
