//! Integration test harness for the Atelier action core.
//!
//! The tests live in `tests/`; this library only provides shared setup.

#![deny(unsafe_code)]
#![deny(clippy::all)]

use std::path::Path;
use std::sync::Arc;

use atelier_browser::mock::MockEngine;
use atelier_browser::{BrowserEngine, BrowserLimits, BrowserSessionManager};
use atelier_capabilities::InvocationAudit;
use atelier_jobs::JobQueue;
use atelier_runtime::ActionRuntime;
use atelier_sandbox::SandboxManager;
use atelier_storage::{DocumentStore, MemoryDocumentStore};

/// Build a fully wired runtime over in-memory storage, a mock browser
/// engine, and a sandbox rooted at `sandbox_root`.
pub async fn test_runtime(sandbox_root: &Path) -> (ActionRuntime, Arc<MockEngine>) {
    test_runtime_with_limits(sandbox_root, BrowserLimits::default()).await
}

/// Like [`test_runtime`], with a custom browser lifetime policy.
pub async fn test_runtime_with_limits(
    sandbox_root: &Path,
    limits: BrowserLimits,
) -> (ActionRuntime, Arc<MockEngine>) {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
    let engine = Arc::new(MockEngine::new());

    let sandbox = Arc::new(SandboxManager::new(sandbox_root));
    let browser = Arc::new(BrowserSessionManager::new(
        Arc::clone(&engine) as Arc<dyn BrowserEngine>,
        limits,
    ));
    let jobs = Arc::new(JobQueue::new(Arc::clone(&store), "jobs").expect("valid collection"));
    let audit = Arc::new(InvocationAudit::new(store, "invocations").expect("valid collection"));

    let runtime = ActionRuntime::with_parts(sandbox, browser, jobs, Some(audit))
        .await
        .expect("runtime construction");
    (runtime, engine)
}
