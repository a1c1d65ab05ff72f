//! The action runtime: managers, queue, and registry wired once per process.

use std::sync::Arc;
use std::time::Duration;

use atelier_browser::{BrowserEngine, BrowserLimits, BrowserSessionManager};
use atelier_capabilities::{
    Capability, CapabilityDefinition, InvocationAudit, Registry,
};
use atelier_config::{Config, StorageBackend};
use atelier_jobs::JobQueue;
use atelier_sandbox::SandboxManager;
use atelier_storage::{DocumentStore, MemoryDocumentStore, SurrealKvStore};
use atelier_telemetry::RequestContext;
use serde::Deserialize;
use serde_json::Value;
use tracing::{Instrument, info};

use crate::builtins;
use crate::error::RuntimeResult;

/// One inbound request on the capability invocation surface.
#[derive(Debug, Clone, Deserialize)]
pub struct InvokeRequest {
    /// The capability name.
    pub name: String,
    /// The capability arguments.
    #[serde(default)]
    pub arguments: Value,
}

/// The agent action runtime.
///
/// Owns the sandbox manager, browser session manager, job queue, and
/// capability registry. Built-in capabilities are discovered and bound to
/// their collaborators exactly once, at construction; re-binding per
/// invocation would repeat expensive setup for nothing.
pub struct ActionRuntime {
    registry: Arc<Registry>,
    sandbox: Arc<SandboxManager>,
    browser: Arc<BrowserSessionManager>,
    jobs: Arc<JobQueue>,
}

impl ActionRuntime {
    /// Build the runtime from configuration and a host-supplied browser
    /// engine.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::RuntimeError`] if the document store cannot be
    /// opened or a built-in capability fails to register.
    pub async fn from_config(
        config: &Config,
        engine: Arc<dyn BrowserEngine>,
    ) -> RuntimeResult<Self> {
        let store: Arc<dyn DocumentStore> = match config.storage.backend {
            StorageBackend::Memory => Arc::new(MemoryDocumentStore::new()),
            StorageBackend::Embedded => Arc::new(SurrealKvStore::open(&config.storage.path)?),
        };

        let sandbox = Arc::new(SandboxManager::new(&config.sandbox.root));
        let browser = Arc::new(BrowserSessionManager::new(
            engine,
            BrowserLimits {
                max_age: Duration::from_secs(config.browser.max_age_secs),
                sweep_interval: Duration::from_secs(config.browser.sweep_interval_secs),
            },
        ));
        let jobs = Arc::new(JobQueue::new(
            Arc::clone(&store),
            &config.jobs.collection,
        )?);
        let audit = Arc::new(InvocationAudit::new(
            store,
            &config.jobs.audit_collection,
        )?);

        Self::with_parts(sandbox, browser, jobs, Some(audit)).await
    }

    /// Build the runtime from already-constructed collaborators.
    ///
    /// This is the seam tests use to inject in-memory stores and mock
    /// engines; `from_config` goes through it too.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::RuntimeError`] if a built-in capability fails to
    /// register.
    pub async fn with_parts(
        sandbox: Arc<SandboxManager>,
        browser: Arc<BrowserSessionManager>,
        jobs: Arc<JobQueue>,
        audit: Option<Arc<InvocationAudit>>,
    ) -> RuntimeResult<Self> {
        let registry = match audit {
            Some(audit) => Registry::with_audit(audit),
            None => Registry::new(),
        };

        builtins::register_shell_capability(&registry, &sandbox).await?;
        builtins::register_file_capabilities(&registry, &sandbox).await?;
        builtins::register_browser_capabilities(&registry, &browser).await?;
        builtins::register_job_capabilities(&registry, &jobs).await?;

        info!(
            capabilities = registry.len().await,
            "action runtime initialized"
        );

        Ok(Self {
            registry: Arc::new(registry),
            sandbox,
            browser,
            jobs,
        })
    }

    /// The capability invocation surface.
    ///
    /// Always returns a `{success, ...}` envelope; failures of every class
    /// are data, never panics or `Err`. Every invocation runs inside a
    /// correlation span so its sandbox, browser, and job activity can be
    /// stitched together in the logs.
    pub async fn invoke(&self, request: InvokeRequest) -> Value {
        let ctx = RequestContext::new("action_runtime").with_operation(request.name.clone());
        self.registry
            .invoke(&request.name, request.arguments)
            .instrument(ctx.span())
            .await
            .into_value()
    }

    /// Register a capability created after startup (e.g. one wrapping a
    /// freshly installed package). Goes through the same registry path as
    /// the built-ins: same uniqueness invariant, immediately invokable.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::RuntimeError`] if the name is already taken.
    pub async fn register_dynamic(&self, capability: Arc<dyn Capability>) -> RuntimeResult<()> {
        self.registry.register(capability).await?;
        Ok(())
    }

    /// All registered capability definitions, for the routing layer.
    pub async fn capabilities(&self) -> Vec<CapabilityDefinition> {
        self.registry.definitions().await
    }

    /// Start the browser session reaper.
    #[must_use]
    pub fn spawn_browser_reaper(&self) -> tokio::task::JoinHandle<()> {
        self.browser.spawn_reaper()
    }

    /// The sandbox execution manager.
    #[must_use]
    pub fn sandbox(&self) -> &Arc<SandboxManager> {
        &self.sandbox
    }

    /// The browser session manager.
    #[must_use]
    pub fn browser(&self) -> &Arc<BrowserSessionManager> {
        &self.browser
    }

    /// The job queue.
    #[must_use]
    pub fn jobs(&self) -> &Arc<JobQueue> {
        &self.jobs
    }

    /// The capability registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

impl std::fmt::Debug for ActionRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRuntime").finish_non_exhaustive()
    }
}
