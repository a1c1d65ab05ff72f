//! Atelier Runtime - Capability discovery, binding, and the invoke surface.
//!
//! The [`ActionRuntime`] is constructed once per process: it builds the
//! sandbox manager, browser session manager, and job queue, then registers
//! the built-in capability set already bound to those collaborators.
//! Dynamic capabilities registered later go through the same registry path
//! and are immediately invokable.
//!
//! The routing layer calls [`ActionRuntime::invoke`] with
//! `{name, arguments}` and always gets a `{success, ...}` JSON envelope
//! back, validation failures, execution failures, and resource failures
//! included.
//!
//! # Example
//!
//! ```rust,no_run
//! use atelier_browser::mock::MockEngine;
//! use atelier_config::Config;
//! use atelier_runtime::{ActionRuntime, InvokeRequest};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), atelier_runtime::RuntimeError> {
//! let config = Config::load(None)?;
//! let runtime = ActionRuntime::from_config(&config, Arc::new(MockEngine::new())).await?;
//! let _reaper = runtime.spawn_browser_reaper();
//!
//! let result = runtime
//!     .invoke(InvokeRequest {
//!         name: "execute_shell".into(),
//!         arguments: json!({"command": "echo hello", "session_id": "s1"}),
//!     })
//!     .await;
//! assert_eq!(result["success"], json!(true));
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod builtins;
pub mod config_bridge;
mod error;
mod runtime;

pub use error::{RuntimeError, RuntimeResult};
pub use runtime::{ActionRuntime, InvokeRequest};

// Re-export the component crates for convenience
pub use atelier_browser::{self, BrowserEngine, BrowserLimits, BrowserSessionManager};
pub use atelier_capabilities::{self, Capability, CapabilityDefinition, Registry};
pub use atelier_jobs::{self, JobQueue, JobSpec, JobStatus};
pub use atelier_sandbox::{self, SandboxManager};
