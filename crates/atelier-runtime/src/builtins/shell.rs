//! The `execute_shell` capability.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use atelier_capabilities::{
    Capability, CapabilityResult, ParameterSchema, PropertySchema, Registry,
};
use atelier_sandbox::{SandboxManager, ShellOptions};
use serde_json::{Value, json};

use super::{optional_str, optional_u64, required_str, sandbox_error, session_arg};
use crate::error::RuntimeResult;

/// Runs a shell command inside a sandbox session.
struct ExecuteShell {
    sandbox: Arc<SandboxManager>,
}

#[async_trait]
impl Capability for ExecuteShell {
    fn name(&self) -> &str {
        "execute_shell"
    }

    fn description(&self) -> &str {
        "Executes a shell command inside an isolated session. The session's \
         private directory is the default working directory. There is no \
         implicit timeout; pass timeout_ms to bound execution."
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new()
            .property("command", PropertySchema::string("The command to execute"))
            .property(
                "session_id",
                PropertySchema::string("Sandbox session to run in"),
            )
            .property(
                "cwd",
                PropertySchema::string("Working directory, relative to the session root"),
            )
            .property(
                "timeout_ms",
                PropertySchema::integer("Explicit deadline in milliseconds"),
            )
            .required("command")
            .required("session_id")
    }

    async fn invoke(&self, args: Value) -> CapabilityResult<Value> {
        let command = required_str(&args, "command")?;
        let session_id = session_arg(&args)?;

        let mut options = ShellOptions::new(session_id.clone());
        if let Some(cwd) = optional_str(&args, "cwd") {
            options = options.with_cwd(cwd);
        }
        if let Some(timeout_ms) = optional_u64(&args, "timeout_ms") {
            options = options.with_timeout(Duration::from_millis(timeout_ms));
        }

        let outcome = self
            .sandbox
            .execute_shell(command, options)
            .await
            .map_err(sandbox_error)?;

        // A non-zero exit is the caller's to judge: the command ran, and the
        // captured output is the result.
        Ok(json!({
            "command": command,
            "session_id": session_id.as_str(),
            "exit_code": outcome.exit_code,
            "stdout": outcome.stdout,
            "stderr": outcome.stderr,
        }))
    }
}

/// Register the shell capability bound to `sandbox`.
pub(crate) async fn register_shell_capability(
    registry: &Registry,
    sandbox: &Arc<SandboxManager>,
) -> RuntimeResult<()> {
    registry
        .register(Arc::new(ExecuteShell {
            sandbox: Arc::clone(sandbox),
        }))
        .await?;
    Ok(())
}
