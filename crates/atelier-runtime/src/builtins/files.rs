//! The `write_file`, `read_file`, and `list_files` capabilities.

use std::sync::Arc;

use async_trait::async_trait;
use atelier_capabilities::{
    Capability, CapabilityError, CapabilityResult, ParameterSchema, PropertySchema, Registry,
};
use atelier_sandbox::SandboxManager;
use serde_json::{Value, json};

use super::{optional_str, required_str, sandbox_error, session_arg};
use crate::error::RuntimeResult;

struct WriteFile {
    sandbox: Arc<SandboxManager>,
}

#[async_trait]
impl Capability for WriteFile {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Writes a text file inside a sandbox session, creating parent \
         directories as needed. Paths are confined to the session root."
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new()
            .property(
                "session_id",
                PropertySchema::string("Sandbox session to write in"),
            )
            .property(
                "path",
                PropertySchema::string("Target path, relative to the session root"),
            )
            .property("content", PropertySchema::string("File content"))
            .required("session_id")
            .required("path")
            .required("content")
    }

    async fn invoke(&self, args: Value) -> CapabilityResult<Value> {
        let session_id = session_arg(&args)?;
        let path = required_str(&args, "path")?;
        let content = required_str(&args, "content")?;

        self.sandbox
            .write_file(&session_id, path, content)
            .await
            .map_err(sandbox_error)?;

        Ok(json!({
            "session_id": session_id.as_str(),
            "path": path,
            "bytes_written": content.len(),
        }))
    }
}

struct ReadFile {
    sandbox: Arc<SandboxManager>,
}

#[async_trait]
impl Capability for ReadFile {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Reads a text file from a sandbox session. Paths are confined to the \
         session root."
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new()
            .property(
                "session_id",
                PropertySchema::string("Sandbox session to read from"),
            )
            .property(
                "path",
                PropertySchema::string("File path, relative to the session root"),
            )
            .required("session_id")
            .required("path")
    }

    async fn invoke(&self, args: Value) -> CapabilityResult<Value> {
        let session_id = session_arg(&args)?;
        let path = required_str(&args, "path")?;

        let content = self
            .sandbox
            .read_file(&session_id, path)
            .await
            .map_err(sandbox_error)?;

        Ok(json!({
            "session_id": session_id.as_str(),
            "path": path,
            "content": content,
        }))
    }
}

struct ListFiles {
    sandbox: Arc<SandboxManager>,
}

#[async_trait]
impl Capability for ListFiles {
    fn name(&self) -> &str {
        "list_files"
    }

    fn description(&self) -> &str {
        "Lists the direct children of a directory inside a sandbox session. \
         Defaults to the session root."
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new()
            .property(
                "session_id",
                PropertySchema::string("Sandbox session to list"),
            )
            .property(
                "directory",
                PropertySchema::string("Directory, relative to the session root"),
            )
            .required("session_id")
    }

    async fn invoke(&self, args: Value) -> CapabilityResult<Value> {
        let session_id = session_arg(&args)?;
        let directory = optional_str(&args, "directory").unwrap_or("");

        let entries = self
            .sandbox
            .list_files(&session_id, directory)
            .await
            .map_err(sandbox_error)?;
        let entries = serde_json::to_value(entries).map_err(|e| CapabilityError::Internal {
            message: e.to_string(),
        })?;

        Ok(json!({
            "session_id": session_id.as_str(),
            "directory": directory,
            "entries": entries,
        }))
    }
}

/// Register the file capabilities bound to `sandbox`.
pub(crate) async fn register_file_capabilities(
    registry: &Registry,
    sandbox: &Arc<SandboxManager>,
) -> RuntimeResult<()> {
    registry
        .register(Arc::new(WriteFile {
            sandbox: Arc::clone(sandbox),
        }))
        .await?;
    registry
        .register(Arc::new(ReadFile {
            sandbox: Arc::clone(sandbox),
        }))
        .await?;
    registry
        .register(Arc::new(ListFiles {
            sandbox: Arc::clone(sandbox),
        }))
        .await?;
    Ok(())
}
