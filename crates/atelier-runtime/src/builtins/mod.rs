//! Built-in capabilities, each bound to its collaborator at registration.

mod browser;
mod files;
mod jobs;
mod shell;

pub(crate) use browser::register_browser_capabilities;
pub(crate) use files::register_file_capabilities;
pub(crate) use jobs::register_job_capabilities;
pub(crate) use shell::register_shell_capability;

use atelier_capabilities::{CapabilityError, CapabilityResult};
use atelier_core::SessionId;
use serde_json::Value;

/// Extract a required string argument.
pub(crate) fn required_str<'a>(args: &'a Value, key: &str) -> CapabilityResult<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| CapabilityError::InvalidArguments {
            message: format!("{key} is required"),
        })
}

/// Extract an optional string argument.
pub(crate) fn optional_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

/// Extract an optional unsigned integer argument.
pub(crate) fn optional_u64(args: &Value, key: &str) -> Option<u64> {
    args.get(key).and_then(Value::as_u64)
}

/// Extract an optional signed integer argument.
pub(crate) fn optional_i64(args: &Value, key: &str) -> Option<i64> {
    args.get(key).and_then(Value::as_i64)
}

/// Extract a required number argument as `f64`.
pub(crate) fn required_f64(args: &Value, key: &str) -> CapabilityResult<f64> {
    args.get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| CapabilityError::InvalidArguments {
            message: format!("{key} is required"),
        })
}

/// Extract and validate the `session_id` argument.
pub(crate) fn session_arg(args: &Value) -> CapabilityResult<SessionId> {
    let raw = required_str(args, "session_id")?;
    SessionId::new(raw).map_err(|e| CapabilityError::InvalidArguments {
        message: e.to_string(),
    })
}

/// Fold a sandbox failure into the capability error taxonomy.
pub(crate) fn sandbox_error(error: atelier_sandbox::SandboxError) -> CapabilityError {
    use atelier_sandbox::SandboxError;
    match error {
        SandboxError::PathEscape { .. } => CapabilityError::Rejected {
            code: "path_escape",
            message: error.to_string(),
        },
        SandboxError::PathNotFound { .. } => CapabilityError::Rejected {
            code: "path_not_found",
            message: error.to_string(),
        },
        SandboxError::Timeout { millis } => CapabilityError::Timeout { millis },
        SandboxError::Spawn { .. } | SandboxError::Io(_) => CapabilityError::Execution {
            message: error.to_string(),
        },
    }
}

/// Fold a browser failure into the capability error taxonomy.
pub(crate) fn browser_error(error: atelier_browser::BrowserError) -> CapabilityError {
    use atelier_browser::BrowserError;
    match error {
        BrowserError::SessionExists { .. } => CapabilityError::Rejected {
            code: "session_exists",
            message: error.to_string(),
        },
        BrowserError::SessionNotFound { .. } => CapabilityError::Rejected {
            code: "session_not_found",
            message: error.to_string(),
        },
        BrowserError::Unavailable { .. } => CapabilityError::Unavailable {
            message: error.to_string(),
        },
        BrowserError::Page { .. } => CapabilityError::Execution {
            message: error.to_string(),
        },
    }
}

/// Fold a job queue failure into the capability error taxonomy.
pub(crate) fn job_error(error: atelier_jobs::JobError) -> CapabilityError {
    use atelier_jobs::JobError;
    match error {
        JobError::InvalidSpec { .. } => CapabilityError::InvalidArguments {
            message: error.to_string(),
        },
        JobError::NotFound { .. } => CapabilityError::Rejected {
            code: "job_not_found",
            message: error.to_string(),
        },
        JobError::InvalidTransition { .. } => CapabilityError::Rejected {
            code: "invalid_transition",
            message: error.to_string(),
        },
        JobError::Storage(_) => CapabilityError::Unavailable {
            message: error.to_string(),
        },
    }
}
