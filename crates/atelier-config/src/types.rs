//! Configuration types for the action core.
//!
//! All types are self-contained; domain crates mirror what they need and
//! convert at the boundary. Every struct implements [`Default`] with
//! sensible production values.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for the action core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Sandbox session roots.
    pub sandbox: SandboxSection,
    /// Browser session lifetime policy.
    pub browser: BrowserSection,
    /// Job queue settings.
    pub jobs: JobsSection,
    /// Document store backend.
    pub storage: StorageSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

/// Where sandbox session roots are created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxSection {
    /// Directory under which all session roots live. Must be writable and
    /// private to the process.
    pub root: PathBuf,
}

impl Default for SandboxSection {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data/sandbox"),
        }
    }
}

/// Browser session lifetime policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSection {
    /// Maximum session age in seconds before the reaper expires it.
    pub max_age_secs: u64,
    /// Reaper sweep interval in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for BrowserSection {
    fn default() -> Self {
        Self {
            max_age_secs: 30 * 60,
            sweep_interval_secs: 30 * 60,
        }
    }
}

/// Job queue settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobsSection {
    /// Document collection holding job records.
    pub collection: String,
    /// Document collection holding invocation audit records.
    pub audit_collection: String,
}

impl Default for JobsSection {
    fn default() -> Self {
        Self {
            collection: "jobs".to_owned(),
            audit_collection: "invocations".to_owned(),
        }
    }
}

/// Which document store backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// In-memory documents; nothing survives a restart.
    Memory,
    /// Embedded persistent storage on local disk.
    Embedded,
}

/// Document store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Backend selection.
    pub backend: StorageBackend,
    /// Data directory for the embedded backend.
    pub path: PathBuf,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Embedded,
            path: PathBuf::from("data/store"),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Base filter level.
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, or `"json"`.
    pub format: String,
    /// Additional per-crate filter directives.
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}
