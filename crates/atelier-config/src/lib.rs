//! Atelier Config - Configuration for the action core.
//!
//! Loaded as: built-in defaults → optional TOML file → environment variable
//! overrides → validation. Every section implements [`Default`] with
//! production-ready values, so a bare `[section]` header (or no file at all)
//! produces a working configuration.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod error;
mod loader;
mod types;
mod validate;

pub use error::{ConfigError, ConfigResult};
pub use types::{
    BrowserSection, Config, JobsSection, LoggingSection, SandboxSection, StorageBackend,
    StorageSection,
};
