//! Atelier Sandbox - Isolated shell and file sessions.
//!
//! The [`SandboxManager`] owns a host-supplied root directory and carves out
//! one private subdirectory per session id. Sessions are created lazily on
//! first use and live for the process lifetime (browser sessions, by
//! contrast, are reaped; see `atelier-browser`).
//!
//! Every path argument is resolved relative to its session root and is
//! rejected if it would escape it, without requiring the target to exist.
//! Shell commands run with the session root as the default working
//! directory, capture stdout/stderr/exit code, and have no implicit timeout:
//! callers wanting bounded execution pass an explicit deadline.
//!
//! Operations against the *same* session are not serialized here; concurrent
//! shell commands in one session may race on shared files. That is a
//! documented limitation, and the caller's to reason about. Distinct
//! sessions are fully independent.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod error;
mod manager;
mod session;

pub use error::{SandboxError, SandboxResult};
pub use manager::{FileEntry, FileKind, SandboxManager, SessionInfo, ShellOptions, ShellOutcome};
pub use session::SandboxSession;
