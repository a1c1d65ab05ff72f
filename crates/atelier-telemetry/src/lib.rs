//! Atelier Telemetry - Logging and tracing for the action core.
//!
//! This crate provides:
//! - Configurable logging setup with multiple formats
//! - Request context for correlation across capability invocations
//! - Integration with the tracing ecosystem
//!
//! # Example
//!
//! ```rust,no_run
//! use atelier_telemetry::{LogConfig, LogFormat, setup_logging, RequestContext};
//!
//! # fn main() -> Result<(), atelier_telemetry::TelemetryError> {
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Pretty)
//!     .with_directive("atelier_sandbox=trace");
//!
//! setup_logging(&config)?;
//!
//! let ctx = RequestContext::new("capability_registry").with_operation("invoke");
//! let span = ctx.span();
//! let _guard = span.enter();
//! tracing::info!("Processing invocation");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod context;
mod error;
mod logging;

pub use context::RequestContext;
pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LogConfig, LogFormat, setup_default_logging, setup_logging};
