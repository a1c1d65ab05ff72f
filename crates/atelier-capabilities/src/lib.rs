//! Atelier Capabilities - Schema-validated dynamic dispatch.
//!
//! A capability is a named, schema-described unit of action the agent can
//! invoke. This crate provides:
//!
//! - The [`Capability`] trait: name, description, parameter schema, handler
//! - [`ParameterSchema`]: structural validation of invocation arguments
//! - [`Registry`]: an explicit name → (schema, handler) table with a single
//!   `invoke` entry point
//! - [`FnCapability`]: capabilities minted at runtime from async closures
//! - [`InvocationAudit`]: optional persistence of one record per invocation
//!
//! Validation failures (unknown name, missing or ill-typed argument) are
//! reported as a structured failure envelope without running the handler;
//! handler failures are folded into the same envelope with their error class
//! preserved. Nothing in this crate panics on bad input.
//!
//! # Example
//!
//! ```
//! use atelier_capabilities::{FnCapability, ParameterSchema, PropertySchema, Registry};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let registry = Registry::new();
//! let echo = FnCapability::new(
//!     "echo",
//!     "Echoes its message back",
//!     ParameterSchema::new()
//!         .property("message", PropertySchema::string("Text to echo"))
//!         .required("message"),
//!     |args| async move { Ok(json!({ "echoed": args["message"] })) },
//! );
//! registry.register(Arc::new(echo)).await.unwrap();
//!
//! let result = registry.invoke("echo", json!({ "message": "hi" })).await;
//! assert!(result.is_success());
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod audit;
mod dynamic;
mod error;
mod invocation;
mod registry;
mod schema;

pub use audit::{InvocationAudit, InvocationRecord};
pub use dynamic::FnCapability;
pub use error::{CapabilityError, CapabilityResult};
pub use invocation::Invocation;
pub use registry::{Capability, CapabilityDefinition, Registry};
pub use schema::{ParamType, ParameterSchema, PropertySchema};
