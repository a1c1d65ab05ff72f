//! Atelier Storage - Document persistence boundary.
//!
//! Jobs, capability-invocation audit records, and session metadata are
//! persisted as simple JSON documents keyed by an opaque identifier within a
//! named collection. Two backends implement the [`DocumentStore`] trait:
//!
//! - **In-memory** (always available): for tests and ephemeral deployments
//! - **`SurrealKV`** (behind the `kv` feature, on by default): persistent,
//!   ACID-compliant embedded storage
//!
//! [`Collection`] layers typed JSON access on top of the raw byte store; it
//! is the primary API used by the job queue and the invocation audit.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod collection;
mod error;
mod store;

pub use collection::Collection;
pub use error::{StorageError, StorageResult};
pub use store::{DocumentStore, MemoryDocumentStore};

#[cfg(feature = "kv")]
pub use store::SurrealKvStore;
