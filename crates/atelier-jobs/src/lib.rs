//! Atelier Jobs - Durable, asynchronous work items.
//!
//! Work too long-lived to run inline ("generate a project") is written as
//! a [`Job`] record and picked up by an external worker process. This crate
//! owns the record's contract: the fields, the status state machine
//! (`Queued → Running → Done | Failed`), and the atomic claim that moves a
//! job to `Running` for exactly one worker.
//!
//! Consumption (polling, executing, writing back a terminal status) lives in
//! the worker; the worker calls back into [`JobQueue::claim_next`],
//! [`JobQueue::complete`] and [`JobQueue::fail`], which enforce the legal
//! transitions. There is no automatic retry: a failed job stays `Failed` and
//! queryable, and [`JobQueue::requeue`] is the only (explicit) retry path.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod error;
mod job;
mod queue;

pub use error::{JobError, JobResult};
pub use job::{Job, JobSpec, JobStatus};
pub use queue::JobQueue;
