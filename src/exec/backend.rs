// src/exec/backend.rs

//! Pluggable executor abstraction.
//!
//! Managers and standalone workers talk to an [`Executor`] instead of a
//! concrete thread pool. Production code uses [`crate::exec::WorkerPool`];
//! tests can provide an executor that queues jobs and runs them on demand, so
//! the running set can be observed between dispatch and completion.

use std::sync::Arc;

/// A unit of work handed to an executor.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Trait abstracting how dispatched workers are executed.
///
/// Implementations must run each submitted job asynchronously and
/// independently of the others. Returning `Err` means the job was rejected
/// and will never run.
pub trait Executor: Send + Sync {
    fn submit(&self, job: Job) -> anyhow::Result<()>;
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn submit(&self, job: Job) -> anyhow::Result<()> {
        (**self).submit(job)
    }
}
