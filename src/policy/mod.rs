// src/policy/mod.rs

//! Ordering policies: which pending worker runs next.
//!
//! The manager's admission loop is written only against [`OrderingPolicy`];
//! the concrete variant is chosen when the manager is constructed.
//!
//! - [`priority`]: max-priority-first heap.
//! - [`topological`]: FIFO loaded once from a dependency-sorted order.

pub mod priority;
pub mod topological;

pub use priority::PriorityPolicy;
pub use topological::TopologicalPolicy;

use crate::types::ExecutionMode;
use crate::worker::Worker;

/// Storage and selection of pending workers.
pub trait OrderingPolicy: Send {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Accept a newly enqueued worker.
    fn store(&mut self, worker: Worker);

    /// Remove and return the worker that should run next.
    fn take_next(&mut self) -> Option<Worker>;

    fn pending_count(&self) -> usize;

    /// Snapshot of the pending workers, in the order `take_next` would
    /// return them.
    fn pending_workers(&self) -> Vec<Worker>;

    /// Drop every pending worker.
    fn clear_all(&mut self);

    /// Called when the manager is stopped.
    ///
    /// Both built-in policies drop their pending work. A custom policy may
    /// override this to keep it.
    fn on_stop(&mut self) {
        self.clear_all();
    }

    /// Execution mode this policy requires, if any. The manager ignores
    /// requests for any other mode.
    fn forced_mode(&self) -> Option<ExecutionMode> {
        None
    }
}
