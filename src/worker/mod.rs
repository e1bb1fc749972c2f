// src/worker/mod.rs

//! Workers: schedulable units of work.
//!
//! - [`work`] defines the client-facing [`Work`] contract plus the closure
//!   and chain adapters.
//! - [`handle`] holds the [`Worker`] handle, its builder, and the
//!   [`Notifier`] a work routine uses to raise signals by hand.
//! - [`status`] is the worker lifecycle enum.

pub mod handle;
pub mod status;
pub mod work;

pub use handle::{Notifier, Worker, WorkerBuilder, WorkerKey};
pub use status::WorkerStatus;
pub use work::{ChainWork, FnWork, Work, work_fn};
