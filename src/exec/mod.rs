// src/exec/mod.rs

//! Execution layer.
//!
//! - [`backend`] provides the [`Executor`] trait managers dispatch through,
//!   which tests can replace with a queued or inline implementation.
//! - [`pool`] is the production [`WorkerPool`] plus the lazily created
//!   process-wide default pool.
//! - [`shell`] is a work routine running a shell command, used by the CLI.

pub mod backend;
pub mod pool;
pub mod shell;

pub use backend::{Executor, Job};
pub use pool::{WorkerPool, default_pool};
pub use shell::ShellWork;
