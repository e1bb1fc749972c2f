// src/manager/mod.rs

//! The manager state machine.
//!
//! - [`core`] holds the [`Manager`] type and the client operations
//!   (`enqueue`, `start`, `pause`, `resume`, `stop`, `retry`).
//! - [`admission`] moves pending workers into the running set.
//! - [`events`] reacts to worker completion and error signals.
//! - [`runtime`] drains the signal channel on the owner's side.
//! - [`status`] and [`listener`] are the status/error types and the
//!   client-facing callbacks.

pub mod admission;
pub mod core;
pub mod events;
pub mod listener;
pub mod runtime;
pub mod status;

pub use self::core::Manager;
pub use listener::{LogListener, ManagerListener};
pub use status::{ErrorCode, ErrorInfo, Status, StatusInfo};
