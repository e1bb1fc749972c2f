// src/manager/listener.rs

use tracing::{info, warn};

use crate::manager::{ErrorInfo, Manager};

/// Client-facing callbacks of a manager.
///
/// Invoked on the thread that drains the manager's signals.
pub trait ManagerListener: Send {
    /// The manager went idle with nothing pending or running.
    fn on_complete(&mut self, manager: &Manager);

    /// A single worker completed.
    fn on_progress(&mut self, _worker_id: &str) {}

    /// A single worker failed. The manager is now paused.
    fn on_error(&mut self, _error: &ErrorInfo) {}
}

/// Listener that only logs. Used by the CLI.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogListener;

impl ManagerListener for LogListener {
    fn on_complete(&mut self, manager: &Manager) {
        info!(
            manager = %manager.id(),
            complete = manager.status_info().num_complete,
            total = manager.status_info().num_total,
            "all workers finished"
        );
    }

    fn on_progress(&mut self, worker_id: &str) {
        info!(worker = %worker_id, "worker finished");
    }

    fn on_error(&mut self, error: &ErrorInfo) {
        warn!(worker = error.worker_id().unwrap_or("-"), "{}", error.message);
    }
}
