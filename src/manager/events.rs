// src/manager/events.rs

//! Reactions to worker signals and listener notification.

use tracing::{debug, warn};

use crate::manager::{ErrorInfo, Manager, Status};
use crate::signal::WorkerObserver;
use crate::worker::Worker;

impl WorkerObserver for Manager {
    fn on_worker_complete(&mut self, worker: &Worker) {
        if self.running.remove(&worker.key()).is_none() {
            debug!(manager = %self.id, worker = %worker.id(), "ignoring completion of a worker that is not running");
            return;
        }
        worker.dispose();

        if let Some(finished) = &mut self.finished {
            finished.insert(worker.id().to_string(), worker.clone());
        }
        self.info.num_complete += 1;

        // Paused or stopped while the worker ran.
        if !self.is_running() {
            return;
        }

        self.notify_progress(worker.id());

        if self.policy.pending_count() == 0 && self.running.is_empty() {
            self.info.set_status(Status::Idle);
            self.notify_complete();
            return;
        }

        if let Err(err) = self.admit() {
            warn!(manager = %self.id, error = %err, "admission after completion failed");
        }
    }

    fn on_worker_progress(&mut self, worker: &Worker) {
        debug!(manager = %self.id, worker = %worker.id(), "worker progress");
    }

    fn on_worker_error(&mut self, worker: &Worker, reason: &str) {
        if self.running.remove(&worker.key()).is_none() {
            debug!(manager = %self.id, worker = %worker.id(), reason, "ignoring error of a worker that is not running");
            return;
        }
        worker.dispose();
        self.record_failure(worker.clone(), reason);
    }
}

impl Manager {
    // The listener is taken out for the call so it can borrow the manager.

    pub(crate) fn notify_complete(&mut self) {
        if let Some(mut listener) = self.listener.take() {
            listener.on_complete(self);
            self.listener.get_or_insert(listener);
        }
    }

    pub(crate) fn notify_progress(&mut self, worker_id: &str) {
        if let Some(listener) = self.listener.as_mut() {
            listener.on_progress(worker_id);
        }
    }

    pub(crate) fn notify_error(&mut self, error: &ErrorInfo) {
        if let Some(listener) = self.listener.as_mut() {
            listener.on_error(error);
        }
    }
}
