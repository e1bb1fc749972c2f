// src/manager/admission.rs

//! Admission loop: move pending workers into the running set.

use tracing::debug;

use crate::errors::Result;
use crate::manager::{ErrorInfo, Manager, Status};
use crate::worker::Worker;

impl Manager {
    /// How many more workers may be admitted right now.
    pub(crate) fn admittable(&self) -> usize {
        if !self.is_running() {
            return 0;
        }
        self.max_concurrent
            .saturating_sub(self.running.len())
            .min(self.policy.pending_count())
    }

    /// Admit a full burst of pending workers.
    ///
    /// Dispatch is fire-and-forget, so the loop never waits for a running
    /// worker. If the executor rejects a worker it is recorded as failed
    /// (which pauses the manager) and the rejection is returned.
    pub(crate) fn admit(&mut self) -> Result<()> {
        while self.admittable() > 0 {
            let Some(worker) = self.policy.take_next() else {
                break;
            };

            self.running.insert(worker.key(), worker.clone());
            self.info.set_status(Status::Working);
            debug!(
                manager = %self.id,
                worker = %worker.id(),
                running = self.running.len(),
                pending = self.policy.pending_count(),
                "admitting worker"
            );

            if let Err(err) = worker.process_with(self.signals_tx.clone(), self.executor.as_ref()) {
                self.running.remove(&worker.key());
                self.record_failure(worker, &err.to_string());
                return Err(err);
            }
        }

        // Resumed or restarted with workers still in flight.
        if self.is_idle() && !self.running.is_empty() {
            self.info.set_status(Status::Working);
        }
        Ok(())
    }

    /// Pause, move `worker` to the failed list, record and report the error.
    pub(crate) fn record_failure(&mut self, worker: Worker, reason: &str) {
        self.pause();
        let error = ErrorInfo::failed_worker(&worker, reason);
        self.failed.push(worker);
        self.info.add_error(error.clone());
        self.notify_error(&error);
    }
}
