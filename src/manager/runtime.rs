// src/manager/runtime.rs

//! Owner-side signal delivery.
//!
//! Pool threads only send into the manager's channel. Whoever owns the
//! manager applies those signals here, one at a time, with exclusive access
//! to the bookkeeping.

use tracing::trace;

use crate::manager::Manager;

impl Manager {
    /// Apply every signal already delivered, without waiting. Returns how
    /// many were applied; signals from superseded runs are not counted.
    pub fn dispatch_signals(&mut self) -> usize {
        let mut count = 0;
        while let Some(envelope) = self.signals_rx.try_next() {
            if envelope.deliver(self) {
                count += 1;
            }
        }
        count
    }

    /// Wait for one signal and apply it.
    ///
    /// Returns `false` if the channel is closed, which cannot happen while
    /// the manager is alive.
    pub async fn next_signal(&mut self) -> bool {
        match self.signals_rx.next().await {
            Some(envelope) => {
                envelope.deliver(self);
                true
            }
            None => false,
        }
    }

    /// Nothing running, and either nothing pending or admission suspended.
    pub fn is_settled(&self) -> bool {
        self.running.is_empty() && (self.policy.pending_count() == 0 || !self.is_running())
    }

    /// Apply signals until the manager is settled.
    ///
    /// Returns immediately for a manager that was never started. A manual
    /// notify worker that never signals keeps this waiting.
    pub async fn run_until_settled(&mut self) {
        self.dispatch_signals();
        while !self.is_settled() {
            trace!(manager = %self.id, running = self.running.len(), "waiting for signals");
            if !self.next_signal().await {
                break;
            }
        }
    }

    /// Blocking variant of [`Manager::next_signal`]. Must not be called from
    /// async code.
    pub fn blocking_next_signal(&mut self) -> bool {
        match self.signals_rx.blocking_next() {
            Some(envelope) => {
                envelope.deliver(self);
                true
            }
            None => false,
        }
    }

    /// Blocking variant of [`Manager::run_until_settled`].
    pub fn blocking_run_until_settled(&mut self) {
        self.dispatch_signals();
        while !self.is_settled() {
            if !self.blocking_next_signal() {
                break;
            }
        }
    }
}
