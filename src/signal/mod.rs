// src/signal/mod.rs

//! Notification channel between pool threads and the owner of a manager.
//!
//! Work routines run on pool threads, but their completion, progress and
//! error signals must be observed on the thread that dispatched them. Pool
//! threads therefore only ever *send* an [`Envelope`] into an unbounded
//! channel; the owner drains the [`SignalReceiver`] and calls
//! [`Envelope::deliver`], which:
//! 1. applies the worker-side effects (status change, work hooks), then
//! 2. invokes the matching [`WorkerObserver`] callback.
//!
//! Every envelope carries the dispatch number of the run that raised it.
//! An envelope from a run that has since been superseded by a new dispatch
//! of the same worker is dropped without touching either side.
//!
//! Sending never blocks, so a work routine can raise signals from any thread.

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::worker::Worker;

/// What a worker is reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    Complete,
    Progress,
    /// The work failed; carries a human-readable reason.
    Error(String),
}

/// A signal tagged with the worker and the dispatch that raised it.
#[derive(Debug)]
pub struct Envelope {
    pub worker: Worker,
    /// See [`Worker::current_run`].
    pub run: u64,
    pub signal: Signal,
}

impl Envelope {
    /// Whether this envelope belongs to the worker's latest dispatch.
    pub fn is_current(&self) -> bool {
        self.worker.current_run() == self.run
    }

    /// Apply this signal on the current thread. Returns `false` if it came
    /// from a superseded run and was dropped.
    pub fn deliver(self, observer: &mut dyn WorkerObserver) -> bool {
        if !self.is_current() {
            debug!(
                worker = %self.worker.id(),
                run = self.run,
                current = self.worker.current_run(),
                signal = ?self.signal,
                "dropping signal from a superseded run"
            );
            return false;
        }
        trace!(worker = %self.worker.id(), run = self.run, signal = ?self.signal, "delivering signal");
        self.worker.apply_signal(&self.signal);

        match self.signal {
            Signal::Complete => observer.on_worker_complete(&self.worker),
            Signal::Progress => observer.on_worker_progress(&self.worker),
            Signal::Error(reason) => observer.on_worker_error(&self.worker, &reason),
        }
        true
    }
}

/// Callbacks for worker lifecycle events.
///
/// Implemented by the manager; all callbacks run on the thread draining the
/// signal channel.
pub trait WorkerObserver {
    fn on_worker_complete(&mut self, worker: &Worker);

    fn on_worker_progress(&mut self, worker: &Worker);

    fn on_worker_error(&mut self, worker: &Worker, reason: &str);
}

/// Observer that ignores everything.
///
/// Useful when draining a standalone worker whose own hooks are all that
/// matters.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl WorkerObserver for NoopObserver {
    fn on_worker_complete(&mut self, _worker: &Worker) {}

    fn on_worker_progress(&mut self, _worker: &Worker) {}

    fn on_worker_error(&mut self, _worker: &Worker, _reason: &str) {}
}

/// Sending half, cloned into every dispatched worker.
#[derive(Debug, Clone)]
pub struct SignalSender {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl SignalSender {
    /// Returns `false` if the receiving side is gone.
    pub fn send(&self, envelope: Envelope) -> bool {
        self.tx.send(envelope).is_ok()
    }
}

/// Receiving half, owned by whoever should observe the signals.
#[derive(Debug)]
pub struct SignalReceiver {
    rx: mpsc::UnboundedReceiver<Envelope>,
}

impl SignalReceiver {
    /// Next already-delivered envelope, without waiting.
    pub fn try_next(&mut self) -> Option<Envelope> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next envelope. `None` once every sender is gone.
    pub async fn next(&mut self) -> Option<Envelope> {
        self.rx.recv().await
    }

    /// Blocking variant of [`SignalReceiver::next`].
    ///
    /// Must not be called from within an async execution context.
    pub fn blocking_next(&mut self) -> Option<Envelope> {
        self.rx.blocking_recv()
    }

    /// Deliver everything currently queued to `observer`. Returns how many
    /// envelopes were applied.
    pub fn deliver_all(&mut self, observer: &mut dyn WorkerObserver) -> usize {
        let mut count = 0;
        while let Some(envelope) = self.try_next() {
            if envelope.deliver(observer) {
                count += 1;
            }
        }
        count
    }
}

/// Create a new signal channel.
pub fn channel() -> (SignalSender, SignalReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SignalSender { tx }, SignalReceiver { rx })
}
