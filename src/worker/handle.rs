// src/worker/handle.rs

//! The [`Worker`] handle: identity, priority, status and the run protocol.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use crate::errors::{ForemanError, Result};
use crate::exec::{Executor, default_pool};
use crate::signal::{self, Envelope, Signal, SignalReceiver, SignalSender};
use crate::types::NotifyMode;
use crate::worker::{FnWork, Work, WorkerStatus};

static NEXT_KEY: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a worker.
///
/// Two handles with the same key refer to the same worker. The user-facing
/// [`Worker::id`] is a label and need not be unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerKey(u64);

impl fmt::Display for WorkerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct WorkerInner {
    key: WorkerKey,
    id: String,
    priority: AtomicI32,
    notify: NotifyMode,
    status: Mutex<WorkerStatus>,
    /// Number of the latest dispatch. Signals from earlier runs are dropped.
    run: AtomicU64,
    /// Where signals go for the current run. Set on dispatch, cleared on
    /// dispose.
    observer: Mutex<Option<SignalSender>>,
    work: Box<dyn Work>,
}

/// A schedulable unit of work.
///
/// `Worker` is a cheap, clonable handle. Clones share identity, status and
/// the underlying [`Work`]; a manager keeps one clone in whichever of its
/// collections currently owns the worker while the client may keep another
/// to inspect it.
#[derive(Clone)]
pub struct Worker {
    inner: Arc<WorkerInner>,
}

impl Worker {
    /// Worker with a time-based id, priority 0 and automatic notification.
    pub fn new(work: impl Work) -> Self {
        WorkerBuilder::new(work).build()
    }

    pub fn builder(work: impl Work) -> WorkerBuilder {
        WorkerBuilder::new(work)
    }

    /// Shorthand for a closure-backed worker with the given id.
    pub fn from_fn<F>(id: impl Into<String>, f: F) -> Self
    where
        F: Fn(&crate::worker::Notifier) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        WorkerBuilder::new(FnWork::new(f)).id(id).build()
    }

    pub fn key(&self) -> WorkerKey {
        self.inner.key
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn priority(&self) -> i32 {
        self.inner.priority.load(Ordering::Acquire)
    }

    /// Change the priority key.
    ///
    /// A worker already stored in a priority queue keeps its position; the
    /// new key applies the next time it is enqueued.
    pub fn set_priority(&self, priority: i32) {
        self.inner.priority.store(priority, Ordering::Release);
    }

    pub fn notify_mode(&self) -> NotifyMode {
        self.inner.notify
    }

    pub fn status(&self) -> WorkerStatus {
        *lock(&self.inner.status)
    }

    pub fn is_ready(&self) -> bool {
        self.status() == WorkerStatus::Ready
    }

    pub fn is_working(&self) -> bool {
        self.status() == WorkerStatus::Working
    }

    pub fn is_finished(&self) -> bool {
        self.status() == WorkerStatus::Complete
    }

    pub fn is_failed(&self) -> bool {
        self.status() == WorkerStatus::Error
    }

    /// Ask the work routine to stop.
    pub fn stop(&self) -> Result<()> {
        match self.inner.work.stop() {
            Ok(()) => {
                self.set_status(WorkerStatus::Stop);
                debug!(worker = %self.id(), key = %self.key(), "worker accepted stop request");
                Ok(())
            }
            Err(_) => Err(ForemanError::StopUnsupported {
                worker: self.id().to_string(),
            }),
        }
    }

    /// Release the worker: no further signals are delivered for it.
    pub fn dispose(&self) {
        lock(&self.inner.observer).take();
    }

    /// Run on `executor`, delivering signals to `observer`.
    ///
    /// Returns as soon as the job is submitted.
    pub fn process_with(&self, observer: SignalSender, executor: &dyn Executor) -> Result<()> {
        let run = {
            let mut slot = lock(&self.inner.observer);
            *slot = Some(observer);
            self.inner.run.fetch_add(1, Ordering::AcqRel) + 1
        };
        self.set_status(WorkerStatus::Working);
        debug!(worker = %self.id(), key = %self.key(), run, "dispatching worker");

        let worker = self.clone();
        executor
            .submit(Box::new(move || worker.run(run)))
            .map_err(|err| {
                self.dispose();
                self.set_status(WorkerStatus::Ready);
                ForemanError::ExecutorRejected {
                    worker: self.id().to_string(),
                    reason: format!("{err:#}"),
                }
            })
    }

    /// Run outside any manager. The returned receiver yields this worker's
    /// signals; drain it on the thread that should see them.
    pub fn process(&self, executor: &dyn Executor) -> Result<SignalReceiver> {
        let (tx, rx) = signal::channel();
        self.process_with(tx, executor)?;
        Ok(rx)
    }

    /// [`Worker::process`] on the process-wide default pool.
    pub fn process_default(&self) -> Result<SignalReceiver> {
        self.process(default_pool()?)
    }

    /// Number of the latest dispatch, starting at 1. Zero if never dispatched.
    pub fn current_run(&self) -> u64 {
        self.inner.run.load(Ordering::Acquire)
    }

    /// Body of the pool job for dispatch number `run`.
    fn run(&self, run: u64) {
        if self.current_run() != run {
            debug!(worker = %self.id(), run, "run superseded before it started; skipping");
            return;
        }
        if self.status() == WorkerStatus::Stop {
            debug!(worker = %self.id(), run, "stopped before it started; skipping");
            return;
        }
        debug!(worker = %self.id(), key = %self.key(), run, "work routine started");

        let notifier = Notifier::new(self, run);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.inner.work.work(&notifier)));

        match outcome {
            Ok(Ok(())) => {
                if self.inner.notify == NotifyMode::Automatic {
                    notifier.complete();
                }
            }
            Ok(Err(err)) => {
                let reason = format!("{err:#}");
                warn!(worker = %self.id(), error = %reason, "work routine returned an error");
                notifier.error(reason);
            }
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                warn!(worker = %self.id(), %reason, "work routine panicked");
                notifier.error(format!("panicked: {reason}"));
            }
        }
    }

    /// Hand a signal raised by dispatch `run` to the current observer, if
    /// that dispatch is still the latest one.
    fn send_signal(&self, run: u64, signal: Signal) -> bool {
        let observer = {
            let slot = lock(&self.inner.observer);
            if self.current_run() != run {
                debug!(worker = %self.id(), run, ?signal, "signal from a superseded run; dropping");
                return false;
            }
            slot.clone()
        };
        match observer {
            Some(tx) => tx.send(Envelope {
                worker: self.clone(),
                run,
                signal,
            }),
            None => {
                debug!(worker = %self.id(), ?signal, "no observer attached; dropping signal");
                false
            }
        }
    }

    /// Worker-side half of signal delivery. Runs on the draining thread.
    pub(crate) fn apply_signal(&self, signal: &Signal) {
        match signal {
            Signal::Complete => {
                self.set_status(WorkerStatus::Complete);
                self.inner.work.on_complete();
            }
            Signal::Progress => self.inner.work.on_progress(),
            Signal::Error(reason) => {
                self.set_status(WorkerStatus::Error);
                self.inner.work.on_error(reason);
            }
        }
    }

    fn set_status(&self, status: WorkerStatus) {
        *lock(&self.inner.status) = status;
    }
}

impl PartialEq for Worker {
    fn eq(&self, other: &Self) -> bool {
        self.inner.key == other.inner.key
    }
}

impl Eq for Worker {}

impl fmt::Debug for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("key", &self.inner.key)
            .field("id", &self.inner.id)
            .field("priority", &self.priority())
            .field("status", &self.status())
            .finish()
    }
}

impl fmt::Display for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "worker id={}, priority={}, status={}",
            self.id(),
            self.priority(),
            self.status()
        )
    }
}

/// Builder for [`Worker`].
pub struct WorkerBuilder {
    id: Option<String>,
    priority: i32,
    notify: NotifyMode,
    work: Box<dyn Work>,
}

impl WorkerBuilder {
    pub fn new(work: impl Work) -> Self {
        Self {
            id: None,
            priority: 0,
            notify: NotifyMode::Automatic,
            work: Box::new(work),
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn notify(mut self, mode: NotifyMode) -> Self {
        self.notify = mode;
        self
    }

    /// Shorthand for `notify(NotifyMode::Manual)`.
    pub fn manual(self) -> Self {
        self.notify(NotifyMode::Manual)
    }

    pub fn build(self) -> Worker {
        let id = self.id.unwrap_or_else(time_based_id);
        Worker {
            inner: Arc::new(WorkerInner {
                key: WorkerKey(NEXT_KEY.fetch_add(1, Ordering::Relaxed)),
                id,
                priority: AtomicI32::new(self.priority),
                notify: self.notify,
                status: Mutex::new(WorkerStatus::Ready),
                run: AtomicU64::new(0),
                observer: Mutex::new(None),
                work: self.work,
            }),
        }
    }
}

/// Handle a work routine uses to raise its own signals.
///
/// Clonable and `'static`, so a routine in manual notify mode can move it into
/// whatever asynchronous activity it launches. It does not keep the worker
/// alive, and it is bound to one dispatch: once the worker is dispatched
/// again, signals raised through an older notifier are dropped.
#[derive(Clone)]
pub struct Notifier {
    id: String,
    run: u64,
    worker: Weak<WorkerInner>,
}

impl Notifier {
    fn new(worker: &Worker, run: u64) -> Self {
        Self {
            id: worker.id().to_string(),
            run,
            worker: Arc::downgrade(&worker.inner),
        }
    }

    pub fn worker_id(&self) -> &str {
        &self.id
    }

    /// Raise a completion signal. Returns `false` if nobody will see it.
    pub fn complete(&self) -> bool {
        self.send(Signal::Complete)
    }

    pub fn progress(&self) -> bool {
        self.send(Signal::Progress)
    }

    pub fn error(&self, reason: impl Into<String>) -> bool {
        self.send(Signal::Error(reason.into()))
    }

    fn send(&self, signal: Signal) -> bool {
        match self.worker.upgrade() {
            Some(inner) => Worker { inner }.send_signal(self.run, signal),
            None => false,
        }
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("worker", &self.id)
            .field("run", &self.run)
            .finish()
    }
}

fn time_based_id() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
