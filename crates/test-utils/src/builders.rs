use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use foreman::errors::Unsupported;
use foreman::worker::{Notifier, Work, Worker};

/// Shared, ordered record of which work routines ran.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Worker that succeeds immediately.
pub fn ok(id: &str) -> Worker {
    Worker::from_fn(id, |_| Ok(()))
}

/// Worker with the given priority that succeeds immediately.
pub fn with_priority(id: &str, priority: i32) -> Worker {
    Worker::builder(foreman::work_fn(|_| Ok(())))
        .id(id)
        .priority(priority)
        .build()
}

/// Worker whose routine always fails with `reason`.
pub fn failing(id: &str, reason: &str) -> Worker {
    let reason = reason.to_string();
    Worker::from_fn(id, move |_| Err(anyhow::anyhow!("{reason}")))
}

/// Worker that appends its id to `log` when it runs.
pub fn logged(id: &str, log: &EventLog) -> Worker {
    let log = log.clone();
    let entry = id.to_string();
    Worker::from_fn(id, move |_| {
        log.push(entry.clone());
        Ok(())
    })
}

/// Fails the first `failures` attempts, then succeeds.
#[derive(Debug)]
pub struct FlakyWork {
    failures: usize,
    attempts: Arc<AtomicUsize>,
}

impl FlakyWork {
    pub fn new(failures: usize) -> Self {
        Self {
            failures,
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared attempt counter, readable after the work is moved into a worker.
    pub fn attempts(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.attempts)
    }
}

impl Work for FlakyWork {
    fn work(&self, notifier: &Notifier) -> anyhow::Result<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures {
            anyhow::bail!("{} attempt {} failed", notifier.worker_id(), attempt + 1);
        }
        Ok(())
    }
}

/// Work that accepts stop requests and counts them.
#[derive(Debug, Default)]
pub struct StoppableWork {
    stops: Arc<AtomicUsize>,
}

impl StoppableWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stops(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.stops)
    }
}

impl Work for StoppableWork {
    fn work(&self, _notifier: &Notifier) -> anyhow::Result<()> {
        Ok(())
    }

    fn stop(&self) -> Result<(), Unsupported> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
