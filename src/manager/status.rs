// src/manager/status.rs

//! Manager status, counters and error records.

use std::fmt;

use tracing::{debug, warn};

use crate::worker::Worker;

/// Lifecycle state of a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Constructed, never started.
    Ready,
    /// At least one worker is running.
    Working,
    /// Started, nothing running, accepting more work.
    Idle,
    /// Admission suspended. Running workers continue.
    Pause,
    /// Terminated. Running workers were asked to stop.
    Stop,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Ready => "ready",
            Status::Working => "working",
            Status::Idle => "idle",
            Status::Pause => "pause",
            Status::Stop => "stop",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    FailedWorker,
    NoError,
}

/// One recorded failure.
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub message: String,
    /// The worker that failed, when there is one.
    pub aux: Option<Worker>,
}

impl ErrorInfo {
    pub fn failed_worker(worker: &Worker, reason: &str) -> Self {
        Self {
            code: ErrorCode::FailedWorker,
            message: format!("worker '{}' failed: {reason}", worker.id()),
            aux: Some(worker.clone()),
        }
    }

    /// Id of the failed worker, if any.
    pub fn worker_id(&self) -> Option<&str> {
        self.aux.as_ref().map(Worker::id)
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

/// Status plus bookkeeping counters and the error log of a manager.
#[derive(Debug)]
pub struct StatusInfo {
    manager: String,
    status: Status,
    /// Incremented on every enqueue, never decremented.
    pub num_total: usize,
    /// Incremented on every delivered completion of a running worker.
    pub num_complete: usize,
    errors: Vec<ErrorInfo>,
}

impl StatusInfo {
    pub(crate) fn new(manager: &str) -> Self {
        Self {
            manager: manager.to_string(),
            status: Status::Ready,
            num_total: 0,
            num_complete: 0,
            errors: Vec::new(),
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: Status) {
        if self.status != status {
            debug!(manager = %self.manager, from = %self.status, to = %status, "manager status changed");
        }
        self.status = status;
    }

    pub fn errors(&self) -> &[ErrorInfo] {
        &self.errors
    }

    pub(crate) fn add_error(&mut self, error: ErrorInfo) {
        warn!(
            manager = %self.manager,
            code = ?error.code,
            worker = error.worker_id().unwrap_or("-"),
            "{}",
            error.message
        );
        self.errors.push(error);
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_worker_record_names_the_worker() {
        let w = Worker::from_fn("w1", |_| Ok(()));
        let info = ErrorInfo::failed_worker(&w, "boom");
        assert_eq!(info.code, ErrorCode::FailedWorker);
        assert!(info.message.contains("w1"));
        assert!(info.message.contains("boom"));
        assert_eq!(info.worker_id(), Some("w1"));
    }

    #[test]
    fn errors_accumulate_until_cleared() {
        let w = Worker::from_fn("w", |_| Ok(()));
        let mut info = StatusInfo::new("m");
        assert_eq!(info.status(), Status::Ready);

        info.add_error(ErrorInfo::failed_worker(&w, "a"));
        info.add_error(ErrorInfo::failed_worker(&w, "b"));
        assert_eq!(info.errors().len(), 2);

        info.clear_errors();
        assert!(info.errors().is_empty());
    }
}
