// src/worker/status.rs

use std::fmt;

/// Lifecycle status of a single worker.
///
/// The normal path is `Ready -> Working -> {Complete | Error}`. `Pause` and
/// `Stop` are overrides imposed from outside, which a work routine may or may
/// not honour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerStatus {
    /// Created, not dispatched yet.
    Ready,
    /// Dispatched to an executor; the work routine is queued or running.
    Working,
    /// Completion signal has been delivered.
    Complete,
    Pause,
    /// Error signal has been delivered.
    Error,
    /// The worker accepted a stop request.
    Stop,
}

impl WorkerStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, WorkerStatus::Complete | WorkerStatus::Error)
    }
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkerStatus::Ready => "ready",
            WorkerStatus::Working => "working",
            WorkerStatus::Complete => "complete",
            WorkerStatus::Pause => "pause",
            WorkerStatus::Error => "error",
            WorkerStatus::Stop => "stop",
        };
        f.write_str(s)
    }
}
