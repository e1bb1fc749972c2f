use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use foreman::exec::{Executor, Job};

/// An executor that queues jobs until the test runs them.
///
/// Lets a test observe the manager between dispatch and completion: after
/// `start()`, everything admitted sits here and the manager's running set is
/// exactly what the queue holds.
#[derive(Default)]
pub struct FakeExecutor {
    jobs: Mutex<VecDeque<Job>>,
    submitted: AtomicUsize,
}

impl FakeExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Jobs submitted but not run yet.
    pub fn queued(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }

    /// Total jobs ever accepted.
    pub fn submitted(&self) -> usize {
        self.submitted.load(Ordering::SeqCst)
    }

    /// Run the oldest queued job on the calling thread.
    pub fn run_next(&self) -> bool {
        // Lock released before the job runs.
        let job = self.jobs.lock().unwrap().pop_front();
        match job {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }

    /// Run the most recently queued job.
    pub fn run_last(&self) -> bool {
        let job = self.jobs.lock().unwrap().pop_back();
        match job {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }

    /// Run every queued job, oldest first.
    pub fn run_all(&self) -> usize {
        let mut count = 0;
        while self.run_next() {
            count += 1;
        }
        count
    }
}

impl Executor for FakeExecutor {
    fn submit(&self, job: Job) -> anyhow::Result<()> {
        self.jobs.lock().unwrap().push_back(job);
        self.submitted.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Runs each job synchronously inside `submit`.
///
/// Signals still go through the manager's channel, so nothing is observed
/// until the test drains it.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl InlineExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

impl Executor for InlineExecutor {
    fn submit(&self, job: Job) -> anyhow::Result<()> {
        job();
        Ok(())
    }
}

/// Rejects every job.
#[derive(Debug, Default, Clone, Copy)]
pub struct RejectingExecutor;

impl Executor for RejectingExecutor {
    fn submit(&self, _job: Job) -> anyhow::Result<()> {
        anyhow::bail!("rejecting executor refuses all jobs")
    }
}
