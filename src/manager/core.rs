// src/manager/core.rs

//! Manager state and client-facing operations.
//!
//! All mutation goes through `&mut self`. Worker signals are applied by
//! draining the manager's channel (see [`crate::manager::runtime`]), so the
//! exclusive borrow is the only synchronisation the bookkeeping needs.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::ManagerConfig;
use crate::dag::TopologicalBuilder;
use crate::errors::{ForemanError, Result};
use crate::exec::{Executor, WorkerPool};
use crate::manager::{ManagerListener, Status, StatusInfo};
use crate::policy::{OrderingPolicy, PriorityPolicy};
use crate::signal::{self, SignalReceiver, SignalSender};
use crate::types::ExecutionMode;
use crate::worker::{Worker, WorkerKey};

/// Scheduler governing admission, ordering and lifecycle of a set of workers.
pub struct Manager {
    pub(crate) id: String,
    pub(crate) info: StatusInfo,
    pub(crate) mode: ExecutionMode,
    pub(crate) max_concurrent: usize,
    pub(crate) policy: Box<dyn OrderingPolicy>,
    pub(crate) running: HashMap<WorkerKey, Worker>,
    pub(crate) failed: Vec<Worker>,
    /// `None` when finished workers are not stored.
    pub(crate) finished: Option<HashMap<String, Worker>>,
    pub(crate) listener: Option<Box<dyn ManagerListener>>,
    pub(crate) executor: Arc<dyn Executor>,
    pub(crate) signals_tx: SignalSender,
    pub(crate) signals_rx: SignalReceiver,
}

impl Manager {
    /// Priority manager running on its own worker pool.
    pub fn priority(config: ManagerConfig) -> Result<Self> {
        Self::with_policy(config, PriorityPolicy::new())
    }

    /// Builder for a manager whose order comes from dependency constraints.
    pub fn topological() -> TopologicalBuilder {
        TopologicalBuilder::new()
    }

    /// Manager with a custom policy, running on its own worker pool.
    pub fn with_policy(config: ManagerConfig, policy: impl OrderingPolicy + 'static) -> Result<Self> {
        let pool = WorkerPool::new(&config.id, &config.pool)?;
        Ok(Self::with_executor(config, Box::new(policy), Arc::new(pool)))
    }

    /// Manager dispatching to `executor` instead of a pool of its own.
    pub fn with_executor(
        config: ManagerConfig,
        policy: Box<dyn OrderingPolicy>,
        executor: Arc<dyn Executor>,
    ) -> Self {
        let (signals_tx, signals_rx) = signal::channel();
        let mut manager = Self {
            info: StatusInfo::new(&config.id),
            id: config.id,
            mode: ExecutionMode::NonSerial,
            max_concurrent: ExecutionMode::NonSerial.max_concurrent(),
            policy,
            running: HashMap::new(),
            failed: Vec::new(),
            finished: config.store_finished.then(HashMap::new),
            listener: None,
            executor,
            signals_tx,
            signals_rx,
        };
        manager.set_execution_mode(config.execution_mode);

        debug!(
            manager = %manager.id,
            policy = manager.policy.name(),
            mode = ?manager.mode,
            max_concurrent = manager.max_concurrent,
            "manager created"
        );
        manager
    }

    /// Queue a worker. It is admitted right away only if the manager is
    /// running; otherwise it waits for `start` or `resume`.
    pub fn enqueue(&mut self, worker: Worker) -> Result<()> {
        debug!(manager = %self.id, worker = %worker.id(), priority = worker.priority(), "enqueue");
        self.policy.store(worker);
        self.info.num_total += 1;

        if self.is_running() {
            self.admit()?;
        }
        Ok(())
    }

    /// Start admitting work. No-op if already running.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            debug!(manager = %self.id, status = %self.status(), "start ignored; already running");
            return Ok(());
        }
        info!(manager = %self.id, pending = self.pending_count(), "manager started");
        self.info.set_status(Status::Idle);
        self.admit()
    }

    /// Suspend admission. Running workers are left alone.
    pub fn pause(&mut self) {
        if self.is_running() {
            self.info.set_status(Status::Pause);
        }
    }

    /// Resume admission after a pause. No-op unless paused.
    pub fn resume(&mut self) -> Result<()> {
        if !self.is_paused() {
            return Ok(());
        }
        self.info.set_status(Status::Idle);
        self.admit()
    }

    /// Stop the manager.
    ///
    /// Every running worker is asked to stop and released, the running set is
    /// cleared and the policy's stop handling runs (both built-in policies
    /// drop pending work). If a worker cannot be stopped, the bookkeeping
    /// still completes and the first such failure is returned.
    pub fn stop(&mut self) -> Result<()> {
        if self.is_ready() || self.is_stopped() {
            return Ok(());
        }
        self.info.set_status(Status::Stop);

        let mut first_err: Option<ForemanError> = None;
        for (_, worker) in self.running.drain() {
            if let Err(err) = worker.stop() {
                debug!(worker = %worker.id(), error = %err, "worker refused to stop");
                first_err.get_or_insert(err);
            }
            worker.dispose();
        }
        self.policy.on_stop();

        info!(manager = %self.id, "manager stopped");
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Re-queue every failed worker, then resume.
    pub fn retry(&mut self) -> Result<()> {
        let failed = std::mem::take(&mut self.failed);
        info!(manager = %self.id, count = failed.len(), "retrying failed workers");
        for worker in failed {
            self.enqueue(worker)?;
        }
        self.resume()
    }

    /// Release everything the manager holds. The manager ends up stopped.
    pub fn dispose(&mut self) {
        for (_, worker) in self.running.drain() {
            worker.dispose();
        }
        self.failed.clear();
        self.policy.clear_all();
        if let Some(finished) = &mut self.finished {
            finished.clear();
        }
        self.info.clear_errors();
        self.listener = None;
        self.info.set_status(Status::Stop);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> Status {
        self.info.status()
    }

    pub fn status_info(&self) -> &StatusInfo {
        &self.info
    }

    pub fn clear_errors(&mut self) {
        self.info.clear_errors();
    }

    /// Working or idle.
    pub fn is_running(&self) -> bool {
        matches!(self.status(), Status::Working | Status::Idle)
    }

    pub fn is_ready(&self) -> bool {
        self.status() == Status::Ready
    }

    pub fn is_working(&self) -> bool {
        self.status() == Status::Working
    }

    pub fn is_idle(&self) -> bool {
        self.status() == Status::Idle
    }

    pub fn is_paused(&self) -> bool {
        self.status() == Status::Pause
    }

    pub fn is_stopped(&self) -> bool {
        self.status() == Status::Stop
    }

    pub fn execution_mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Change the execution mode. A policy that requires a specific mode
    /// keeps it.
    pub fn set_execution_mode(&mut self, mode: ExecutionMode) {
        let mode = match self.policy.forced_mode() {
            Some(forced) if forced != mode => {
                debug!(
                    manager = %self.id,
                    requested = ?mode,
                    forced = ?forced,
                    "execution mode fixed by {} policy",
                    self.policy.name()
                );
                forced
            }
            _ => mode,
        };
        self.mode = mode;
        self.max_concurrent = mode.max_concurrent();
    }

    pub fn set_listener(&mut self, listener: impl ManagerListener + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn clear_listener(&mut self) {
        self.listener = None;
    }

    /// Enable or disable keeping completed workers by id. Disabling drops
    /// what was kept so far.
    pub fn store_finished_workers(&mut self, store: bool) {
        match (store, self.finished.is_some()) {
            (true, false) => self.finished = Some(HashMap::new()),
            (false, true) => self.finished = None,
            _ => {}
        }
    }

    pub fn stores_finished_workers(&self) -> bool {
        self.finished.is_some()
    }

    /// Pending, running and failed workers.
    pub fn num_workers(&self) -> usize {
        self.pending_count() + self.running.len() + self.failed.len()
    }

    pub fn pending_count(&self) -> usize {
        self.policy.pending_count()
    }

    /// Pending workers in the order they would be admitted.
    pub fn pending_workers(&self) -> Vec<Worker> {
        self.policy.pending_workers()
    }

    pub fn running_count(&self) -> usize {
        self.running.len()
    }

    pub fn running_workers(&self) -> impl Iterator<Item = &Worker> {
        self.running.values()
    }

    pub fn failed_workers(&self) -> &[Worker] {
        &self.failed
    }

    pub fn finished_worker(&self, id: &str) -> Option<&Worker> {
        self.finished.as_ref()?.get(id)
    }

    pub fn finished_workers(&self) -> impl Iterator<Item = &Worker> {
        self.finished.iter().flat_map(|map| map.values())
    }

    fn finished_count(&self) -> usize {
        self.finished.as_ref().map_or(0, HashMap::len)
    }
}

impl fmt::Display for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "manager id={}, running#={}, finished#={}, failed#={}",
            self.id,
            self.running.len(),
            self.finished_count(),
            self.failed.len()
        )
    }
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("id", &self.id)
            .field("status", &self.status())
            .field("policy", &self.policy.name())
            .field("mode", &self.mode)
            .field("pending", &self.pending_count())
            .field("running", &self.running.len())
            .field("failed", &self.failed.len())
            .finish_non_exhaustive()
    }
}
