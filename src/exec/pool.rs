// src/exec/pool.rs

//! Thread pool backing the [`Executor`] trait in production.
//!
//! A `WorkerPool` owns a dedicated multi-threaded tokio runtime. Jobs are
//! plain blocking closures, so they go through `spawn_blocking`; the
//! runtime's blocking pool provides the "core size / max size / keep-alive /
//! unbounded queue" shape a worker pool needs.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info};

use crate::config::PoolConfig;
use crate::errors::{ForemanError, Result};
use crate::exec::{Executor, Job};

const DEFAULT_POOL_NAME: &str = "foreman-default";

static DEFAULT_POOL: OnceLock<WorkerPool> = OnceLock::new();

/// Bounded pool of threads executing submitted jobs.
pub struct WorkerPool {
    name: String,
    /// `None` only while dropping.
    runtime: Option<Runtime>,
    closed: AtomicBool,
    in_flight: Arc<AtomicUsize>,
}

impl WorkerPool {
    /// Build a pool from `config`. Threads are named after `name` unless the
    /// config overrides the prefix.
    pub fn new(name: &str, config: &PoolConfig) -> Result<Self> {
        let core = config.core_threads();
        let max = config.max_threads();
        if core == 0 || max == 0 {
            return Err(ForemanError::PoolError(format!(
                "pool '{name}' needs at least one thread (core={core}, max={max})"
            )));
        }
        if max < core {
            return Err(ForemanError::PoolError(format!(
                "pool '{name}': max_threads ({max}) must be >= core_threads ({core})"
            )));
        }

        let prefix = config.thread_name_prefix(name);
        let counter = AtomicUsize::new(0);

        let runtime = Builder::new_multi_thread()
            .worker_threads(core)
            .max_blocking_threads(max)
            .thread_keep_alive(config.keep_alive())
            .thread_name_fn(move || {
                let n = counter.fetch_add(1, Ordering::Relaxed);
                format!("{prefix}-worker-{n}")
            })
            .enable_all()
            .build()?;

        info!(pool = %name, core, max, "worker pool started");

        Ok(Self {
            name: name.to_string(),
            runtime: Some(runtime),
            closed: AtomicBool::new(false),
            in_flight: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Jobs submitted but not yet finished.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Refuse further submissions. Jobs already submitted keep running.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(pool = %self.name, "worker pool closed for new submissions");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Executor for WorkerPool {
    fn submit(&self, job: Job) -> anyhow::Result<()> {
        let runtime = match &self.runtime {
            Some(rt) if !self.is_closed() => rt,
            _ => anyhow::bail!("worker pool '{}' is shut down", self.name),
        };

        self.in_flight.fetch_add(1, Ordering::AcqRel);
        let guard = InFlight(Arc::clone(&self.in_flight));
        runtime.spawn_blocking(move || {
            let _guard = guard;
            job();
        });
        Ok(())
    }
}

/// Decrements the in-flight count even if the job panics.
struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("name", &self.name)
            .field("closed", &self.is_closed())
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.close();
        if let Some(runtime) = self.runtime.take() {
            // Does not wait for running jobs, so it is fine inside async code.
            runtime.shutdown_background();
        }
    }
}

/// Process-wide pool for workers processed outside any manager.
///
/// Created on first use and never torn down.
pub fn default_pool() -> Result<&'static WorkerPool> {
    if let Some(pool) = DEFAULT_POOL.get() {
        return Ok(pool);
    }
    let pool = WorkerPool::new(DEFAULT_POOL_NAME, &PoolConfig::default())?;
    // If another thread won the race, our pool is dropped here.
    Ok(DEFAULT_POOL.get_or_init(|| pool))
}
