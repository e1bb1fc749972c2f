// src/dag/builder.rs

use std::sync::Arc;

use tracing::debug;

use crate::config::ManagerConfig;
use crate::dag::DependencyGraph;
use crate::errors::Result;
use crate::exec::{Executor, WorkerPool};
use crate::manager::{Manager, ManagerListener};
use crate::policy::TopologicalPolicy;
use crate::types::ExecutionMode;
use crate::worker::Worker;

/// Collects ordering constraints and builds a topological manager.
///
/// `build` sorts the constraints before any manager exists: a cycle means no
/// manager at all. The builder is consumed, graph included.
///
/// ```no_run
/// use foreman::{Manager, Worker};
///
/// let fetch = Worker::from_fn("fetch", |_| Ok(()));
/// let compile = Worker::from_fn("compile", |_| Ok(()));
/// let package = Worker::from_fn("package", |_| Ok(()));
///
/// let mut manager = Manager::topological()
///     .id("build")
///     .before(&fetch, &compile)
///     .after(&package, &compile)
///     .build()?;
/// manager.start()?;
/// # Ok::<(), foreman::ForemanError>(())
/// ```
#[must_use]
pub struct TopologicalBuilder {
    graph: DependencyGraph,
    config: ManagerConfig,
    listener: Option<Box<dyn ManagerListener>>,
    executor: Option<Arc<dyn Executor>>,
}

impl TopologicalBuilder {
    pub fn new() -> Self {
        Self {
            graph: DependencyGraph::new(),
            config: ManagerConfig::default(),
            listener: None,
            executor: None,
        }
    }

    /// `put` must run before `reference`.
    pub fn before(mut self, put: &Worker, reference: &Worker) -> Self {
        self.graph.add_ordering(put, reference);
        self
    }

    /// `put` must run after `reference`.
    pub fn after(mut self, put: &Worker, reference: &Worker) -> Self {
        self.graph.add_ordering(reference, put);
        self
    }

    /// Include a worker that has no ordering constraints.
    pub fn worker(mut self, worker: &Worker) -> Self {
        self.graph.node_of(worker);
        self
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.config.id = id.into();
        self
    }

    /// Replace the manager configuration. The execution mode in it is
    /// ignored; topological managers are always serial.
    pub fn config(mut self, config: ManagerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn listener(mut self, listener: impl ManagerListener + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    /// Dispatch to `executor` instead of a pool built from the config.
    pub fn executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn build(self) -> Result<Manager> {
        let order = self.graph.into_order()?;

        let mut config = self.config;
        config.execution_mode = ExecutionMode::Serial;

        let executor = match self.executor {
            Some(executor) => executor,
            None => Arc::new(WorkerPool::new(&config.id, &config.pool)?),
        };

        let mut manager =
            Manager::with_executor(config, Box::new(TopologicalPolicy::new()), executor);
        if let Some(listener) = self.listener {
            manager.listener = Some(listener);
        }

        debug!(
            manager = %manager.id(),
            order = ?order.iter().map(Worker::id).collect::<Vec<_>>(),
            "dependency order resolved"
        );
        for worker in order {
            manager.enqueue(worker)?;
        }
        Ok(manager)
    }
}

impl Default for TopologicalBuilder {
    fn default() -> Self {
        Self::new()
    }
}
