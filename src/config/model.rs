// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::types::{ExecutionMode, PolicyKind, processor_count};

fn default_manager_id() -> String {
    "anonymous-manager".to_string()
}

fn default_store_finished() -> bool {
    true
}

fn default_keep_alive_ms() -> u64 {
    1000
}

/// Settings for a single manager.
///
/// Everything is defaulted, so an empty `[manager]` table is valid.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    pub id: String,

    /// Ignored by topological managers, which are always serial.
    pub execution_mode: ExecutionMode,

    /// Keep completed workers, looked up by id.
    pub store_finished: bool,

    pub pool: PoolConfig,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            id: default_manager_id(),
            execution_mode: ExecutionMode::default(),
            store_finished: default_store_finished(),
            pool: PoolConfig::default(),
        }
    }
}

impl ManagerConfig {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// Sizing of a manager's worker pool.
///
/// Unset sizes are derived from the processor count when the pool is built.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Default: processor count + 1.
    pub core_threads: Option<usize>,

    /// Default: 2 × processor count + 1.
    pub max_threads: Option<usize>,

    /// How long an idle extra thread is kept.
    pub keep_alive_ms: u64,

    /// Thread name prefix. Default: the manager id.
    pub thread_name: Option<String>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            core_threads: None,
            max_threads: None,
            keep_alive_ms: default_keep_alive_ms(),
            thread_name: None,
        }
    }
}

impl PoolConfig {
    pub fn core_threads(&self) -> usize {
        self.core_threads.unwrap_or_else(|| processor_count() + 1)
    }

    pub fn max_threads(&self) -> usize {
        self.max_threads
            .unwrap_or_else(|| 2 * processor_count() + 1)
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_millis(self.keep_alive_ms)
    }

    pub fn thread_name_prefix(&self, fallback: &str) -> String {
        self.thread_name
            .clone()
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// `[manager]` section of a plan file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ManagerSection {
    #[serde(default)]
    pub policy: PolicyKind,

    #[serde(flatten)]
    pub config: ManagerConfig,
}

/// `[worker.<name>]` section of a plan file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkerSpec {
    /// Shell command to execute.
    pub cmd: String,

    /// Higher runs first under the priority policy.
    #[serde(default)]
    pub priority: i32,

    /// Workers this one must run after (topological policy only).
    #[serde(default)]
    pub after: Vec<String>,

    /// Workers this one must run before (topological policy only).
    #[serde(default)]
    pub before: Vec<String>,
}

/// Unvalidated plan file exactly as deserialized from TOML.
///
/// ```toml
/// [manager]
/// id = "build"
/// policy = "topological"
///
/// [worker.fetch]
/// cmd = "curl -fsSLO https://example.com/src.tar.gz"
///
/// [worker.compile]
/// cmd = "make"
/// after = ["fetch"]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPlanFile {
    #[serde(default)]
    pub manager: ManagerSection,

    /// Keyed by worker name, which becomes the worker id.
    #[serde(default)]
    pub worker: BTreeMap<String, WorkerSpec>,
}

/// A plan file that passed validation.
///
/// Only obtainable through `TryFrom<RawPlanFile>`, so holders can rely on
/// every reference resolving.
#[derive(Debug, Clone)]
pub struct PlanFile {
    pub(crate) manager: ManagerSection,
    pub(crate) worker: BTreeMap<String, WorkerSpec>,
}

impl PlanFile {
    pub(crate) fn new_unchecked(
        manager: ManagerSection,
        worker: BTreeMap<String, WorkerSpec>,
    ) -> Self {
        Self { manager, worker }
    }

    pub fn manager(&self) -> &ManagerSection {
        &self.manager
    }

    /// Worker specs keyed by name.
    pub fn workers(&self) -> &BTreeMap<String, WorkerSpec> {
        &self.worker
    }

    pub fn policy(&self) -> PolicyKind {
        self.manager.policy
    }
}
