// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod manager;
pub mod policy;
pub mod signal;
pub mod types;
pub mod worker;

pub use config::{ManagerConfig, PoolConfig};
pub use dag::TopologicalBuilder;
pub use errors::{ForemanError, Result};
pub use exec::{Executor, ShellWork, WorkerPool};
pub use manager::{ErrorCode, ErrorInfo, LogListener, Manager, ManagerListener, Status};
pub use policy::{OrderingPolicy, PriorityPolicy, TopologicalPolicy};
pub use types::{ExecutionMode, NotifyMode, PolicyKind};
pub use worker::{ChainWork, FnWork, Notifier, Work, Worker, WorkerStatus, work_fn};

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::{PlanFile, load_and_validate};

/// High-level entry point used by `main.rs`.
///
/// Loads and validates the plan, builds the manager, runs it until it
/// settles (or Ctrl-C stops it) and prints a summary. Returns `Ok(false)` if
/// any worker failed.
pub async fn run(args: CliArgs) -> anyhow::Result<bool> {
    let plan = load_and_validate(&args.plan)?;
    let mut manager = build_manager(&plan)?;

    if args.dry_run {
        print_dry_run(&plan, &manager);
        return Ok(true);
    }

    manager.set_listener(LogListener);
    manager.start()?;

    let interrupted = tokio::select! {
        _ = manager.run_until_settled() => false,
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                warn!(error = %e, "failed to listen for Ctrl+C");
            }
            true
        }
    };

    if interrupted {
        info!(manager = %manager.id(), "interrupted; stopping manager");
        manager.stop()?;
    }

    print_summary(&manager);
    Ok(manager.failed_workers().is_empty() && !interrupted)
}

/// Build a manager for `plan`, with one [`ShellWork`] worker per entry.
///
/// Workers are enqueued but the manager is not started.
pub fn build_manager(plan: &PlanFile) -> Result<Manager> {
    let workers: BTreeMap<&str, Worker> = plan
        .worker
        .iter()
        .map(|(name, spec)| {
            let worker = Worker::builder(ShellWork::new(&spec.cmd))
                .id(name.as_str())
                .priority(spec.priority)
                .build();
            (name.as_str(), worker)
        })
        .collect();

    let config = plan.manager.config.clone();
    match plan.policy() {
        PolicyKind::Priority => {
            let mut manager = Manager::priority(config)?;
            for worker in workers.values() {
                manager.enqueue(worker.clone())?;
            }
            Ok(manager)
        }
        PolicyKind::Topological => {
            let lookup = |name: &str| {
                workers.get(name).ok_or_else(|| {
                    ForemanError::ConfigError(format!("plan references unknown worker '{name}'"))
                })
            };

            let mut builder = Manager::topological().config(config);
            for (name, spec) in &plan.worker {
                let this = lookup(name.as_str())?;
                builder = builder.worker(this);
                for other in &spec.after {
                    builder = builder.after(this, lookup(other.as_str())?);
                }
                for other in &spec.before {
                    builder = builder.before(this, lookup(other.as_str())?);
                }
            }
            builder.build()
        }
    }
}

/// Print the plan and the order workers would be taken in.
fn print_dry_run(plan: &PlanFile, manager: &Manager) {
    let cfg = &plan.manager.config;
    println!("foreman dry-run");
    println!("  manager.id = {}", cfg.id);
    println!("  manager.policy = {:?}", plan.policy());
    println!("  manager.execution_mode = {:?}", manager.execution_mode());
    println!("  manager.max_concurrent = {}", manager.max_concurrent());
    println!();

    println!("workers ({}):", plan.worker.len());
    for (name, spec) in &plan.worker {
        println!("  - {name}");
        println!("      cmd: {}", spec.cmd);
        if spec.priority != 0 {
            println!("      priority: {}", spec.priority);
        }
        if !spec.after.is_empty() {
            println!("      after: {:?}", spec.after);
        }
        if !spec.before.is_empty() {
            println!("      before: {:?}", spec.before);
        }
    }

    println!();
    println!("order:");
    for (i, worker) in manager.pending_workers().iter().enumerate() {
        println!("  {}. {}", i + 1, worker.id());
    }
}

fn print_summary(manager: &Manager) {
    let info = manager.status_info();
    println!(
        "{}: {}/{} workers completed, status {}",
        manager.id(),
        info.num_complete,
        info.num_total,
        manager.status()
    );
    for error in info.errors() {
        println!("  {}", error.message);
    }
}
