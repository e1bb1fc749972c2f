// src/config/mod.rs

//! Configuration for managers, pools and plan files.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a plan file from disk (`loader.rs`).
//! - Validate references and pool sizing (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_plan_path, load_and_validate, load_from_path};
pub use model::{ManagerConfig, ManagerSection, PlanFile, PoolConfig, RawPlanFile, WorkerSpec};
pub use validate::validate_raw_plan;
