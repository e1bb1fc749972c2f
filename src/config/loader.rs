// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{PlanFile, RawPlanFile};
use crate::errors::Result;

/// Load a plan file from a given path and return the raw `RawPlanFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawPlanFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    parse_str(&contents)
}

/// Deserialize a plan from TOML text.
pub fn parse_str(contents: &str) -> Result<RawPlanFile> {
    Ok(toml::from_str(contents)?)
}

/// Load a plan file from path and run validation.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks worker references and pool sizing.
///
/// Dependency cycles are only detected when the manager is built.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<PlanFile> {
    let raw = load_from_path(path)?;
    PlanFile::try_from(raw)
}

/// `Foreman.toml` in the current working directory.
pub fn default_plan_path() -> PathBuf {
    PathBuf::from("Foreman.toml")
}
