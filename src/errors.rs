// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForemanError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Raised only while building a topological manager.
    #[error("Cycle detected in worker dependencies: {0}")]
    DependencyCycle(String),

    /// A running worker was asked to stop but its work routine cannot be
    /// cancelled mid-flight.
    #[error("stop() is not supported by worker '{worker}'")]
    StopUnsupported { worker: String },

    #[error("executor rejected worker '{worker}': {reason}")]
    ExecutorRejected { worker: String, reason: String },

    #[error("Worker pool error: {0}")]
    PoolError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Marker returned by [`crate::worker::Work::stop`] for routines that cannot
/// be cancelled.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("operation not supported")]
pub struct Unsupported;

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ForemanError>;
