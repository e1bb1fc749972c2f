// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_plan_path;

/// Command-line arguments for `foreman`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "foreman",
    version,
    about = "Run a plan of shell commands through a priority or topological worker manager.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the plan file (TOML).
    ///
    /// Default: `Foreman.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value_os_t = default_plan_path())]
    pub plan: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `FOREMAN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the plan and its order, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
