// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_flow_path;
use crate::types::FailurePolicy;

/// Command-line arguments for `corgi`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "corgi",
    version,
    about = "Run dependent map/reduce jobs in dependency order.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the flow file (TOML).
    #[arg(long, short = 'f', value_name = "PATH", default_value_os_t = default_flow_path())]
    pub flow: PathBuf,

    /// Maximum number of nodes running at once (overrides `[config]`).
    #[arg(long, short = 'j', value_name = "N")]
    pub concurrency: Option<usize>,

    /// Failure policy: `fail-fast` or `best-effort` (overrides `[config]`).
    #[arg(long, value_name = "POLICY")]
    pub policy: Option<FailurePolicy>,

    /// Best-effort only: mark dependents of a failed node as failed.
    #[arg(long)]
    pub cascade_failures: bool,

    /// Working directory for job processes (overrides `[config]`).
    #[arg(long, short = 'w', value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Redirect job output to `<DIR>/<node>.<stage>.log` (overrides `[config]`).
    #[arg(long, value_name = "DIR", conflicts_with = "trace_output")]
    pub log_dir: Option<PathBuf>,

    /// Forward job output to the log at debug level instead of the terminal.
    #[arg(long)]
    pub trace_output: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CORGI_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the graph, but don't run any job.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
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
