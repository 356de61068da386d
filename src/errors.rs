// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

use crate::dag::NodeState;
use crate::engine::RunStatus;

#[derive(Error, Debug)]
pub enum CorgiError {
    #[error("Missing job property: {0}")]
    MissingProperty(String),

    #[error("Invalid job property: {0}")]
    InvalidProperty(String),

    #[error("Node '{0}' cannot depend on itself")]
    SelfDependency(String),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Duplicate node: {0}")]
    DuplicateNode(String),

    #[error("Node '{node}' depends on unknown node '{dependency}'")]
    DanglingDependency { node: String, dependency: String },

    #[error("Cycle detected in graph: {}", .0.join(" -> "))]
    Cycle(Vec<String>),

    #[error("Invalid state transition for node '{node}': {from} -> {to}")]
    InvalidTransition {
        node: String,
        from: NodeState,
        to: NodeState,
    },

    #[error("Job execution failed: {}", format_failures(.0))]
    JobExecutionFailure(Vec<(String, i32)>),

    #[error("Run did not complete: {0}")]
    RunIncomplete(RunStatus),

    #[error("Scheduler stuck with unfinished nodes: {}", .0.join(", "))]
    Stuck(Vec<String>),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn format_failures(failures: &[(String, i32)]) -> String {
    failures
        .iter()
        .map(|(node, code)| format!("{node} (returncode {code})"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, CorgiError>;
