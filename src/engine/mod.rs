// src/engine/mod.rs

//! Scheduling engine.
//!
//! This module ties together:
//! - the committed job [`Graph`](crate::dag::Graph)
//! - the concurrency cap and resource-tag serialisation
//! - the failure policy (fail-fast / best-effort)
//! - the event loop that reacts to node completions and shutdown requests
//!
//! The pure core state machine lives in [`core`]; the async/IO shell that
//! hands nodes to an [`Executor`](crate::exec::Executor) is implemented in
//! [`runtime`].

use std::fmt;

use crate::dag::NodeName;
use crate::job::JobSpec;
use crate::types::FailurePolicy;

/// Outcome of running one node's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Success,
    Failed(i32),
}

impl JobOutcome {
    pub fn from_code(code: i32) -> Self {
        if code == 0 {
            JobOutcome::Success
        } else {
            JobOutcome::Failed(code)
        }
    }

    /// Returncode recorded on the node.
    pub fn code(self) -> i32 {
        match self {
            JobOutcome::Success => 0,
            JobOutcome::Failed(code) => code,
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, JobOutcome::Success)
    }
}

/// Overall state of a scheduling run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Graph committed, nothing started yet.
    Pending,
    /// At least one node has been dispatched.
    Running,
    /// Every node finished successfully.
    Complete,
    /// A failure (fail-fast) or a shutdown request stopped dispatching.
    Aborted,
    /// Best-effort run ended with some nodes failed or permanently blocked.
    Partial,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunStatus::Complete | RunStatus::Aborted | RunStatus::Partial
        )
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Pending => "PENDING",
            RunStatus::Running => "RUNNING",
            RunStatus::Complete => "COMPLETE",
            RunStatus::Aborted => "ABORTED",
            RunStatus::Partial => "PARTIAL",
        };
        f.write_str(s)
    }
}

/// Knobs of a scheduling run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerOptions {
    /// Maximum number of nodes running at the same time (>= 1).
    pub concurrency: usize,
    pub policy: FailurePolicy,
    /// Best-effort only: mark dependents of a failed node `FAILED` instead of
    /// leaving them `BLOCKED`.
    pub cascade_failures: bool,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            policy: FailurePolicy::default(),
            cascade_failures: false,
        }
    }
}

/// A node the core wants the executor to run now.
#[derive(Debug, Clone)]
pub struct ScheduledNode {
    pub name: NodeName,
    pub resource: String,
    /// `None` for placeholder nodes, which complete without running anything.
    pub job: Option<JobSpec>,
}

/// Events flowing into the scheduler loop from workers and signal handlers.
#[derive(Debug, Clone)]
pub enum RunEvent {
    /// A worker finished running a node's job.
    NodeFinished { node: NodeName, outcome: JobOutcome },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod report;
pub mod runtime;

pub use self::core::{CoreStep, SchedulerCore};
pub use self::report::{NodeReport, RunReport};
pub use self::runtime::Scheduler;
