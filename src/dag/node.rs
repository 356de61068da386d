// src/dag/node.rs

//! A single scheduling unit and its lifecycle.

use std::fmt;

use tracing::trace;

use crate::errors::{CorgiError, Result};
use crate::job::JobSpec;

/// Canonical node name type used throughout the crate.
pub type NodeName = String;

/// Lifecycle state of a node within one scheduling run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeState {
    /// Every dependency is done; waiting to be dispatched.
    Runnable,
    /// At least one dependency has not finished successfully.
    Blocked,
    /// Dispatched to the executor.
    Running,
    Done,
    Failed,
}

impl NodeState {
    pub fn is_terminal(self) -> bool {
        matches!(self, NodeState::Done | NodeState::Failed)
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeState::Runnable => "RUNNABLE",
            NodeState::Blocked => "BLOCKED",
            NodeState::Running => "RUNNING",
            NodeState::Done => "DONE",
            NodeState::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// A node in the job graph.
///
/// Dependencies are stored by name only; the owning [`Graph`](super::Graph)
/// resolves them. State and returncode change exclusively through the
/// `mark_*` transitions.
#[derive(Debug, Clone)]
pub struct Node {
    name: NodeName,
    resource: String,
    depends: Vec<NodeName>,
    job: Option<JobSpec>,
    state: NodeState,
    returncode: i32,
    upstream_failure: Option<NodeName>,
}

impl Node {
    /// Create a placeholder node with no job and no dependencies.
    pub fn new(name: impl Into<NodeName>) -> Self {
        Self {
            name: name.into(),
            resource: String::new(),
            depends: Vec::new(),
            job: None,
            state: NodeState::Runnable,
            returncode: 0,
            upstream_failure: None,
        }
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = resource.into();
        self
    }

    pub fn with_job(mut self, job: JobSpec) -> Self {
        self.job = Some(job);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resource-pool tag; empty when the node is untagged.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn depends(&self) -> &[NodeName] {
        &self.depends
    }

    pub fn job(&self) -> Option<&JobSpec> {
        self.job.as_ref()
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    /// Exit status of the last execution attempt, 0 until run.
    pub fn returncode(&self) -> i32 {
        self.returncode
    }

    /// Name of the failed ancestor when this node was failed by cascade.
    pub fn upstream_failure(&self) -> Option<&str> {
        self.upstream_failure.as_deref()
    }

    /// Declare that this node must wait for `node_name`.
    ///
    /// Existence and acyclicity are checked by `Graph::commit`.
    pub fn add_dependency(&mut self, node_name: impl Into<NodeName>) -> Result<&mut Self> {
        let node_name = node_name.into();
        if node_name == self.name {
            return Err(CorgiError::SelfDependency(node_name));
        }
        self.depends.push(node_name);
        if self.state == NodeState::Runnable {
            self.state = NodeState::Blocked;
        }
        Ok(self)
    }

    pub fn mark_running(&mut self) -> Result<()> {
        self.transition(NodeState::Runnable, NodeState::Running)
    }

    pub fn mark_done(&mut self, code: i32) -> Result<()> {
        self.transition(NodeState::Running, NodeState::Done)?;
        self.returncode = code;
        Ok(())
    }

    pub fn mark_failed(&mut self, code: i32) -> Result<()> {
        self.transition(NodeState::Running, NodeState::Failed)?;
        self.returncode = code;
        Ok(())
    }

    /// Set the state computed at commit time (`Blocked` or `Runnable`).
    ///
    /// Nodes that are running or terminal keep their state.
    pub(crate) fn reset_initial_state(&mut self, deps_done: bool) {
        if self.state == NodeState::Running || self.state.is_terminal() {
            return;
        }
        self.state = if deps_done {
            NodeState::Runnable
        } else {
            NodeState::Blocked
        };
    }

    /// `Blocked -> Runnable` once every dependency is done.
    pub(crate) fn promote(&mut self) -> Result<()> {
        self.transition(NodeState::Blocked, NodeState::Runnable)
    }

    /// Fail a node that never ran because `upstream` failed.
    pub(crate) fn fail_from_upstream(&mut self, upstream: &str) -> Result<()> {
        match self.state {
            NodeState::Blocked | NodeState::Runnable => {
                trace!(node = %self.name, upstream = %upstream, "failing node from upstream");
                self.state = NodeState::Failed;
                self.upstream_failure = Some(upstream.to_string());
                Ok(())
            }
            from => Err(CorgiError::InvalidTransition {
                node: self.name.clone(),
                from,
                to: NodeState::Failed,
            }),
        }
    }

    fn transition(&mut self, expected: NodeState, to: NodeState) -> Result<()> {
        if self.state != expected {
            return Err(CorgiError::InvalidTransition {
                node: self.name.clone(),
                from: self.state,
                to,
            });
        }
        trace!(node = %self.name, from = %self.state, to = %to, "node state transition");
        self.state = to;
        Ok(())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(job) = &self.job {
            write!(f, " mapper:{} reducer:{}", job.mapper(), job.reducer())?;
        }
        Ok(())
    }
}
