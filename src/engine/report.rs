// src/engine/report.rs

//! Final report of a scheduling run.

use std::fmt;

use crate::dag::{Graph, NodeName, NodeState};
use crate::engine::RunStatus;
use crate::errors::{CorgiError, Result};

/// Per-node line of a [`RunReport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeReport {
    pub name: NodeName,
    pub state: NodeState,
    pub returncode: i32,
    /// Set when the node was failed because an ancestor failed.
    pub upstream_failure: Option<NodeName>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub status: RunStatus,
    /// Every node of the graph, in name order.
    pub nodes: Vec<NodeReport>,
}

impl RunReport {
    pub fn from_graph(status: RunStatus, graph: &Graph) -> Self {
        let nodes = graph
            .nodes()
            .map(|n| NodeReport {
                name: n.name().to_string(),
                state: n.state(),
                returncode: n.returncode(),
                upstream_failure: n.upstream_failure().map(|s| s.to_string()),
            })
            .collect();
        Self { status, nodes }
    }

    pub fn node(&self, name: &str) -> Option<&NodeReport> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn state_of(&self, name: &str) -> Option<NodeState> {
        self.node(name).map(|n| n.state)
    }

    /// Every `FAILED` node with its returncode.
    pub fn failed(&self) -> Vec<(NodeName, i32)> {
        self.nodes
            .iter()
            .filter(|n| n.state == NodeState::Failed)
            .map(|n| (n.name.clone(), n.returncode))
            .collect()
    }

    pub fn count(&self, state: NodeState) -> usize {
        self.nodes.iter().filter(|n| n.state == state).count()
    }

    /// `Ok` for a complete run, otherwise an error naming every failure.
    pub fn into_result(self) -> Result<RunReport> {
        if self.status == RunStatus::Complete {
            return Ok(self);
        }
        let failed = self.failed();
        if failed.is_empty() {
            Err(CorgiError::RunIncomplete(self.status))
        } else {
            Err(CorgiError::JobExecutionFailure(failed))
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "run {}: {} done, {} failed, {} blocked, {} total",
            self.status,
            self.count(NodeState::Done),
            self.count(NodeState::Failed),
            self.count(NodeState::Blocked) + self.count(NodeState::Runnable),
            self.nodes.len()
        )?;
        for node in &self.nodes {
            write!(f, "  {:<8} {}", node.state.to_string(), node.name)?;
            if node.state == NodeState::Failed {
                match &node.upstream_failure {
                    Some(upstream) => write!(f, " (upstream {upstream} failed)")?,
                    None => write!(f, " (returncode {})", node.returncode)?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
