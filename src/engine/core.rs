// src/engine/core.rs

//! Pure core scheduler state machine.
//!
//! [`SchedulerCore`] owns the committed graph and decides, for every event,
//! which nodes to dispatch next and whether the run is over. It has no
//! channels, no Tokio types and does not perform any IO, so the whole
//! scheduling semantics can be exercised synchronously in tests.
//!
//! The async shell (`engine::runtime::Scheduler`) feeds it completions and
//! executes the dispatches it returns.

use std::collections::{BTreeSet, HashSet};

use tracing::{debug, error, info, warn};

use crate::dag::{Graph, NodeName, NodeState};
use crate::engine::report::RunReport;
use crate::engine::{JobOutcome, RunStatus, ScheduledNode, SchedulerOptions};
use crate::errors::{CorgiError, Result};
use crate::types::FailurePolicy;

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone, Default)]
pub struct CoreStep {
    /// Nodes that were marked `RUNNING` and must be handed to the executor.
    pub dispatch: Vec<ScheduledNode>,
    /// Whether the run reached a terminal status with this step.
    pub finished: bool,
}

#[derive(Debug)]
pub struct SchedulerCore {
    graph: Graph,
    options: SchedulerOptions,
    status: RunStatus,
    running: BTreeSet<NodeName>,
    busy_resources: HashSet<String>,
    /// Order in which nodes were dispatched, for diagnostics and tests.
    dispatch_log: Vec<NodeName>,
}

impl SchedulerCore {
    /// Commit `graph` and prepare a run over it.
    ///
    /// Validation errors (dangling dependencies, cycles) surface here, before
    /// anything can be dispatched.
    pub fn new(mut graph: Graph, options: SchedulerOptions) -> Result<Self> {
        if options.concurrency == 0 {
            return Err(CorgiError::ConfigError(
                "concurrency must be >= 1 (got 0)".to_string(),
            ));
        }
        graph.commit()?;

        Ok(Self {
            graph,
            options,
            status: RunStatus::Pending,
            running: BTreeSet::new(),
            busy_resources: HashSet::new(),
            dispatch_log: Vec::new(),
        })
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn options(&self) -> &SchedulerOptions {
        &self.options
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Names of nodes currently handed to the executor.
    pub fn running(&self) -> impl Iterator<Item = &str> {
        self.running.iter().map(|s| s.as_str())
    }

    pub fn dispatch_log(&self) -> &[NodeName] {
        &self.dispatch_log
    }

    /// Dispatch the initial set of eligible nodes.
    pub fn start(&mut self) -> Result<CoreStep> {
        if self.status != RunStatus::Pending {
            warn!(status = %self.status, "start called on a run that already started");
            return Ok(CoreStep {
                dispatch: Vec::new(),
                finished: self.status.is_terminal(),
            });
        }

        info!(
            nodes = self.graph.len(),
            concurrency = self.options.concurrency,
            policy = %self.options.policy,
            "starting scheduling run"
        );

        let dispatch = self.dispatch_ready()?;
        let finished = self.check_finished()?;
        Ok(CoreStep { dispatch, finished })
    }

    /// Record the outcome of a node's job and dispatch whatever became ready.
    pub fn on_finished(&mut self, node: &str, outcome: JobOutcome) -> Result<CoreStep> {
        let current = self.graph.node(node)?;
        if !self.running.contains(node) || current.state() != NodeState::Running {
            error!(node = %node, state = %current.state(), "completion for a node that is not running");
            return Err(CorgiError::InvalidTransition {
                node: node.to_string(),
                from: current.state(),
                to: if outcome.is_success() {
                    NodeState::Done
                } else {
                    NodeState::Failed
                },
            });
        }
        let resource = current.resource().to_string();

        self.running.remove(node);
        if !resource.is_empty() {
            self.busy_resources.remove(&resource);
        }

        match outcome {
            JobOutcome::Success => {
                self.graph.mark_done(node, 0)?;
                info!(node = %node, "node done");
            }
            JobOutcome::Failed(code) => {
                self.graph.mark_failed(node, code)?;
                warn!(node = %node, returncode = code, "node failed");
            }
        }
        self.graph.on_node_finished(node)?;

        if !outcome.is_success() {
            self.apply_failure_policy(node)?;
        }

        let dispatch = self.dispatch_ready()?;
        let finished = self.check_finished()?;
        Ok(CoreStep { dispatch, finished })
    }

    /// Stop dispatching; in-flight nodes are left to finish.
    pub fn request_abort(&mut self) -> Result<CoreStep> {
        if !self.status.is_terminal() {
            warn!(
                running = ?self.running,
                "abort requested; no new nodes will be dispatched"
            );
            self.status = RunStatus::Aborted;
        }
        let finished = self.check_finished()?;
        Ok(CoreStep {
            dispatch: Vec::new(),
            finished,
        })
    }

    /// Whether the run has reached a terminal status.
    pub fn is_finished(&self) -> bool {
        self.running.is_empty() && self.status.is_terminal()
    }

    pub fn report(&self) -> RunReport {
        RunReport::from_graph(self.status, &self.graph)
    }

    fn apply_failure_policy(&mut self, failed: &str) -> Result<()> {
        match self.options.policy {
            FailurePolicy::FailFast => {
                if self.status != RunStatus::Aborted {
                    warn!(
                        node = %failed,
                        in_flight = ?self.running,
                        "fail-fast: aborting run, draining in-flight nodes"
                    );
                    self.status = RunStatus::Aborted;
                }
            }
            FailurePolicy::BestEffort => {
                if self.options.cascade_failures {
                    self.graph.cascade_failure(failed)?;
                } else {
                    debug!(node = %failed, "best-effort: dependents stay BLOCKED");
                }
            }
        }
        Ok(())
    }

    /// Mark eligible nodes `RUNNING` while capacity and resources allow.
    fn dispatch_ready(&mut self) -> Result<Vec<ScheduledNode>> {
        if self.status == RunStatus::Aborted {
            return Ok(Vec::new());
        }

        let mut dispatch = Vec::new();

        for name in self.graph.eligible_nodes() {
            if self.running.len() >= self.options.concurrency {
                debug!(running = self.running.len(), "concurrency limit reached");
                break;
            }

            let node = self.graph.node(&name)?;
            let resource = node.resource().to_string();
            if !resource.is_empty() && self.busy_resources.contains(&resource) {
                debug!(node = %name, resource = %resource, "resource busy; deferring node");
                continue;
            }
            let scheduled = ScheduledNode {
                name: name.clone(),
                resource: resource.clone(),
                job: node.job().cloned(),
            };

            self.graph.mark_running(&name)?;
            if !resource.is_empty() {
                self.busy_resources.insert(resource);
            }
            self.running.insert(name.clone());
            self.dispatch_log.push(name.clone());
            info!(node = %name, "dispatching node");
            dispatch.push(scheduled);
        }

        if !dispatch.is_empty() && self.status == RunStatus::Pending {
            self.status = RunStatus::Running;
        }

        Ok(dispatch)
    }

    /// Decide whether the run is over, and with which status.
    ///
    /// Must be called right after `dispatch_ready`: with nothing running and
    /// nothing dispatchable, every unfinished node has to be downstream of a
    /// failure, otherwise the graph state is inconsistent.
    fn check_finished(&mut self) -> Result<bool> {
        if !self.running.is_empty() {
            return Ok(false);
        }
        if self.status == RunStatus::Aborted {
            info!("run aborted; no node in flight");
            return Ok(true);
        }
        if self.status.is_terminal() {
            return Ok(true);
        }

        let doomed = self.graph.permanently_blocked();
        let stuck: Vec<NodeName> = self
            .graph
            .unfinished()
            .into_iter()
            .filter(|name| !doomed.contains(name))
            .collect();
        if !stuck.is_empty() {
            error!(nodes = ?stuck, "no node running or eligible, but run is not finished");
            return Err(CorgiError::Stuck(stuck));
        }

        let all_done = self
            .graph
            .nodes()
            .all(|n| n.state() == NodeState::Done);
        self.status = if all_done {
            RunStatus::Complete
        } else {
            RunStatus::Partial
        };
        info!(status = %self.status, "run finished");
        Ok(true)
    }
}
