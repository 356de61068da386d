// src/dag/graph.rs

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::{debug, info, warn};

use crate::dag::node::{Node, NodeName, NodeState};
use crate::errors::{CorgiError, Result};

/// DFS colouring used by cycle detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Owns every node of a flow, keyed by name.
///
/// Nodes reference each other by name only. After [`Graph::commit`] the graph
/// also keeps the reverse adjacency (dependents) so completions can be
/// propagated without scanning every node.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: BTreeMap<NodeName, Node>,
    dependents: HashMap<NodeName, Vec<NodeName>>,
    committed: bool,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: Node) -> Result<()> {
        if self.nodes.contains_key(node.name()) {
            return Err(CorgiError::DuplicateNode(node.name().to_string()));
        }
        debug!(node = %node.name(), deps = ?node.depends(), "adding node to graph");
        self.nodes.insert(node.name().to_string(), node);
        self.committed = false;
        Ok(())
    }

    /// Validate the graph and compute every node's initial state.
    ///
    /// Checks, in order:
    /// - every dependency names an existing node
    /// - the dependency relation has no cycle
    ///
    /// Calling it again on an unchanged graph is a no-op apart from
    /// re-deriving `Blocked`/`Runnable` for nodes that have not started.
    pub fn commit(&mut self) -> Result<()> {
        self.check_dangling()?;
        self.check_cycles()?;

        let mut dependents: HashMap<NodeName, Vec<NodeName>> = self
            .nodes
            .keys()
            .map(|name| (name.clone(), Vec::new()))
            .collect();
        for node in self.nodes.values() {
            for dep in node.depends() {
                if let Some(list) = dependents.get_mut(dep) {
                    if !list.iter().any(|n| n == node.name()) {
                        list.push(node.name().to_string());
                    }
                }
            }
        }
        self.dependents = dependents;

        // Decide first, then mutate.
        let initial: Vec<(NodeName, bool)> = self
            .nodes
            .values()
            .map(|node| (node.name().to_string(), self.deps_done(node)))
            .collect();
        for (name, deps_done) in initial {
            if let Some(node) = self.nodes.get_mut(&name) {
                node.reset_initial_state(deps_done);
            }
        }

        if !self.committed {
            info!(nodes = self.nodes.len(), "graph committed");
        }
        self.committed = true;
        Ok(())
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Names of every node that may be dispatched right now.
    ///
    /// `Blocked` nodes whose dependencies are all `Done` are promoted to
    /// `Runnable` first. Calling this twice without an intervening state
    /// change returns the same names.
    pub fn eligible_nodes(&mut self) -> Vec<NodeName> {
        let promotable: Vec<NodeName> = self
            .nodes
            .values()
            .filter(|node| node.state() == NodeState::Blocked && self.deps_done(node))
            .map(|node| node.name().to_string())
            .collect();

        for name in promotable {
            if let Some(node) = self.nodes.get_mut(&name) {
                if node.promote().is_ok() {
                    debug!(node = %name, "dependencies done; node promoted to RUNNABLE");
                }
            }
        }

        self.nodes
            .values()
            .filter(|node| node.state() == NodeState::Runnable)
            .map(|node| node.name().to_string())
            .collect()
    }

    /// React to a node reaching a terminal state.
    ///
    /// For a `Done` node, returns the dependents that became eligible as a
    /// result. Dependents of a `Failed` node stay `Blocked`; see
    /// [`Graph::cascade_failure`] for the alternative.
    pub fn on_node_finished(&mut self, name: &str) -> Result<Vec<NodeName>> {
        let state = self.node(name)?.state();
        match state {
            NodeState::Done => {
                let candidates: Vec<NodeName> = self
                    .dependents_of(name)
                    .iter()
                    .filter(|dep| {
                        self.nodes.get(dep.as_str()).is_some_and(|n| {
                            n.state() == NodeState::Blocked && self.deps_done(n)
                        })
                    })
                    .cloned()
                    .collect();

                for dep in &candidates {
                    if let Some(node) = self.nodes.get_mut(dep) {
                        node.promote()?;
                    }
                }
                debug!(node = %name, newly_eligible = ?candidates, "node done");
                Ok(candidates)
            }
            NodeState::Failed => {
                debug!(
                    node = %name,
                    dependents = ?self.dependents_of(name),
                    "node failed; dependents stay BLOCKED"
                );
                Ok(Vec::new())
            }
            other => {
                warn!(node = %name, state = %other, "on_node_finished called for unfinished node");
                Ok(Vec::new())
            }
        }
    }

    /// Mark every not-yet-started transitive dependent of `failed` as
    /// `Failed`, recording `failed` as the upstream cause.
    ///
    /// Returns the names of the nodes that were newly failed.
    pub fn cascade_failure(&mut self, failed: &str) -> Result<Vec<NodeName>> {
        let mut stack: Vec<NodeName> = self.dependents_of(failed).to_vec();
        let mut visited: HashSet<NodeName> = HashSet::new();
        let mut newly_failed = Vec::new();

        while let Some(name) = stack.pop() {
            if !visited.insert(name.clone()) {
                continue;
            }
            let Some(node) = self.nodes.get_mut(&name) else {
                continue;
            };
            if matches!(node.state(), NodeState::Blocked | NodeState::Runnable) {
                node.fail_from_upstream(failed)?;
                newly_failed.push(name.clone());
            }
            stack.extend(self.dependents_of(&name).iter().cloned());
        }

        if !newly_failed.is_empty() {
            warn!(node = %failed, cascaded = ?newly_failed, "failure cascaded to dependents");
        }
        Ok(newly_failed)
    }

    pub fn mark_running(&mut self, name: &str) -> Result<()> {
        self.node_mut(name)?.mark_running()
    }

    pub fn mark_done(&mut self, name: &str, code: i32) -> Result<()> {
        self.node_mut(name)?.mark_done(code)
    }

    pub fn mark_failed(&mut self, name: &str, code: i32) -> Result<()> {
        self.node_mut(name)?.mark_failed(code)
    }

    /// Node names in dependency order (dependencies first).
    pub fn topological_order(&self) -> Result<Vec<NodeName>> {
        // Edge direction: dependency -> dependent.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for name in self.nodes.keys() {
            graph.add_node(name.as_str());
        }
        for node in self.nodes.values() {
            for dep in node.depends() {
                graph.add_edge(dep.as_str(), node.name(), ());
            }
        }

        match toposort(&graph, None) {
            Ok(order) => Ok(order.into_iter().map(|s| s.to_string()).collect()),
            Err(cycle) => Err(CorgiError::Cycle(vec![cycle.node_id().to_string()])),
        }
    }

    pub fn node(&self, name: &str) -> Result<&Node> {
        self.nodes
            .get(name)
            .ok_or_else(|| CorgiError::NodeNotFound(name.to_string()))
    }

    pub(crate) fn node_mut(&mut self, name: &str) -> Result<&mut Node> {
        self.nodes
            .get_mut(name)
            .ok_or_else(|| CorgiError::NodeNotFound(name.to_string()))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn state_of(&self, name: &str) -> Option<NodeState> {
        self.nodes.get(name).map(|n| n.state())
    }

    /// Snapshot of every node's state.
    pub fn states(&self) -> BTreeMap<NodeName, NodeState> {
        self.nodes
            .iter()
            .map(|(name, node)| (name.clone(), node.state()))
            .collect()
    }

    /// Immediate dependencies of a node.
    pub fn dependencies_of(&self, name: &str) -> &[NodeName] {
        self.nodes
            .get(name)
            .map(|n| n.depends())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a node. Empty until the graph is committed.
    pub fn dependents_of(&self, name: &str) -> &[NodeName] {
        self.dependents
            .get(name)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn all_terminal(&self) -> bool {
        self.nodes.values().all(|n| n.state().is_terminal())
    }

    /// Nodes that are neither `Done` nor `Failed`.
    pub fn unfinished(&self) -> Vec<NodeName> {
        self.nodes
            .values()
            .filter(|n| !n.state().is_terminal())
            .map(|n| n.name().to_string())
            .collect()
    }

    /// Non-terminal nodes that can never run because some ancestor failed.
    pub fn permanently_blocked(&self) -> BTreeSet<NodeName> {
        let mut blocked = BTreeSet::new();
        let mut stack: Vec<&str> = self
            .nodes
            .values()
            .filter(|n| n.state() == NodeState::Failed)
            .map(|n| n.name())
            .collect();

        while let Some(name) = stack.pop() {
            for dep in self.dependents_of(name) {
                let Some(node) = self.nodes.get(dep) else {
                    continue;
                };
                if !node.state().is_terminal() && blocked.insert(dep.clone()) {
                    stack.push(dep.as_str());
                }
            }
        }

        blocked
    }

    fn deps_done(&self, node: &Node) -> bool {
        node.depends().iter().all(|dep| {
            self.nodes
                .get(dep)
                .is_some_and(|d| d.state() == NodeState::Done)
        })
    }

    fn check_dangling(&self) -> Result<()> {
        for node in self.nodes.values() {
            for dep in node.depends() {
                if dep == node.name() {
                    return Err(CorgiError::SelfDependency(dep.clone()));
                }
                if !self.nodes.contains_key(dep) {
                    return Err(CorgiError::DanglingDependency {
                        node: node.name().to_string(),
                        dependency: dep.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn check_cycles(&self) -> Result<()> {
        let mut marks: HashMap<&str, Mark> = self
            .nodes
            .keys()
            .map(|name| (name.as_str(), Mark::Unvisited))
            .collect();
        let mut path: Vec<&str> = Vec::new();

        for name in self.nodes.keys() {
            if marks.get(name.as_str()) == Some(&Mark::Unvisited) {
                self.visit(name, &mut marks, &mut path)?;
            }
        }
        Ok(())
    }

    /// Depth-first walk along dependency edges, starting at `root`.
    ///
    /// Frames are `(node, index of the next dependency to look at)`, so the
    /// walk depth is bounded by the heap, not the call stack. `path` holds the
    /// chain of in-progress nodes, so a back edge to one of them yields the
    /// cycle members directly.
    fn visit<'a>(
        &'a self,
        root: &'a str,
        marks: &mut HashMap<&'a str, Mark>,
        path: &mut Vec<&'a str>,
    ) -> Result<()> {
        let mut stack: Vec<(&'a str, usize)> = vec![(root, 0)];
        marks.insert(root, Mark::InProgress);
        path.push(root);

        while let Some(frame) = stack.last_mut() {
            let (name, next) = *frame;
            let Some(dep) = self.dependencies_of(name).get(next) else {
                stack.pop();
                path.pop();
                marks.insert(name, Mark::Done);
                continue;
            };
            frame.1 += 1;

            match marks.get(dep.as_str()).copied().unwrap_or(Mark::Done) {
                Mark::Unvisited => {
                    marks.insert(dep.as_str(), Mark::InProgress);
                    path.push(dep.as_str());
                    stack.push((dep.as_str(), 0));
                }
                Mark::InProgress => {
                    let start = path.iter().position(|n| *n == dep.as_str()).unwrap_or(0);
                    let members: Vec<String> =
                        path[start..].iter().map(|s| s.to_string()).collect();
                    warn!(cycle = ?members, "cycle detected in graph");
                    return Err(CorgiError::Cycle(members));
                }
                Mark::Done => {}
            }
        }

        Ok(())
    }
}
