// src/dag/mod.rs

//! Job graph representation.
//!
//! - [`node`] holds a single scheduling unit and its state transitions.
//! - [`graph`] owns every node, validates the dependency relation and
//!   answers eligibility queries.

pub mod graph;
pub mod node;

pub use graph::Graph;
pub use node::{Node, NodeName, NodeState};
