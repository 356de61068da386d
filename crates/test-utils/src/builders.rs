#![allow(dead_code)]

use corgi::dag::{Graph, Node};
use corgi::job::{
    JobSpec, RawJobSpec, PROP_INPUT_DIR, PROP_JOB_NAME, PROP_MAPPER, PROP_OUTPUT_DIR,
    PROP_REDUCER,
};

/// Builder for job property bags, pre-filled with all required properties.
pub struct JobBuilder {
    raw: RawJobSpec,
}

impl JobBuilder {
    pub fn new(name: &str) -> Self {
        let mut raw = RawJobSpec::new();
        raw.set(PROP_JOB_NAME, name).unwrap();
        raw.set(PROP_INPUT_DIR, format!("in/{name}")).unwrap();
        raw.set(PROP_OUTPUT_DIR, format!("out/{name}")).unwrap();
        raw.set(PROP_MAPPER, "cat").unwrap();
        raw.set(PROP_REDUCER, "cat").unwrap();
        Self { raw }
    }

    pub fn input_dir(mut self, dir: &str) -> Self {
        self.raw.set(PROP_INPUT_DIR, dir).unwrap();
        self
    }

    pub fn output_dir(mut self, dir: &str) -> Self {
        self.raw.set(PROP_OUTPUT_DIR, dir).unwrap();
        self
    }

    pub fn mapper(mut self, cmd: &str) -> Self {
        self.raw.set(PROP_MAPPER, cmd).unwrap();
        self
    }

    pub fn reducer(mut self, cmd: &str) -> Self {
        self.raw.set(PROP_REDUCER, cmd).unwrap();
        self
    }

    pub fn property(mut self, key: &str, value: &str) -> Self {
        self.raw.set(key, value).unwrap();
        self
    }

    pub fn file(mut self, path: &str) -> Self {
        self.raw.add_file(path);
        self
    }

    /// Drop a property, e.g. to build an incomplete job.
    pub fn without(mut self, key: &str) -> Self {
        self.raw.properties.remove(key);
        self
    }

    pub fn raw(self) -> RawJobSpec {
        self.raw
    }

    pub fn build(self) -> JobSpec {
        self.raw
            .into_spec()
            .expect("Failed to build valid job from builder")
    }
}

/// Builder for (uncommitted) graphs.
#[derive(Default)]
pub struct GraphBuilder {
    nodes: Vec<Node>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Placeholder node depending on `deps`.
    pub fn node(self, name: &str, deps: &[&str]) -> Self {
        self.push(Node::new(name), deps)
    }

    /// Node carrying a complete default job.
    pub fn job_node(self, name: &str, deps: &[&str]) -> Self {
        self.push(Node::new(name).with_job(JobBuilder::new(name).build()), deps)
    }

    pub fn resource_node(self, name: &str, resource: &str, deps: &[&str]) -> Self {
        self.push(Node::new(name).with_resource(resource), deps)
    }

    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    fn push(mut self, mut node: Node, deps: &[&str]) -> Self {
        for dep in deps {
            node.add_dependency(*dep).unwrap();
        }
        self.nodes.push(node);
        self
    }

    pub fn build(self) -> Graph {
        let mut graph = Graph::new();
        for node in self.nodes {
            graph.add_node(node).expect("Failed to add node from builder");
        }
        graph
    }
}

/// C depends on B depends on A.
pub fn chain_graph() -> Graph {
    GraphBuilder::new()
        .job_node("A", &[])
        .job_node("B", &["A"])
        .job_node("C", &["B"])
        .build()
}

/// D depends on B and C; B and C each depend on A.
pub fn diamond_graph() -> Graph {
    GraphBuilder::new()
        .job_node("A", &[])
        .job_node("B", &["A"])
        .job_node("C", &["A"])
        .job_node("D", &["B", "C"])
        .build()
}
