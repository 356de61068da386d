// src/config/validate.rs

use crate::config::model::{ConfigSection, FlowFile, NodeConfig, RawFlowFile};
use crate::dag::{Graph, Node};
use crate::errors::{CorgiError, Result};
use crate::job::RawJobSpec;
use crate::types::FailurePolicy;

impl TryFrom<RawFlowFile> for FlowFile {
    type Error = CorgiError;

    fn try_from(raw: RawFlowFile) -> std::result::Result<Self, Self::Error> {
        ensure_has_nodes(&raw)?;
        raw.config.validate()?;
        let graph = build_graph(&raw)?;
        Ok(FlowFile::new_unchecked(raw.config, graph))
    }
}

fn ensure_has_nodes(cfg: &RawFlowFile) -> Result<()> {
    if cfg.node.is_empty() {
        return Err(CorgiError::ConfigError(
            "flow must contain at least one [node.<name>] section".to_string(),
        ));
    }
    Ok(())
}

impl ConfigSection {
    /// Check the global settings on their own.
    ///
    /// Also run after CLI overrides, so flags and TOML obey the same rules.
    pub fn validate(&self) -> Result<()> {
        validate_global_config(self)
    }
}

fn validate_global_config(cfg: &ConfigSection) -> Result<()> {
    if cfg.concurrency == 0 {
        return Err(CorgiError::ConfigError(
            "[config].concurrency must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.cascade_failures && cfg.policy != FailurePolicy::BestEffort {
        return Err(CorgiError::ConfigError(
            "[config].cascade_failures requires policy = \"best-effort\"".to_string(),
        ));
    }
    Ok(())
}

/// Admit every node (validating its job) and commit the resulting graph.
///
/// Commit reports dangling dependencies and cycles.
fn build_graph(cfg: &RawFlowFile) -> Result<Graph> {
    let mut graph = Graph::new();
    for (name, node_cfg) in cfg.node.iter() {
        graph.add_node(build_node(name, node_cfg)?)?;
    }
    graph.commit()?;
    Ok(graph)
}

fn build_node(name: &str, cfg: &NodeConfig) -> Result<Node> {
    let mut node = Node::new(name);

    if let Some(resource) = &cfg.resource {
        node = node.with_resource(resource.clone());
    }

    match &cfg.job {
        Some(properties) => {
            let mut raw = RawJobSpec::new();
            for (key, value) in properties {
                raw.set(key.clone(), value.clone())?;
            }
            for file in &cfg.files {
                raw.add_file(file.clone());
            }
            node = node.with_job(raw.into_spec()?);
        }
        None if !cfg.files.is_empty() => {
            return Err(CorgiError::ConfigError(format!(
                "node '{name}' lists files but has no [node.{name}.job] section"
            )));
        }
        None => {}
    }

    for dep in &cfg.depends {
        node.add_dependency(dep.clone())?;
    }

    Ok(node)
}
