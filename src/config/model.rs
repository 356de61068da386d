// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::dag::Graph;
use crate::engine::SchedulerOptions;
use crate::types::{FailurePolicy, OutputMode};

/// Flow file as read from TOML, before validation.
///
/// ```toml
/// [config]
/// concurrency = 2
/// policy = "best-effort"
///
/// [node.split.job]
/// "corgi.job.name" = "split"
/// "corgi.input.dir" = "data/raw"
/// "corgi.output.dir" = "data/split"
/// "corgi.mapper" = "python split.py"
/// "corgi.reducer" = "cat"
///
/// [node.count]
/// depends = ["split"]
/// resource = "cpu"
/// ```
///
/// All sections are optional and have reasonable defaults; validation
/// rejects a flow without nodes.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawFlowFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// All nodes from `[node.<name>]`, keyed by node name.
    #[serde(default)]
    pub node: BTreeMap<String, NodeConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ConfigSection {
    /// Maximum number of nodes running at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// `"fail-fast"` (default) or `"best-effort"`.
    #[serde(default)]
    pub policy: FailurePolicy,

    /// Best-effort only: mark dependents of a failed node as failed.
    #[serde(default)]
    pub cascade_failures: bool,

    /// Working directory for mapper and reducer processes.
    #[serde(default)]
    pub work_dir: Option<PathBuf>,

    /// If set, child output goes to `<log_dir>/<node>.<stage>.log`.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_concurrency() -> usize {
    4
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            policy: FailurePolicy::default(),
            cascade_failures: false,
            work_dir: None,
            log_dir: None,
        }
    }
}

impl ConfigSection {
    pub fn scheduler_options(&self) -> SchedulerOptions {
        SchedulerOptions {
            concurrency: self.concurrency,
            policy: self.policy,
            cascade_failures: self.cascade_failures,
        }
    }

    pub fn output_mode(&self) -> OutputMode {
        match &self.log_dir {
            Some(dir) => OutputMode::LogDir(dir.clone()),
            None => OutputMode::Inherit,
        }
    }

    pub fn effective_work_dir(&self) -> PathBuf {
        self.work_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

/// `[node.<name>]` section.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct NodeConfig {
    /// Resource-pool tag; nodes sharing a tag never run at the same time.
    #[serde(default)]
    pub resource: Option<String>,

    /// Names of nodes that must be done before this one starts.
    #[serde(default)]
    pub depends: Vec<String>,

    /// Files associated with the job (inputs, scripts, artifacts).
    #[serde(default)]
    pub files: Vec<PathBuf>,

    /// Job properties (`"corgi.mapper" = "..."` etc.). Absent for
    /// placeholder nodes.
    #[serde(default)]
    pub job: Option<BTreeMap<String, String>>,
}

/// Validated flow: global settings plus a committed graph.
///
/// Only obtainable through `TryFrom<RawFlowFile>`.
#[derive(Debug, Clone)]
pub struct FlowFile {
    pub config: ConfigSection,
    graph: Graph,
}

impl FlowFile {
    pub(crate) fn new_unchecked(config: ConfigSection, graph: Graph) -> Self {
        Self { config, graph }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn into_parts(self) -> (ConfigSection, Graph) {
        (self.config, self.graph)
    }
}
