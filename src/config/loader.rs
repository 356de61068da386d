// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{FlowFile, RawFlowFile};
use crate::errors::Result;

/// Load a flow file from a given path and return the raw `RawFlowFile`.
///
/// This only performs TOML deserialization; it does **not** validate jobs or
/// the graph. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawFlowFile> {
    let path = path.as_ref();
    debug!(path = %path.display(), "reading flow file");
    let contents = fs::read_to_string(path)?;
    load_from_str(&contents)
}

/// Parse a flow from TOML text without validating it.
pub fn load_from_str(contents: &str) -> Result<RawFlowFile> {
    let flow: RawFlowFile = toml::from_str(contents)?;
    Ok(flow)
}

/// Load a flow file from path and validate it.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Admits every job (all five `corgi.*` properties present).
/// - Commits the graph (no dangling dependency, no cycle).
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<FlowFile> {
    let raw = load_from_path(&path)?;
    FlowFile::try_from(raw)
}

/// Default flow file: `Corgi.toml` in the current working directory.
pub fn default_flow_path() -> PathBuf {
    PathBuf::from("Corgi.toml")
}
