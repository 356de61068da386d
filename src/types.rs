// src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// What the scheduler does once a node fails.
///
/// - `FailFast`: stop dispatching new nodes immediately; in-flight nodes are
///   allowed to finish and the run ends `Aborted` (default behaviour).
/// - `BestEffort`: keep running every branch that does not depend on the
///   failed node; the run ends `Partial`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    #[default]
    FailFast,
    BestEffort,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "fail-fast" => Ok(FailurePolicy::FailFast),
            "best-effort" => Ok(FailurePolicy::BestEffort),
            other => Err(format!(
                "invalid failure policy: {other} (expected \"fail-fast\" or \"best-effort\")"
            )),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::FailFast => write!(f, "fail-fast"),
            FailurePolicy::BestEffort => write!(f, "best-effort"),
        }
    }
}

/// Where child process output goes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Child shares our stdout/stderr.
    #[default]
    Inherit,
    /// Each line is forwarded to `tracing` at debug level.
    Trace,
    /// Streams are appended to `<dir>/<node>.<stage>.log`.
    LogDir(std::path::PathBuf),
}
