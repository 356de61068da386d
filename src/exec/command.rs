// src/exec/command.rs

//! Command lines for the two stages of a job.
//!
//! Argument wiring:
//! - map:    `<mapper> <input_dir> <output_dir>/_map`
//! - reduce: `<reducer> <output_dir>/_map <output_dir>`
//!
//! Both stages also see `CORGI_*` environment variables describing the job.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use tokio::process::Command;

use crate::job::JobSpec;

/// Directory under the job's output dir that receives the mapper output.
pub const MAP_DIR_NAME: &str = "_map";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Map,
    Reduce,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Map => "map",
            Stage::Reduce => "reduce",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Intermediate directory shared by the mapper (output) and reducer (input).
pub fn map_dir(job: &JobSpec) -> PathBuf {
    Path::new(job.output_dir()).join(MAP_DIR_NAME)
}

/// Value of `CORGI_FILES`: one path per line.
///
/// Paths may contain the platform path-list separator, so they are joined with
/// newlines instead of `env::join_paths`.
pub fn files_env(files: &[PathBuf]) -> OsString {
    let mut joined = OsString::new();
    for (i, file) in files.iter().enumerate() {
        if i > 0 {
            joined.push("\n");
        }
        joined.push(file.as_os_str());
    }
    joined
}

/// Fully resolved invocation of one stage.
#[derive(Debug, Clone)]
pub struct StageCommand {
    pub stage: Stage,
    /// Shell command line from the job (`corgi.mapper` / `corgi.reducer`).
    pub line: String,
    pub args: Vec<OsString>,
    pub env: Vec<(String, OsString)>,
}

impl StageCommand {
    pub fn new(node: &str, job: &JobSpec, stage: Stage) -> Self {
        let map_dir = map_dir(job).into_os_string();
        let (line, args) = match stage {
            Stage::Map => (
                job.mapper().to_string(),
                vec![OsString::from(job.input_dir()), map_dir],
            ),
            Stage::Reduce => (
                job.reducer().to_string(),
                vec![map_dir, OsString::from(job.output_dir())],
            ),
        };

        let files = files_env(job.files());

        let env = vec![
            ("CORGI_NODE".to_string(), OsString::from(node)),
            ("CORGI_JOB_NAME".to_string(), OsString::from(job.name())),
            ("CORGI_STAGE".to_string(), OsString::from(stage.as_str())),
            ("CORGI_INPUT_DIR".to_string(), OsString::from(job.input_dir())),
            ("CORGI_OUTPUT_DIR".to_string(), OsString::from(job.output_dir())),
            ("CORGI_FILES".to_string(), files),
        ];

        Self {
            stage,
            line,
            args,
            env,
        }
    }

    /// Build a platform shell command running `line` with `args` appended.
    pub fn to_command(&self, work_dir: &Path) -> Command {
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.line).args(&self.args);
            c
        } else {
            // `$@` keeps the arguments intact whatever they contain.
            let mut c = Command::new("sh");
            c.arg("-c")
                .arg(format!("{} \"$@\"", self.line))
                .arg("corgi")
                .args(&self.args);
            c
        };

        cmd.current_dir(work_dir);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        cmd
    }
}
