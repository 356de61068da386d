// src/exec/process.rs

//! Production executor: runs mapper and reducer as child processes.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{debug, info, warn};

use crate::engine::{JobOutcome, ScheduledNode};
use crate::errors::Result;
use crate::exec::backend::Executor;
use crate::exec::command::{map_dir, Stage, StageCommand};
use crate::job::JobSpec;
use crate::types::OutputMode;

/// Runs each job as `mapper` then `reducer` in `work_dir`.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    work_dir: PathBuf,
    output: OutputMode,
}

impl ProcessExecutor {
    pub fn new(work_dir: impl Into<PathBuf>, output: OutputMode) -> Self {
        Self {
            work_dir: work_dir.into(),
            output,
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    async fn run_job(&self, node: &str, job: &JobSpec) -> Result<JobOutcome> {
        for file in job.files() {
            if !self.work_dir.join(file).exists() {
                warn!(node = %node, file = %file.display(), "job file does not exist");
            }
        }

        tokio::fs::create_dir_all(self.work_dir.join(map_dir(job)))
            .await
            .with_context(|| format!("creating map output directory for node '{node}'"))?;

        let code = self.run_stage(node, job, Stage::Map).await?;
        if code != 0 {
            warn!(node = %node, exit_code = code, "mapper failed; skipping reducer");
            return Ok(JobOutcome::Failed(code));
        }

        let code = self.run_stage(node, job, Stage::Reduce).await?;
        Ok(JobOutcome::from_code(code))
    }

    async fn run_stage(&self, node: &str, job: &JobSpec, stage: Stage) -> Result<i32> {
        let stage_cmd = StageCommand::new(node, job, stage);
        let mut cmd = stage_cmd.to_command(&self.work_dir);

        info!(
            node = %node,
            stage = %stage,
            cmd = %stage_cmd.line,
            args = ?stage_cmd.args,
            "starting stage process"
        );

        match &self.output {
            OutputMode::Inherit => {
                cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            }
            OutputMode::Trace => {
                cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
            }
            OutputMode::LogDir(dir) => {
                let dir = self.work_dir.join(dir);
                tokio::fs::create_dir_all(&dir)
                    .await
                    .with_context(|| format!("creating log directory {:?}", dir))?;
                let path = dir.join(format!("{node}.{stage}.log"));
                let file = tokio::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .await
                    .with_context(|| format!("opening log file {:?}", path))?
                    .into_std()
                    .await;
                let err_file = file
                    .try_clone()
                    .with_context(|| format!("cloning log file handle {:?}", path))?;
                cmd.stdout(Stdio::from(file)).stderr(Stdio::from(err_file));
            }
        }
        cmd.kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning {stage} process for node '{node}'"))?;

        if let Some(stdout) = child.stdout.take() {
            forward_lines(node, stage, "stdout", stdout);
        }
        if let Some(stderr) = child.stderr.take() {
            forward_lines(node, stage, "stderr", stderr);
        }

        let status = child
            .wait()
            .await
            .with_context(|| format!("waiting for {stage} process of node '{node}'"))?;
        // Killed by a signal: no exit code.
        let code = status.code().unwrap_or(-1);

        info!(
            node = %node,
            stage = %stage,
            exit_code = code,
            success = status.success(),
            "stage process exited"
        );

        Ok(code)
    }
}

impl Executor for ProcessExecutor {
    fn run<'a>(
        &'a self,
        node: &'a ScheduledNode,
    ) -> Pin<Box<dyn Future<Output = Result<JobOutcome>> + Send + 'a>> {
        Box::pin(async move {
            match &node.job {
                Some(job) => self.run_job(&node.name, job).await,
                None => {
                    debug!(node = %node.name, "placeholder node; nothing to run");
                    Ok(JobOutcome::Success)
                }
            }
        })
    }
}

/// Consume a child stream line by line, logging at debug level.
fn forward_lines<R>(node: &str, stage: Stage, stream: &'static str, reader: R)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let node = node.to_string();
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!(node = %node, stage = %stage, "{}: {}", stream, line);
        }
    });
}
