// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::engine::core::SchedulerCore;
use crate::engine::report::RunReport;
use crate::engine::{JobOutcome, RunEvent, ScheduledNode};
use crate::errors::Result;
use crate::exec::Executor;

/// Drives a [`SchedulerCore`] to completion.
///
/// This is the IO shell around the core: it owns the core exclusively (all
/// state transitions happen on this task), spawns one worker per dispatched
/// node, and feeds the workers' completions back into the core through an
/// mpsc channel.
pub struct Scheduler<E: Executor + 'static> {
    core: SchedulerCore,
    executor: Arc<E>,
    event_tx: mpsc::Sender<RunEvent>,
    event_rx: mpsc::Receiver<RunEvent>,
}

impl<E: Executor + 'static> fmt::Debug for Scheduler<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: Executor + 'static> Scheduler<E> {
    pub fn new(core: SchedulerCore, executor: E) -> Self {
        let (event_tx, event_rx) = mpsc::channel::<RunEvent>(64);
        Self {
            core,
            executor: Arc::new(executor),
            event_tx,
            event_rx,
        }
    }

    /// Sender for injecting events, e.g. `RunEvent::ShutdownRequested` from a
    /// Ctrl-C handler.
    pub fn event_sender(&self) -> mpsc::Sender<RunEvent> {
        self.event_tx.clone()
    }

    /// Main event loop.
    ///
    /// - Dispatches the initial eligible nodes.
    /// - Waits for `RunEvent`s and feeds them into the core.
    /// - Spawns workers for whatever the core dispatches in response.
    /// - Returns the report once the core says the run is finished.
    pub async fn run(mut self) -> Result<RunReport> {
        info!("scheduler started");

        let step = self.core.start()?;
        self.spawn_workers(step.dispatch);
        let mut finished = step.finished;

        while !finished {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("scheduler event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "scheduler received event");

            let step = match event {
                RunEvent::NodeFinished { node, outcome } => {
                    self.core.on_finished(&node, outcome)?
                }
                RunEvent::ShutdownRequested => self.core.request_abort()?,
            };

            self.spawn_workers(step.dispatch);
            finished = step.finished;
        }

        let report = self.core.report();
        info!(status = %report.status, "scheduler exiting");
        Ok(report)
    }

    /// Spawn one worker per node.
    ///
    /// The job runs in its own task so a panicking executor still produces a
    /// `NodeFinished` event, recorded as returncode `-1`.
    fn spawn_workers(&self, nodes: Vec<ScheduledNode>) {
        for node in nodes {
            let executor = Arc::clone(&self.executor);
            let tx = self.event_tx.clone();
            let name = node.name.clone();

            tokio::spawn(async move {
                let job = tokio::spawn(async move { executor.run(&node).await });

                let outcome = match job.await {
                    Ok(Ok(outcome)) => outcome,
                    Ok(Err(err)) => {
                        error!(node = %name, error = %err, "job execution error");
                        JobOutcome::Failed(-1)
                    }
                    Err(join_err) => {
                        error!(node = %name, error = %join_err, "job worker panicked or was cancelled");
                        JobOutcome::Failed(-1)
                    }
                };

                debug!(node = %name, ?outcome, "worker finished");
                let _ = tx
                    .send(RunEvent::NodeFinished {
                        node: name,
                        outcome,
                    })
                    .await;
            });
        }
    }
}
