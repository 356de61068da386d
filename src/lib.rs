// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod job;
pub mod logging;
pub mod types;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::load_and_validate;
use crate::config::model::ConfigSection;
use crate::dag::Graph;
use crate::engine::{RunEvent, Scheduler, SchedulerCore};
use crate::exec::ProcessExecutor;
use crate::types::OutputMode;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - flow loading and validation
/// - CLI overrides of the `[config]` section
/// - scheduler core + async shell
/// - process executor
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let flow = load_and_validate(&args.flow)
        .with_context(|| format!("loading flow file {:?}", args.flow))?;
    let (mut config, graph) = flow.into_parts();
    apply_cli_overrides(&mut config, &args);
    config.validate().context("invalid configuration after CLI overrides")?;

    if args.dry_run {
        print_dry_run(&config, &graph)?;
        return Ok(());
    }

    let output = if args.trace_output {
        OutputMode::Trace
    } else {
        config.output_mode()
    };
    let executor = ProcessExecutor::new(config.effective_work_dir(), output);

    let core = SchedulerCore::new(graph, config.scheduler_options())?;
    let scheduler = Scheduler::new(core, executor);

    // Ctrl-C → stop dispatching, let running jobs finish.
    {
        let tx = scheduler.event_sender();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            info!("Ctrl+C received; draining running jobs");
            let _ = tx.send(RunEvent::ShutdownRequested).await;
        });
    }

    let report = scheduler.run().await?;
    print!("{report}");
    report.into_result()?;
    Ok(())
}

fn apply_cli_overrides(config: &mut ConfigSection, args: &CliArgs) {
    if let Some(n) = args.concurrency {
        config.concurrency = n;
    }
    if let Some(policy) = args.policy {
        config.policy = policy;
    }
    if args.cascade_failures {
        config.cascade_failures = true;
    }
    if let Some(ref dir) = args.work_dir {
        config.work_dir = Some(dir.clone());
    }
    if let Some(ref dir) = args.log_dir {
        config.log_dir = Some(dir.clone());
    }
    debug!(?config, "effective configuration");
}

/// Simple dry-run output: settings, then nodes in dependency order.
fn print_dry_run(config: &ConfigSection, graph: &Graph) -> Result<()> {
    println!("corgi dry-run");
    println!("  config.concurrency = {}", config.concurrency);
    println!("  config.policy = {}", config.policy);
    println!("  config.cascade_failures = {}", config.cascade_failures);
    println!("  config.work_dir = {}", config.effective_work_dir().display());
    if let Some(ref dir) = config.log_dir {
        println!("  config.log_dir = {}", dir.display());
    }
    println!();

    println!("nodes ({}):", graph.len());
    for name in graph.topological_order()? {
        let node = graph.node(&name)?;
        println!("  - {node}");
        if !node.resource().is_empty() {
            println!("      resource: {}", node.resource());
        }
        if !node.depends().is_empty() {
            println!("      depends: {:?}", node.depends());
        }
        if let Some(job) = node.job() {
            println!("      job: {job}");
            if !job.files().is_empty() {
                println!("      files: {:?}", job.files());
            }
        }
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
