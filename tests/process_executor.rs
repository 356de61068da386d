// tests/process_executor.rs
#![cfg(unix)]

use std::fs;
use std::path::Path;

use tempfile::tempdir;

use corgi::dag::NodeState;
use corgi::engine::{JobOutcome, RunStatus, ScheduledNode, Scheduler, SchedulerCore, SchedulerOptions};
use corgi::exec::{Executor, ProcessExecutor};
use corgi::job::JobSpec;
use corgi::types::OutputMode;
use corgi_test_utils::builders::{GraphBuilder, JobBuilder};
use corgi_test_utils::{init_tracing, with_timeout};

/// Shell function wrapper so the appended `"$@"` lands as `$1 $2`.
fn func(body: &str) -> String {
    format!("f() {{ {body}; }}; f")
}

fn scheduled(name: &str, job: JobSpec) -> ScheduledNode {
    ScheduledNode {
        name: name.to_string(),
        resource: String::new(),
        job: Some(job),
    }
}

fn seed_input(work: &Path, dir: &str, files: &[&str]) {
    let input = work.join(dir);
    fs::create_dir_all(&input).unwrap();
    for f in files {
        fs::write(input.join(f), "x\n").unwrap();
    }
}

#[tokio::test]
async fn mapper_output_feeds_reducer() {
    init_tracing();
    let work = tempdir().unwrap();
    seed_input(work.path(), "in", &["a.txt", "b.txt"]);

    let job = JobBuilder::new("count")
        .input_dir("in")
        .output_dir("out")
        .mapper(&func(r#"ls "$1" > "$2/listing.txt""#))
        .reducer(&func(r#"wc -l < "$1/listing.txt" | tr -d ' ' > "$2/count.txt""#))
        .build();

    let executor = ProcessExecutor::new(work.path(), OutputMode::Trace);
    let outcome = with_timeout(executor.run(&scheduled("count", job)))
        .await
        .unwrap();

    assert_eq!(outcome, JobOutcome::Success);
    let count = fs::read_to_string(work.path().join("out/count.txt")).unwrap();
    assert_eq!(count.trim(), "2");
}

#[tokio::test]
async fn failing_mapper_skips_reducer() {
    init_tracing();
    let work = tempdir().unwrap();

    let job = JobBuilder::new("broken")
        .output_dir("out")
        .mapper(&func("exit 3"))
        .reducer(&func("touch reducer-ran"))
        .build();

    let executor = ProcessExecutor::new(work.path(), OutputMode::Trace);
    let outcome = executor.run(&scheduled("broken", job)).await.unwrap();

    assert_eq!(outcome, JobOutcome::Failed(3));
    assert_eq!(outcome.code(), 3);
    assert!(!work.path().join("reducer-ran").exists());
}

#[tokio::test]
async fn failing_reducer_returns_its_code() {
    init_tracing();
    let work = tempdir().unwrap();

    let job = JobBuilder::new("reduce-fails")
        .output_dir("out")
        .mapper(&func("true"))
        .reducer(&func("exit 5"))
        .build();

    let executor = ProcessExecutor::new(work.path(), OutputMode::Trace);
    let outcome = executor.run(&scheduled("reduce-fails", job)).await.unwrap();
    assert_eq!(outcome, JobOutcome::Failed(5));
}

#[tokio::test]
async fn stages_see_job_environment() {
    init_tracing();
    let work = tempdir().unwrap();

    let job = JobBuilder::new("wc")
        .output_dir("out")
        .mapper(&func(r#"printf '%s' "$CORGI_JOB_NAME:$CORGI_NODE:$CORGI_STAGE" > "$2/env.txt""#))
        .reducer(&func(r#"printf '%s' "$CORGI_STAGE:$CORGI_OUTPUT_DIR" > "$2/env.txt""#))
        .build();

    let executor = ProcessExecutor::new(work.path(), OutputMode::Trace);
    let outcome = executor.run(&scheduled("wc-node", job)).await.unwrap();
    assert_eq!(outcome, JobOutcome::Success);

    let map_env = fs::read_to_string(work.path().join("out/_map/env.txt")).unwrap();
    assert_eq!(map_env, "wc:wc-node:map");
    let reduce_env = fs::read_to_string(work.path().join("out/env.txt")).unwrap();
    assert_eq!(reduce_env, "reduce:out");
}

#[tokio::test]
async fn log_dir_captures_stage_output() {
    init_tracing();
    let work = tempdir().unwrap();

    let job = JobBuilder::new("chatty")
        .output_dir("out")
        .mapper(&func("echo hello-from-mapper; echo oops >&2"))
        .reducer(&func("echo hello-from-reducer"))
        .build();

    let executor = ProcessExecutor::new(work.path(), OutputMode::LogDir("logs".into()));
    let outcome = executor.run(&scheduled("chatty", job)).await.unwrap();
    assert_eq!(outcome, JobOutcome::Success);

    let map_log = fs::read_to_string(work.path().join("logs/chatty.map.log")).unwrap();
    assert!(map_log.contains("hello-from-mapper"));
    assert!(map_log.contains("oops"));
    let reduce_log = fs::read_to_string(work.path().join("logs/chatty.reduce.log")).unwrap();
    assert!(reduce_log.contains("hello-from-reducer"));
}

#[tokio::test]
async fn placeholder_node_succeeds_without_spawning() {
    let work = tempdir().unwrap();
    let executor = ProcessExecutor::new(work.path(), OutputMode::Inherit);
    let node = ScheduledNode {
        name: "gate".to_string(),
        resource: String::new(),
        job: None,
    };
    assert_eq!(executor.run(&node).await.unwrap(), JobOutcome::Success);
}

#[tokio::test]
async fn dependent_jobs_run_end_to_end() {
    init_tracing();
    let work = tempdir().unwrap();
    seed_input(work.path(), "raw", &["one", "two", "three"]);

    let split = JobBuilder::new("split")
        .input_dir("raw")
        .output_dir("stage1")
        .mapper(&func(r#"ls "$1" > "$2/names""#))
        .reducer(&func(r#"sort "$1/names" > "$2/sorted""#))
        .build();
    let count = JobBuilder::new("count")
        .input_dir("stage1")
        .output_dir("stage2")
        .mapper(&func(r#"wc -l < "$1/sorted" | tr -d ' ' > "$2/n""#))
        .reducer(&func(r#"cp "$1/n" "$2/total""#))
        .build();

    let mut count_node = corgi::dag::Node::new("count").with_job(count);
    count_node.add_dependency("split").unwrap();
    let graph = GraphBuilder::new()
        .with_node(corgi::dag::Node::new("split").with_job(split))
        .with_node(count_node)
        .build();

    let core = SchedulerCore::new(graph, SchedulerOptions::default()).unwrap();
    let scheduler = Scheduler::new(core, ProcessExecutor::new(work.path(), OutputMode::Trace));
    let report = with_timeout(scheduler.run()).await.unwrap();

    assert_eq!(report.status, RunStatus::Complete);
    assert_eq!(report.state_of("count"), Some(NodeState::Done));
    let total = fs::read_to_string(work.path().join("stage2/total")).unwrap();
    assert_eq!(total.trim(), "3");
}

#[tokio::test]
async fn file_paths_with_separator_characters_reach_the_job() {
    init_tracing();
    let work = tempdir().unwrap();

    let job = JobBuilder::new("dated")
        .output_dir("out")
        .file("data:2024.csv")
        .file("scripts/run.sh")
        .mapper(&func(r#"printf '%s' "$CORGI_FILES" > "$2/files.txt""#))
        .reducer(&func("true"))
        .build();

    let executor = ProcessExecutor::new(work.path(), OutputMode::Trace);
    let outcome = executor.run(&scheduled("dated", job)).await.unwrap();
    assert_eq!(outcome, JobOutcome::Success);

    let files = fs::read_to_string(work.path().join("out/_map/files.txt")).unwrap();
    assert_eq!(files, "data:2024.csv\nscripts/run.sh");
}
