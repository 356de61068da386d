// tests/cli_args.rs

use std::io::Write;

use clap::Parser;
use tempfile::NamedTempFile;

use corgi::cli::{CliArgs, LogLevel};
use corgi::config::default_flow_path;
use corgi::logging::build_filter;
use corgi::types::FailurePolicy;

fn parse(args: &[&str]) -> CliArgs {
    CliArgs::try_parse_from(std::iter::once("corgi").chain(args.iter().copied()))
        .expect("arguments should parse")
}

fn flow_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn flow_path_defaults_to_corgi_toml() {
    let args = parse(&[]);
    assert_eq!(args.flow, default_flow_path());
    assert!(args.policy.is_none());
    assert!(!args.dry_run);
}

#[test]
fn policy_flag_accepts_both_spellings() {
    assert_eq!(parse(&["--policy", "best-effort"]).policy, Some(FailurePolicy::BestEffort));
    assert_eq!(parse(&["--policy", "fail_fast"]).policy, Some(FailurePolicy::FailFast));
    assert!(CliArgs::try_parse_from(["corgi", "--policy", "sometimes"]).is_err());
}

#[test]
fn log_dir_conflicts_with_trace_output() {
    assert!(CliArgs::try_parse_from(["corgi", "--log-dir", "logs", "--trace-output"]).is_err());
}

#[test]
fn cli_level_wins_over_env_directives() {
    let filter = build_filter(Some(LogLevel::Debug), Some("warn")).unwrap();
    assert_eq!(filter.to_string(), "debug");
}

#[test]
fn env_directives_allow_per_module_levels() {
    let filter = build_filter(None, Some("info,corgi::engine=debug")).unwrap();
    assert!(filter.to_string().contains("corgi::engine=debug"));

    let fallback = build_filter(None, Some("  ")).unwrap();
    assert_eq!(fallback.to_string(), "info");

    assert!(build_filter(None, Some("corgi=loud")).is_err());
}

#[tokio::test]
async fn cascade_flag_without_best_effort_is_rejected_like_toml() {
    let file = flow_file("[node.A]\n");
    let path = file.path().to_str().unwrap();

    let err = corgi::run(parse(&["-f", path, "--dry-run", "--cascade-failures"]))
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("cascade_failures requires"));

    corgi::run(parse(&[
        "-f",
        path,
        "--dry-run",
        "--cascade-failures",
        "--policy",
        "best-effort",
    ]))
    .await
    .unwrap();
}

#[tokio::test]
async fn zero_concurrency_flag_is_rejected() {
    let file = flow_file("[node.A]\n");
    let path = file.path().to_str().unwrap();

    let err = corgi::run(parse(&["-f", path, "--dry-run", "-j", "0"]))
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("concurrency must be >= 1"));
}
