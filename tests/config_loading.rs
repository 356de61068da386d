// tests/config_loading.rs

use std::io::Write;
use std::path::PathBuf;

use tempfile::NamedTempFile;

use corgi::config::{load_and_validate, load_from_str, FlowFile};
use corgi::dag::NodeState;
use corgi::errors::CorgiError;
use corgi::types::{FailurePolicy, OutputMode};

fn flow_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

fn validate_str(contents: &str) -> Result<FlowFile, CorgiError> {
    FlowFile::try_from(load_from_str(contents)?)
}

const TWO_STAGE: &str = r#"
[config]
concurrency = 2
policy = "best-effort"
log_dir = "logs"

[node.split]
files = ["scripts/split.py"]

[node.split.job]
"corgi.job.name" = "split"
"corgi.input.dir" = "data/raw"
"corgi.output.dir" = "data/split"
"corgi.mapper" = "python scripts/split.py"
"corgi.reducer" = "cat"
"corgi.split.size" = "64"

[node.count]
depends = ["split", "gate"]
resource = "cpu"

[node.count.job]
"corgi.job.name" = "count"
"corgi.input.dir" = "data/split"
"corgi.output.dir" = "data/count"
"corgi.mapper" = "wc -l"
"corgi.reducer" = "awk '{s+=$1} END {print s}'"

[node.gate]
"#;

#[test]
fn valid_flow_loads_into_committed_graph() {
    let file = flow_file(TWO_STAGE);
    let flow = load_and_validate(file.path()).unwrap();

    assert_eq!(flow.config.concurrency, 2);
    assert_eq!(flow.config.policy, FailurePolicy::BestEffort);
    assert_eq!(flow.config.output_mode(), OutputMode::LogDir(PathBuf::from("logs")));
    assert_eq!(flow.config.effective_work_dir(), PathBuf::from("."));

    let graph = flow.graph();
    assert!(graph.is_committed());
    assert_eq!(graph.len(), 3);
    assert_eq!(graph.state_of("split"), Some(NodeState::Runnable));
    assert_eq!(graph.state_of("gate"), Some(NodeState::Runnable));
    assert_eq!(graph.state_of("count"), Some(NodeState::Blocked));

    let split = graph.node("split").unwrap();
    let job = split.job().unwrap();
    assert_eq!(job.mapper(), "python scripts/split.py");
    assert_eq!(job.property("corgi.split.size"), Some("64"));
    assert_eq!(job.files(), &[PathBuf::from("scripts/split.py")]);

    let count = graph.node("count").unwrap();
    assert_eq!(count.resource(), "cpu");
    assert!(graph.node("gate").unwrap().job().is_none());
}

#[test]
fn defaults_apply_when_config_section_is_absent() {
    let flow = validate_str(
        r#"
[node.only]
"#,
    )
    .unwrap();

    assert_eq!(flow.config.concurrency, 4);
    assert_eq!(flow.config.policy, FailurePolicy::FailFast);
    assert!(!flow.config.cascade_failures);
    assert_eq!(flow.config.output_mode(), OutputMode::Inherit);

    let options = flow.config.scheduler_options();
    assert_eq!(options.concurrency, 4);
    assert_eq!(options.policy, FailurePolicy::FailFast);
}

#[test]
fn missing_job_property_names_the_key() {
    let result = validate_str(
        r#"
[node.count.job]
"corgi.job.name" = "count"
"corgi.input.dir" = "in"
"corgi.output.dir" = "out"
"corgi.mapper" = "wc -l"
"#,
    );

    match result {
        Err(CorgiError::MissingProperty(key)) => assert_eq!(key, "corgi.reducer"),
        other => panic!("expected MissingProperty, got {:?}", other),
    }
}

#[test]
fn cycle_is_reported_at_load_time() {
    let file = flow_file(
        r#"
[node.A]
depends = ["B"]

[node.B]
depends = ["A"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(CorgiError::Cycle(members)) => {
            assert!(members.contains(&"A".to_string()));
            assert!(members.contains(&"B".to_string()));
            let msg = CorgiError::Cycle(members).to_string();
            assert!(msg.contains("->"));
        }
        other => panic!("expected Cycle, got {:?}", other),
    }
}

#[test]
fn unknown_dependency_is_dangling() {
    match validate_str(
        r#"
[node.A]
depends = ["NonExistent"]
"#,
    ) {
        Err(CorgiError::DanglingDependency { node, dependency }) => {
            assert_eq!(node, "A");
            assert_eq!(dependency, "NonExistent");
        }
        other => panic!("expected DanglingDependency, got {:?}", other),
    }
}

#[test]
fn self_dependency_is_rejected() {
    assert!(matches!(
        validate_str(
            r#"
[node.A]
depends = ["A"]
"#
        ),
        Err(CorgiError::SelfDependency(_))
    ));
}

#[test]
fn flow_without_nodes_is_a_config_error() {
    match validate_str("[config]\nconcurrency = 1\n") {
        Err(CorgiError::ConfigError(msg)) => assert!(msg.contains("at least one")),
        other => panic!("expected ConfigError, got {:?}", other),
    }
}

#[test]
fn zero_concurrency_is_a_config_error() {
    let result = validate_str(
        r#"
[config]
concurrency = 0

[node.A]
"#,
    );
    assert!(matches!(result, Err(CorgiError::ConfigError(_))));
}

#[test]
fn files_without_job_are_rejected() {
    match validate_str(
        r#"
[node.A]
files = ["a.txt"]
"#,
    ) {
        Err(CorgiError::ConfigError(msg)) => assert!(msg.contains("no [node.A.job]")),
        other => panic!("expected ConfigError, got {:?}", other),
    }
}

#[test]
fn cascade_requires_best_effort() {
    let result = validate_str(
        r#"
[config]
cascade_failures = true

[node.A]
"#,
    );
    assert!(matches!(result, Err(CorgiError::ConfigError(_))));

    let flow = validate_str(
        r#"
[config]
policy = "best-effort"
cascade_failures = true

[node.A]
"#,
    )
    .unwrap();
    assert!(flow.config.scheduler_options().cascade_failures);
}

#[test]
fn malformed_toml_surfaces_toml_error() {
    assert!(matches!(
        load_from_str("[node.A\n"),
        Err(CorgiError::TomlError(_))
    ));
    assert!(matches!(
        load_from_str("[config]\npolicy = \"sometimes\"\n"),
        Err(CorgiError::TomlError(_))
    ));
}

#[test]
fn missing_flow_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_and_validate(dir.path().join("Corgi.toml"));
    assert!(matches!(result, Err(CorgiError::IoError(_))));
}

#[test]
fn failure_policy_parses_from_cli_spellings() {
    assert_eq!("fail-fast".parse::<FailurePolicy>(), Ok(FailurePolicy::FailFast));
    assert_eq!("best_effort".parse::<FailurePolicy>(), Ok(FailurePolicy::BestEffort));
    assert_eq!(" Best-Effort ".parse::<FailurePolicy>(), Ok(FailurePolicy::BestEffort));
    assert!("never".parse::<FailurePolicy>().is_err());
    assert_eq!(FailurePolicy::BestEffort.to_string(), "best-effort");
}
