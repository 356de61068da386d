// tests/job_spec.rs

use corgi::errors::CorgiError;
use corgi::job::{
    JobSpec, RawJobSpec, PROP_INPUT_DIR, PROP_JOB_NAME, PROP_MAPPER, PROP_OUTPUT_DIR,
    PROP_REDUCER,
};
use corgi_test_utils::builders::JobBuilder;

#[test]
fn complete_job_validates_into_typed_spec() {
    let job = JobBuilder::new("wordcount")
        .mapper("python map.py")
        .reducer("python reduce.py")
        .property("corgi.queue", "default")
        .file("map.py")
        .file("reduce.py")
        .build();

    assert_eq!(job.name(), "wordcount");
    assert_eq!(job.input_dir(), "in/wordcount");
    assert_eq!(job.output_dir(), "out/wordcount");
    assert_eq!(job.mapper(), "python map.py");
    assert_eq!(job.reducer(), "python reduce.py");
    assert_eq!(job.extra().get("corgi.queue").map(String::as_str), Some("default"));
    assert_eq!(job.extra().len(), 1);
    assert_eq!(job.files().len(), 2);
    assert_eq!(job.files()[0].to_str(), Some("map.py"));
}

#[test]
fn missing_reducer_is_reported_by_key() {
    let raw = JobBuilder::new("wordcount").without(PROP_REDUCER).raw();

    match raw.validate() {
        Err(CorgiError::MissingProperty(key)) => assert_eq!(key, "corgi.reducer"),
        other => panic!("expected MissingProperty, got {:?}", other),
    }
    assert!(matches!(
        JobSpec::try_from(raw),
        Err(CorgiError::MissingProperty(ref key)) if key == "corgi.reducer"
    ));
}

#[test]
fn first_missing_key_wins_in_fixed_order() {
    let raw = JobBuilder::new("job")
        .without(PROP_OUTPUT_DIR)
        .without(PROP_MAPPER)
        .without(PROP_REDUCER)
        .raw();
    match raw.validate() {
        Err(CorgiError::MissingProperty(key)) => assert_eq!(key, PROP_OUTPUT_DIR),
        other => panic!("expected MissingProperty, got {:?}", other),
    }

    let empty = RawJobSpec::new();
    match empty.validate() {
        Err(CorgiError::MissingProperty(key)) => assert_eq!(key, PROP_JOB_NAME),
        other => panic!("expected MissingProperty, got {:?}", other),
    }
}

#[test]
fn validate_has_no_side_effects() {
    let raw = JobBuilder::new("job").without(PROP_INPUT_DIR).raw();
    let before = raw.clone();
    assert!(raw.validate().is_err());
    assert_eq!(raw, before);
}

#[test]
fn set_overwrites_and_rejects_empty_keys() {
    let mut raw = RawJobSpec::new();
    raw.set(PROP_MAPPER, "cat").unwrap();
    raw.set(PROP_MAPPER, "wc -l").unwrap();
    assert_eq!(raw.properties.get(PROP_MAPPER).map(String::as_str), Some("wc -l"));

    assert!(matches!(raw.set("", "x"), Err(CorgiError::InvalidProperty(_))));
}

#[test]
fn property_lookup_covers_required_and_extra_keys() {
    let job = JobBuilder::new("job").property("corgi.memory", "2g").build();
    assert_eq!(job.property(PROP_JOB_NAME), Some("job"));
    assert_eq!(job.property(PROP_REDUCER), Some("cat"));
    assert_eq!(job.property("corgi.memory"), Some("2g"));
    assert_eq!(job.property("corgi.unknown"), None);
}

#[test]
fn display_lists_properties() {
    let job = JobBuilder::new("job").mapper("m.sh").build();
    let rendered = job.to_string();
    assert!(rendered.starts_with("Job:{"));
    assert!(rendered.contains("corgi.mapper:m.sh"));
    assert!(rendered.contains("corgi.job.name:job"));
}
