// src/job/mod.rs

//! Job declarations.
//!
//! A job is built up as a [`RawJobSpec`] (a loose property bag plus file
//! list), then validated exactly once into an immutable [`JobSpec`] with the
//! five required properties as typed fields.

pub mod spec;

pub use spec::{JobSpec, RawJobSpec};

/// `corgi.job.name`: human readable job name.
pub const PROP_JOB_NAME: &str = "corgi.job.name";
/// `corgi.input.dir`: directory the mapper reads from.
pub const PROP_INPUT_DIR: &str = "corgi.input.dir";
/// `corgi.output.dir`: directory the reducer writes to.
pub const PROP_OUTPUT_DIR: &str = "corgi.output.dir";
/// `corgi.mapper`: mapper command line.
pub const PROP_MAPPER: &str = "corgi.mapper";
/// `corgi.reducer`: reducer command line.
pub const PROP_REDUCER: &str = "corgi.reducer";

/// Required property keys, in the order they are checked.
pub const REQUIRED_PROPERTIES: [&str; 5] = [
    PROP_JOB_NAME,
    PROP_INPUT_DIR,
    PROP_OUTPUT_DIR,
    PROP_MAPPER,
    PROP_REDUCER,
];
