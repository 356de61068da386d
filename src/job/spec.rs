// src/job/spec.rs

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::errors::{CorgiError, Result};
use crate::job::{
    PROP_INPUT_DIR, PROP_JOB_NAME, PROP_MAPPER, PROP_OUTPUT_DIR, PROP_REDUCER,
    REQUIRED_PROPERTIES,
};

/// Mutable job declaration as produced by a loader, before admission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawJobSpec {
    pub properties: BTreeMap<String, String>,
    pub files: Vec<PathBuf>,
}

impl RawJobSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store or overwrite a property. Keys must be non-empty.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<&mut Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(CorgiError::InvalidProperty(
                "property key must not be empty".to_string(),
            ));
        }
        self.properties.insert(key, value.into());
        Ok(self)
    }

    pub fn add_file(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.files.push(path.into());
        self
    }

    /// Check that every required property is present.
    ///
    /// Reports the first missing key in the order of
    /// [`REQUIRED_PROPERTIES`].
    pub fn validate(&self) -> Result<()> {
        match REQUIRED_PROPERTIES
            .iter()
            .find(|key| !self.properties.contains_key(**key))
        {
            Some(missing) => Err(CorgiError::MissingProperty(missing.to_string())),
            None => Ok(()),
        }
    }

    /// Validate and convert into an immutable [`JobSpec`].
    pub fn into_spec(self) -> Result<JobSpec> {
        JobSpec::try_from(self)
    }
}

/// Validated, immutable job declaration.
///
/// The required properties live in typed fields; anything else the loader
/// supplied is kept in `extra`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    name: String,
    input_dir: String,
    output_dir: String,
    mapper: String,
    reducer: String,
    extra: BTreeMap<String, String>,
    files: Vec<PathBuf>,
}

impl TryFrom<RawJobSpec> for JobSpec {
    type Error = CorgiError;

    fn try_from(raw: RawJobSpec) -> std::result::Result<Self, Self::Error> {
        raw.validate()?;

        let RawJobSpec {
            mut properties,
            files,
        } = raw;

        let mut take = |key: &str| {
            properties
                .remove(key)
                .ok_or_else(|| CorgiError::MissingProperty(key.to_string()))
        };

        let name = take(PROP_JOB_NAME)?;
        let input_dir = take(PROP_INPUT_DIR)?;
        let output_dir = take(PROP_OUTPUT_DIR)?;
        let mapper = take(PROP_MAPPER)?;
        let reducer = take(PROP_REDUCER)?;

        Ok(Self {
            name,
            input_dir,
            output_dir,
            mapper,
            reducer,
            extra: properties,
            files,
        })
    }
}

impl JobSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input_dir(&self) -> &str {
        &self.input_dir
    }

    pub fn output_dir(&self) -> &str {
        &self.output_dir
    }

    pub fn mapper(&self) -> &str {
        &self.mapper
    }

    pub fn reducer(&self) -> &str {
        &self.reducer
    }

    /// Optional properties beyond the five required ones.
    pub fn extra(&self) -> &BTreeMap<String, String> {
        &self.extra
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Look up any property by its raw key, required or optional.
    pub fn property(&self, key: &str) -> Option<&str> {
        match key {
            PROP_JOB_NAME => Some(&self.name),
            PROP_INPUT_DIR => Some(&self.input_dir),
            PROP_OUTPUT_DIR => Some(&self.output_dir),
            PROP_MAPPER => Some(&self.mapper),
            PROP_REDUCER => Some(&self.reducer),
            other => self.extra.get(other).map(|s| s.as_str()),
        }
    }
}

impl fmt::Display for JobSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Job:{{")?;
        write!(f, " {PROP_JOB_NAME}:{},", self.name)?;
        write!(f, " {PROP_INPUT_DIR}:{},", self.input_dir)?;
        write!(f, " {PROP_OUTPUT_DIR}:{},", self.output_dir)?;
        write!(f, " {PROP_MAPPER}:{},", self.mapper)?;
        write!(f, " {PROP_REDUCER}:{},", self.reducer)?;
        for (k, v) in &self.extra {
            write!(f, " {k}:{v},")?;
        }
        write!(f, " }}")
    }
}
