//! Generation task model
//!
//! A `GenerationTask` is one unit of OpenAPI code generation, constructed
//! from the build graph's persisted target configuration. The executor
//! options are validated here before anything touches the filesystem or
//! network.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

/// The input specification for a task: either a single path/URL, or a
/// mapping of service name to path/URL. The mapping preserves insertion
/// order because fan-out iterates it deterministically.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum InputSpec {
    Single(String),
    PerService(IndexMap<String, String>),
}

impl InputSpec {
    /// All spec strings, in fan-out order.
    pub fn specs(&self) -> Vec<&str> {
        match self {
            InputSpec::Single(spec) => vec![spec.as_str()],
            InputSpec::PerService(map) => map.values().map(String::as_str).collect(),
        }
    }
}

/// Executor options as persisted in the build-graph target configuration.
/// Field names are camelCase to match the configuration shape.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateApiOptions {
    pub input_spec: Option<InputSpec>,
    pub output_path: Option<String>,
    pub generator_name: Option<String>,
    pub generator: Option<String>,
    pub generator_options: serde_json::Map<String, Value>,
}

/// Errors raised while validating executor options. These identify the
/// task as `project:target` so the failure is attributable in build logs.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Task {task} is missing required option 'inputSpec'")]
    MissingInputSpec { task: String },

    #[error("Task {task} is missing required option 'outputPath'")]
    MissingOutputPath { task: String },

    #[error("Task {task} has malformed executor options: {source}")]
    InvalidOptions {
        task: String,
        #[source]
        source: serde_json::Error,
    },
}

/// One generation unit, immutable for the duration of an invocation.
#[derive(Debug, Clone)]
pub struct GenerationTask {
    /// Owning build-graph node
    pub project: String,
    /// Target name within the project
    pub target_name: String,
    /// Input specification(s)
    pub input_spec: InputSpec,
    /// Base output directory
    pub output_path: PathBuf,
    /// Selected backend; `None` means the default backend
    pub generator_name: Option<String>,
    /// Opaque backend-specific option bag
    pub generator_options: serde_json::Map<String, Value>,
}

impl GenerationTask {
    /// Build a task from raw executor options, validating the required
    /// fields. `generatorName` takes precedence over the `generator`
    /// alias when both are present.
    pub fn from_target(
        project: &str,
        target_name: &str,
        raw_options: &Value,
    ) -> Result<Self, ValidationError> {
        let task = format!("{}:{}", project, target_name);
        let options: GenerateApiOptions = serde_json::from_value(raw_options.clone())
            .map_err(|source| ValidationError::InvalidOptions { task: task.clone(), source })?;

        let input_spec = options
            .input_spec
            .ok_or_else(|| ValidationError::MissingInputSpec { task: task.clone() })?;
        let output_path = options
            .output_path
            .ok_or_else(|| ValidationError::MissingOutputPath { task: task.clone() })?;

        Ok(Self {
            project: project.to_string(),
            target_name: target_name.to_string(),
            input_spec,
            output_path: PathBuf::from(output_path),
            generator_name: options.generator_name.or(options.generator),
            generator_options: options.generator_options,
        })
    }

    /// `project:target`, the identifier used in diagnostics.
    pub fn id(&self) -> String {
        format!("{}:{}", self.project, self.target_name)
    }
}
