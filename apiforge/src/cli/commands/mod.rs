pub mod discover;
pub mod generate;
pub mod generators;
pub mod hash;

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value, json};
use std::path::Path;

use crate::cli::app::TaskSelection;

/// Resolve `(project, target, executor options)` from either a
/// build-graph project file or the direct CLI flags.
pub fn resolve_task_options(
    selection: &TaskSelection,
    workspace: &Path,
) -> Result<(String, String, Value)> {
    if let Some(project_file) = &selection.project_file {
        return resolve_from_project_file(project_file, &selection.target);
    }

    let input_spec = match (&selection.input_spec, selection.service.is_empty()) {
        (Some(_), false) => bail!("--input-spec and --service are mutually exclusive"),
        (Some(spec), true) => json!(spec),
        (None, false) => {
            let mut services = Map::new();
            for pair in &selection.service {
                let (name, spec) = pair
                    .split_once('=')
                    .with_context(|| format!("--service '{}' is not in name=spec form", pair))?;
                services.insert(name.to_string(), json!(spec));
            }
            Value::Object(services)
        }
        (None, true) => bail!("either --input-spec, --service, or --project-file is required"),
    };

    let project = workspace
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "workspace".to_string());

    let mut options = Map::new();
    options.insert("inputSpec".to_string(), input_spec);
    if let Some(output_path) = &selection.output_path {
        options.insert("outputPath".to_string(), json!(output_path.display().to_string()));
    }
    Ok((project, selection.target.clone(), Value::Object(options)))
}

fn resolve_from_project_file(project_file: &Path, target: &str) -> Result<(String, String, Value)> {
    let content = std::fs::read_to_string(project_file)
        .with_context(|| format!("Failed to read {}", project_file.display()))?;
    let config: Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", project_file.display()))?;

    let project = config
        .get("name")
        .and_then(Value::as_str)
        .map(String::from)
        .or_else(|| {
            project_file
                .parent()
                .and_then(|dir| dir.file_name())
                .map(|name| name.to_string_lossy().to_string())
        })
        .unwrap_or_else(|| "project".to_string());

    let options = config
        .get("targets")
        .and_then(|targets| targets.get(target))
        .and_then(|t| t.get("options"))
        .cloned()
        .with_context(|| {
            format!("{} has no target '{}' with options", project_file.display(), target)
        })?;

    Ok((project, target.to_string(), options))
}
