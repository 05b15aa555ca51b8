//! Workspace spec-file discovery
//!
//! Walks a workspace looking for files named like OpenAPI documents and
//! sniffs their top level for an `openapi` or `swagger` version key.
//! That sniff is the ceiling of OpenAPI awareness here; documents are
//! never parsed beyond it.

use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Directories never worth descending into.
const SKIPPED_DIRS: &[&str] = &["node_modules", "dist", "build", "target", "coverage", "tmp"];

/// A file confirmed to carry an OpenAPI/Swagger version key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredSpec {
    pub path: PathBuf,
    /// The declared version, e.g. "3.0.1" or "2.0"
    pub version: String,
}

fn is_walkable(entry: &DirEntry) -> bool {
    // the walk root itself is always entered, whatever it is named
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return true;
    }
    let name = entry.file_name().to_string_lossy();
    !(name.starts_with('.') && name.len() > 1) && !SKIPPED_DIRS.contains(&name.as_ref())
}

/// Whether the file name follows OpenAPI naming conventions.
fn is_candidate_name(name: &str) -> bool {
    let name = name.to_lowercase();
    let has_spec_extension = name.ends_with(".json") || name.ends_with(".yaml") || name.ends_with(".yml");
    if !has_spec_extension {
        return false;
    }
    name.starts_with("openapi.")
        || name.starts_with("swagger.")
        || name.contains(".openapi.")
        || name.contains(".swagger.")
}

/// Extract the version from the document's top-level `openapi` or
/// `swagger` key, if either is present.
fn sniff_version(path: &Path, content: &str) -> Option<String> {
    if path.extension().is_some_and(|ext| ext == "json") {
        let doc: JsonValue = serde_json::from_str(content).ok()?;
        for key in ["openapi", "swagger"] {
            if let Some(version) = doc.get(key).and_then(JsonValue::as_str) {
                return Some(version.to_string());
            }
        }
        return None;
    }
    let doc: YamlValue = serde_yaml::from_str(content).ok()?;
    for key in ["openapi", "swagger"] {
        if let Some(version) = doc.get(key).and_then(YamlValue::as_str) {
            return Some(version.to_string());
        }
    }
    None
}

/// Find OpenAPI documents under `root`, sorted by path.
pub fn discover_specs(root: &Path) -> Vec<DiscoveredSpec> {
    let mut specs = Vec::new();
    for entry in WalkDir::new(root).into_iter().filter_entry(is_walkable).flatten() {
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !is_candidate_name(&name) {
            continue;
        }
        let Ok(content) = std::fs::read_to_string(entry.path()) else {
            continue;
        };
        if let Some(version) = sniff_version(entry.path(), &content) {
            debug!("Discovered spec {} (version {})", entry.path().display(), version);
            specs.push(DiscoveredSpec { path: entry.path().to_path_buf(), version });
        }
    }
    specs.sort_by(|a, b| a.path.cmp(&b.path));
    specs
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_candidate_names() {
        assert!(is_candidate_name("openapi.yaml"));
        assert!(is_candidate_name("swagger.json"));
        assert!(is_candidate_name("users.openapi.yml"));
        assert!(is_candidate_name("OpenAPI.JSON"));
        assert!(!is_candidate_name("openapi.txt"));
        assert!(!is_candidate_name("schema.json"));
    }

    #[test]
    fn test_discovers_yaml_spec_with_version_key() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("apps/users")).unwrap();
        std::fs::write(
            dir.path().join("apps/users/openapi.yaml"),
            "openapi: 3.0.1\ninfo:\n  title: Users\n",
        )
        .unwrap();

        let specs = discover_specs(dir.path());
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].version, "3.0.1");
        assert!(specs[0].path.ends_with("apps/users/openapi.yaml"));
    }

    #[test]
    fn test_ignores_lookalikes_without_version_keys() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("openapi.json"), r#"{"title": "not a spec"}"#).unwrap();
        assert!(discover_specs(dir.path()).is_empty());
    }

    #[test]
    fn test_skips_node_modules_and_hidden_dirs() {
        let dir = TempDir::new().unwrap();
        for sub in ["node_modules/pkg", ".cache"] {
            std::fs::create_dir_all(dir.path().join(sub)).unwrap();
            std::fs::write(dir.path().join(sub).join("openapi.yaml"), "openapi: 3.0.0\n").unwrap();
        }
        assert!(discover_specs(dir.path()).is_empty());
    }

    #[test]
    fn test_swagger_two_documents_are_found() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("swagger.json"), r#"{"swagger": "2.0"}"#).unwrap();
        let specs = discover_specs(dir.path());
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].version, "2.0");
    }
}
