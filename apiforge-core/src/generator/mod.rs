//! Generator plugin contract
//!
//! A generator plugin turns an OpenAPI specification into source code,
//! typically by wrapping an external CLI tool. Builtin backends are
//! compile-time-checked implementations of `GeneratorPlugin`; runtime
//! plugins go through the subprocess extension point in `external`.

pub mod command;
pub mod external;
pub mod openapi_generator;
pub mod orval;
pub mod schema;

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub use schema::{OptionsSchema, SchemaViolation};

/// Workspace-level context shared by every invocation.
#[derive(Debug, Clone)]
pub struct GeneratorContext {
    pub workspace_root: PathBuf,
    pub workspace_name: String,
}

impl GeneratorContext {
    pub fn new(workspace_root: impl Into<PathBuf>, workspace_name: impl Into<String>) -> Self {
        Self { workspace_root: workspace_root.into(), workspace_name: workspace_name.into() }
    }

    /// Derive a context from a workspace directory: the name comes from
    /// the root package.json if present, otherwise the directory name.
    pub fn discover(workspace_root: impl Into<PathBuf>) -> Self {
        let workspace_root = workspace_root.into();
        let workspace_name = read_package_name(&workspace_root)
            .unwrap_or_else(|| {
                workspace_root
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| "workspace".to_string())
            });
        Self { workspace_root, workspace_name }
    }
}

fn read_package_name(root: &Path) -> Option<String> {
    let content = std::fs::read_to_string(root.join("package.json")).ok()?;
    let manifest: Value = serde_json::from_str(&content).ok()?;
    manifest.get("name")?.as_str().map(String::from)
}

/// One generation invocation: a single spec going to a single output
/// directory, with the task's shared option bag.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub input_spec: String,
    pub output_path: PathBuf,
    pub options: serde_json::Map<String, Value>,
    /// Set when this invocation is one entry of a per-service fan-out
    pub service: Option<String>,
}

/// Errors from a single plugin invocation. Process failures are
/// retryable; option problems are not.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Failed to spawn {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with status {code}")]
    ExitStatus { tool: String, code: i32 },

    #[error("Invalid generator options: {message}")]
    InvalidOptions { message: String },
}

impl GeneratorError {
    /// Whether the dispatcher's retry policy applies. Only process-level
    /// failures are worth retrying; bad options never fix themselves.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GeneratorError::Spawn { .. } | GeneratorError::ExitStatus { .. })
    }
}

/// The pluggable backend capability. Implementations wrap one external
/// codegen tool each.
#[async_trait]
pub trait GeneratorPlugin: Send + Sync {
    /// Unique, case-sensitive backend name
    fn name(&self) -> &str;

    /// Run one generation invocation
    async fn generate(
        &self,
        request: &GenerateRequest,
        context: &GeneratorContext,
    ) -> Result<(), GeneratorError>;

    /// Generator types this backend can emit (informational)
    fn supported_types(&self) -> Vec<String> {
        Vec::new()
    }

    /// Declared option schema, validated by the dispatcher before any
    /// side effect occurs
    fn options_schema(&self) -> Option<OptionsSchema> {
        None
    }
}

impl std::fmt::Debug for dyn GeneratorPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorPlugin").field("name", &self.name()).finish()
    }
}

/// Spawn an external tool with inherited standard streams so the user
/// sees live generator output. A spawn-level error and a non-zero exit
/// are both retryable process failures.
pub(crate) async fn run_tool(
    tool: &str,
    command: &mut tokio::process::Command,
) -> Result<(), GeneratorError> {
    debug!("Running {} {:?}", tool, command.as_std().get_args().collect::<Vec<_>>());
    let status = command
        .status()
        .await
        .map_err(|source| GeneratorError::Spawn { tool: tool.to_string(), source })?;
    if !status.success() {
        return Err(GeneratorError::ExitStatus {
            tool: tool.to_string(),
            code: status.code().unwrap_or(-1),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_context_discover_prefers_package_json_name() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("package.json"), r#"{"name": "acme-monorepo"}"#).unwrap();
        let ctx = GeneratorContext::discover(dir.path());
        assert_eq!(ctx.workspace_name, "acme-monorepo");
    }

    #[test]
    fn test_context_discover_falls_back_to_directory_name() {
        let dir = TempDir::new().unwrap();
        let ctx = GeneratorContext::discover(dir.path());
        assert_eq!(ctx.workspace_name, dir.path().file_name().unwrap().to_string_lossy());
    }

    #[test]
    fn test_process_errors_are_retryable() {
        let spawn = GeneratorError::Spawn {
            tool: "orval".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        let exit = GeneratorError::ExitStatus { tool: "orval".to_string(), code: 1 };
        let options = GeneratorError::InvalidOptions { message: "bad".to_string() };
        assert!(spawn.is_retryable());
        assert!(exit.is_retryable());
        assert!(!options.is_retryable());
    }
}
