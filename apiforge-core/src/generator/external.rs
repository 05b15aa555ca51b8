//! External plugin extension point
//!
//! Runtime-loaded generator backends are subprocesses rather than
//! dynamically imported modules: a plugin named `foo` resolves to an
//! executable `apiforge-generator-foo`, probed first in the workspace's
//! `node_modules/.bin/`, then on PATH. A bare executable named exactly
//! `foo` is accepted when the prefixed form is absent.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::{GenerateRequest, GeneratorContext, GeneratorError, GeneratorPlugin, run_tool};

/// Executable name prefix for external plugins
pub const PLUGIN_PREFIX: &str = "apiforge-generator-";

/// The npm package expected to provide plugin `name`.
pub fn package_name_for(name: &str) -> String {
    format!("{}{}", PLUGIN_PREFIX, name)
}

/// A discovered external backend, invoked as a subprocess.
pub struct ExternalCommandPlugin {
    name: String,
    executable: PathBuf,
}

impl ExternalCommandPlugin {
    /// Candidate executables for `name`, in probe order.
    fn candidates(name: &str, workspace_root: &Path) -> Vec<PathBuf> {
        let prefixed = package_name_for(name);
        vec![
            workspace_root.join("node_modules").join(".bin").join(&prefixed),
            PathBuf::from(&prefixed),
            PathBuf::from(name),
        ]
    }

    /// Probe the candidates by spawning `<exe> --version` with its output
    /// discarded; the first one that runs successfully wins.
    pub async fn discover(name: &str, workspace_root: &Path) -> Option<Self> {
        for candidate in Self::candidates(name, workspace_root) {
            let probe = Command::new(&candidate)
                .arg("--version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await;
            if matches!(probe, Ok(status) if status.success()) {
                debug!("Discovered external generator {} at {}", name, candidate.display());
                return Some(Self { name: name.to_string(), executable: candidate });
            }
        }
        None
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }
}

#[async_trait]
impl GeneratorPlugin for ExternalCommandPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        request: &GenerateRequest,
        context: &GeneratorContext,
    ) -> Result<(), GeneratorError> {
        let options = serde_json::Value::Object(request.options.clone()).to_string();
        let mut command = Command::new(&self.executable);
        command
            .arg("--input")
            .arg(&request.input_spec)
            .arg("--output")
            .arg(&request.output_path)
            .arg("--options")
            .arg(options)
            .current_dir(&context.workspace_root);
        run_tool(&self.executable.display().to_string(), &mut command).await
    }
}
