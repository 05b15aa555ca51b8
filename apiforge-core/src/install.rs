//! On-demand installation of generator backend packages
//!
//! Detects the host project's package manager from its lockfile, checks
//! whether a backend package is already present, and installs it when it
//! is not. Installation failures are reported as values so callers decide
//! whether to escalate. Prompting goes through an injected
//! `ConfirmationProvider` so the installer itself never touches a
//! terminal.

use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Supported package managers, in lockfile detection priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PackageManager {
    #[default]
    Npm,
    Yarn,
    Pnpm,
    Bun,
}

impl PackageManager {
    /// Detect from lockfile presence; first match wins, npm is the
    /// default when no lockfile exists.
    pub fn detect(root: &Path) -> Self {
        let candidates = [
            ("package-lock.json", PackageManager::Npm),
            ("yarn.lock", PackageManager::Yarn),
            ("pnpm-lock.yaml", PackageManager::Pnpm),
            ("bun.lockb", PackageManager::Bun),
            ("bun.lock", PackageManager::Bun),
        ];
        for (lockfile, manager) in candidates {
            if root.join(lockfile).exists() {
                return manager;
            }
        }
        PackageManager::Npm
    }

    pub fn command(&self) -> &'static str {
        match self {
            PackageManager::Npm => {
                if cfg!(windows) { "npm.cmd" } else { "npm" }
            }
            PackageManager::Yarn => {
                if cfg!(windows) { "yarn.cmd" } else { "yarn" }
            }
            PackageManager::Pnpm => {
                if cfg!(windows) { "pnpm.cmd" } else { "pnpm" }
            }
            PackageManager::Bun => {
                if cfg!(windows) { "bun.cmd" } else { "bun" }
            }
        }
    }

    /// Arguments for installing `package`.
    pub fn install_args(&self, package: &str, dev: bool, additional: &[String]) -> Vec<String> {
        let mut args = match self {
            PackageManager::Npm => vec!["install".to_string()],
            PackageManager::Yarn | PackageManager::Pnpm | PackageManager::Bun => {
                vec!["add".to_string()]
            }
        };
        if dev {
            args.push(
                match self {
                    PackageManager::Npm => "--save-dev",
                    PackageManager::Yarn | PackageManager::Bun => "--dev",
                    PackageManager::Pnpm => "-D",
                }
                .to_string(),
            );
        }
        args.push(package.to_string());
        args.extend(additional.iter().cloned());
        args
    }
}

/// Confirmation before installing, abstracted over terminal prompts and
/// non-interactive environments.
pub trait ConfirmationProvider: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// y/N prompt on the controlling terminal.
pub struct TerminalConfirmation;

impl ConfirmationProvider for TerminalConfirmation {
    fn confirm(&self, prompt: &str) -> bool {
        use std::io::{BufRead, Write};
        print!("{} [y/N] ", prompt);
        let _ = std::io::stdout().flush();
        let mut line = String::new();
        if std::io::stdin().lock().read_line(&mut line).is_err() {
            return false;
        }
        matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

/// Always confirms; for tests and forced installs.
pub struct AutoYes;

impl ConfirmationProvider for AutoYes {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Always declines; for tests and locked-down environments.
pub struct AutoNo;

impl ConfirmationProvider for AutoNo {
    fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}

#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    /// Install without asking for confirmation
    pub auto_install: bool,
    /// Proceed without prompting even when `auto_install` is false
    /// (non-interactive/CI environments)
    pub skip_prompts: bool,
    /// Override the detected package manager
    pub package_manager: Option<PackageManager>,
    /// Install as a development dependency
    pub dev: bool,
    /// Extra arguments passed through verbatim
    pub additional_args: Vec<String>,
}

/// Installation result as a value, never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl InstallOutcome {
    fn ok() -> Self {
        Self { success: true, error: None }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self { success: false, error: Some(error.into()) }
    }
}

/// Installs backend packages into the host project.
pub struct AutoInstaller {
    workspace_root: PathBuf,
    confirmation: Box<dyn ConfirmationProvider>,
}

impl AutoInstaller {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self { workspace_root: workspace_root.into(), confirmation: Box::new(TerminalConfirmation) }
    }

    pub fn with_confirmation(mut self, confirmation: Box<dyn ConfirmationProvider>) -> Self {
        self.confirmation = confirmation;
        self
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Whether `package` is already present: listed in package.json
    /// dependencies/devDependencies, or materialized under node_modules.
    pub fn check_plugin_installed(&self, package: &str) -> bool {
        if let Ok(content) = std::fs::read_to_string(self.workspace_root.join("package.json")) {
            if let Ok(manifest) = serde_json::from_str::<Value>(&content) {
                for section in ["dependencies", "devDependencies"] {
                    if manifest
                        .get(section)
                        .and_then(Value::as_object)
                        .is_some_and(|deps| deps.contains_key(package))
                    {
                        return true;
                    }
                }
            }
        }
        self.workspace_root.join("node_modules").join(package).exists()
    }

    pub fn package_manager(&self, options: &InstallOptions) -> PackageManager {
        options.package_manager.unwrap_or_else(|| PackageManager::detect(&self.workspace_root))
    }

    /// Install `package`. Confirmation is required only when neither
    /// `auto_install` nor `skip_prompts` is set.
    pub async fn install_plugin(&self, package: &str, options: &InstallOptions) -> InstallOutcome {
        if !options.auto_install && !options.skip_prompts {
            let prompt = format!("Generator package '{}' is not installed. Install it now?", package);
            if !self.confirmation.confirm(&prompt) {
                return InstallOutcome::failed("declined by user");
            }
        }

        let manager = self.package_manager(options);
        let args = manager.install_args(package, options.dev, &options.additional_args);
        info!("Installing {} with {} {}", package, manager.command(), args.join(" "));

        let output = Command::new(manager.command())
            .args(&args)
            .current_dir(&self.workspace_root)
            .stdin(Stdio::null())
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => {
                debug!("Installed {}", package);
                InstallOutcome::ok()
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let stderr = stderr.trim();
                if stderr.is_empty() {
                    InstallOutcome::failed(format!(
                        "exit code {}",
                        output.status.code().unwrap_or(-1)
                    ))
                } else {
                    InstallOutcome::failed(stderr)
                }
            }
            Err(err) => InstallOutcome::failed(err.to_string()),
        }
    }
}
