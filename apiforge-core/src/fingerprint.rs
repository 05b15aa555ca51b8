//! Cache-key computation for generation tasks
//!
//! The fingerprint combines the build graph's base task hash with the
//! identity and content of every input specification, so the cache
//! invalidates whenever the spec content, the spec location, or the
//! underlying task definition changes. Local files and remote URLs take
//! divergent paths with deliberately asymmetric failure behavior: a
//! missing local file degrades to base-hash-only caching, an unreachable
//! URL fails hard.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::task::{GenerationTask, InputSpec, ValidationError};

/// The value/details pair handed to the external build system. `details`
/// are passed through unchanged from the base hasher.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TaskHash {
    pub value: String,
    pub details: TaskHashDetails,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskHashDetails {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub nodes: indexmap::IndexMap<String, String>,
    #[serde(default)]
    pub implicit_deps: indexmap::IndexMap<String, String>,
    #[serde(default)]
    pub runtime: indexmap::IndexMap<String, String>,
}

impl TaskHash {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into(), details: TaskHashDetails::default() }
    }
}

/// What to do when a local spec file does not exist. The default degrades
/// to base-hash-only caching rather than failing the whole task; strict
/// callers can opt into an error instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingLocalSpecPolicy {
    #[default]
    FallbackToBaseHash,
    Error,
}

#[derive(Debug, Error)]
pub enum FingerprintError {
    #[error(transparent)]
    InvalidOptions(#[from] ValidationError),

    #[error("Failed to fetch remote OpenAPI spec: {status}")]
    Fetch { status: String },

    #[error("Failed to request remote OpenAPI spec: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to read OpenAPI spec at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("OpenAPI spec not found at {path}")]
    MissingSpec { path: PathBuf },
}

/// Computes content fingerprints for input specifications.
pub struct SpecFingerprinter {
    workspace_root: PathBuf,
    policy: MissingLocalSpecPolicy,
}

impl SpecFingerprinter {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self { workspace_root: workspace_root.into(), policy: MissingLocalSpecPolicy::default() }
    }

    pub fn with_policy(mut self, policy: MissingLocalSpecPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Fold every spec of `input_spec` into `base_value`, in fan-out
    /// order. Each existing spec contributes its identifier (literal path
    /// or URL string) and the SHA-256 digest of its raw content.
    pub async fn fingerprint(
        &self,
        base_value: &str,
        input_spec: &InputSpec,
    ) -> Result<String, FingerprintError> {
        let mut value = base_value.to_string();
        for spec in input_spec.specs() {
            value = self.fold_spec(&value, spec).await?;
        }
        Ok(value)
    }

    async fn fold_spec(&self, prev: &str, spec: &str) -> Result<String, FingerprintError> {
        // A strict URL parse (scheme required) decides remote vs local.
        if let Ok(url) = Url::parse(spec) {
            return self.fold_remote(prev, &url).await;
        }
        self.fold_local(prev, spec).await
    }

    async fn fold_local(&self, prev: &str, spec: &str) -> Result<String, FingerprintError> {
        let path = self.workspace_root.join(spec);
        if !path.exists() {
            return match self.policy {
                MissingLocalSpecPolicy::FallbackToBaseHash => {
                    warn!("Spec file {} not found, falling back to base hash", path.display());
                    Ok(prev.to_string())
                }
                MissingLocalSpecPolicy::Error => Err(FingerprintError::MissingSpec { path }),
            };
        }
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| FingerprintError::Io { path: path.clone(), source })?;
        let digest = sha256_hex(content.as_bytes());
        debug!("Hashed local spec {} ({})", path.display(), digest);
        Ok(combine(&[prev, &path.display().to_string(), &digest]))
    }

    async fn fold_remote(&self, prev: &str, url: &Url) -> Result<String, FingerprintError> {
        debug!("Fetching remote spec {}", url);
        let response = reqwest::get(url.as_str()).await?;
        if !response.status().is_success() {
            let status = response.status();
            return Err(FingerprintError::Fetch {
                status: status.canonical_reason().unwrap_or(status.as_str()).to_string(),
            });
        }
        let body = response.text().await?;
        let digest = sha256_hex(body.as_bytes());
        Ok(combine(&[prev, url.as_str(), &digest]))
    }
}

/// Validate a task's executor options and compute its cache key. Option
/// validation happens before either resolution branch runs; the base
/// hash details pass through unchanged.
pub async fn hash_generate_api_task(
    project: &str,
    target_name: &str,
    raw_options: &serde_json::Value,
    base: &TaskHash,
    workspace_root: &Path,
) -> Result<TaskHash, FingerprintError> {
    let task = GenerationTask::from_target(project, target_name, raw_options)?;
    let fingerprinter = SpecFingerprinter::new(workspace_root);
    let value = fingerprinter.fingerprint(&base.value, &task.input_spec).await?;
    Ok(TaskHash { value, details: base.details.clone() })
}

/// SHA-256 hex digest of raw bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Order- and content-sensitive combination: each part is folded into one
/// SHA-256 with a length prefix, so part boundaries cannot be confused.
fn combine(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}
