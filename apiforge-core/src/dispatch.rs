//! Generation dispatch
//!
//! Resolves the task's backend, validates its options, fans out over
//! one-or-many input specifications, and runs each invocation under a
//! retry policy. Fan-out entries execute sequentially, never
//! concurrently: backend CLIs routinely share caches and global tool
//! state that is unsafe to race on. One entry exhausting its retries
//! aborts the remaining entries; earlier entries' outputs stay on disk.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::generator::schema::SchemaViolation;
use crate::generator::{GenerateRequest, GeneratorContext, GeneratorError};
use crate::install::AutoInstaller;
use crate::loader::{PluginLoader, PluginNotFoundError};
use crate::registry::GeneratorRegistry;
use crate::task::{GenerationTask, InputSpec};

/// Backend used when the task does not name one.
pub const DEFAULT_GENERATOR: &str = "openapi-generator";

/// Retry configuration for one plugin invocation. The delay multiplies by
/// the backoff factor after each failed attempt.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, delay: Duration::from_secs(1), backoff_multiplier: 2.0 }
    }
}

impl RetryPolicy {
    /// `max_attempts` is clamped to at least one attempt.
    pub fn new(max_attempts: u32, delay: Duration, backoff_multiplier: f64) -> Self {
        Self { max_attempts: max_attempts.max(1), delay, backoff_multiplier }
    }
}

/// One fan-out entry: a single spec going to a single output directory.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceFanoutEntry {
    pub service: Option<String>,
    pub input_spec: String,
    pub output_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct GenerationResult {
    /// Output directories written, in fan-out order
    pub output_paths: Vec<PathBuf>,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Plugin(#[from] PluginNotFoundError),

    #[error("Invalid options for generator '{generator}': {}", .violations.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Schema { generator: String, violations: Vec<SchemaViolation> },

    #[error("Failed to clean output directory {path}: {source}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to generate code after {attempts} attempts{}", service_suffix(.service))]
    RetriesExhausted {
        attempts: u32,
        service: Option<String>,
        #[source]
        source: GeneratorError,
    },

    #[error("Generation failed{}: {source}", service_suffix(.service))]
    Generator {
        service: Option<String>,
        #[source]
        source: GeneratorError,
    },
}

fn service_suffix(service: &Option<String>) -> String {
    match service {
        Some(service) => format!(" for service '{}'", service),
        None => String::new(),
    }
}

/// Runs generation tasks end to end.
pub struct Dispatcher {
    loader: PluginLoader,
    retry: RetryPolicy,
}

impl Dispatcher {
    pub fn new(registry: Arc<GeneratorRegistry>, installer: Arc<AutoInstaller>) -> Self {
        Self { loader: PluginLoader::new(registry, installer), retry: RetryPolicy::default() }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Normalize the task's input into fan-out entries. A single spec
    /// targets the base output directory; a mapping targets one
    /// subdirectory per service, in insertion order.
    pub fn fan_out(task: &GenerationTask) -> Vec<ServiceFanoutEntry> {
        match &task.input_spec {
            InputSpec::Single(spec) => vec![ServiceFanoutEntry {
                service: None,
                input_spec: spec.clone(),
                output_path: task.output_path.clone(),
            }],
            InputSpec::PerService(map) => map
                .iter()
                .map(|(service, spec)| ServiceFanoutEntry {
                    service: Some(service.clone()),
                    input_spec: spec.clone(),
                    output_path: task.output_path.join(service),
                })
                .collect(),
        }
    }

    pub async fn generate(
        &self,
        task: &GenerationTask,
        context: &GeneratorContext,
    ) -> Result<GenerationResult, GenerationError> {
        let generator = task.generator_name.as_deref().unwrap_or(DEFAULT_GENERATOR);
        let loaded = self.loader.load(generator).await?;
        debug!("Resolved generator '{}' ({:?})", generator, loaded.source);

        // Option validation is fatal before any side effect occurs.
        if let Some(schema) = loaded.plugin.options_schema() {
            let violations = schema.validate(&task.generator_options);
            if !violations.is_empty() {
                return Err(GenerationError::Schema {
                    generator: generator.to_string(),
                    violations,
                });
            }
        }

        let entries = Self::fan_out(task);
        let mut output_paths = Vec::with_capacity(entries.len());
        for entry in entries {
            self.clean_output(context, &entry).await?;
            let request = GenerateRequest {
                input_spec: entry.input_spec.clone(),
                output_path: entry.output_path.clone(),
                options: task.generator_options.clone(),
                service: entry.service.clone(),
            };
            self.generate_with_retry(&loaded.plugin, &request, context).await?;
            output_paths.push(entry.output_path);
        }

        info!("Task {} generated {} output path(s)", task.id(), output_paths.len());
        Ok(GenerationResult { output_paths })
    }

    /// Recursively delete the entry's resolved output directory. Absence
    /// is not an error; the deletion is what makes regeneration
    /// idempotent.
    async fn clean_output(
        &self,
        context: &GeneratorContext,
        entry: &ServiceFanoutEntry,
    ) -> Result<(), GenerationError> {
        let resolved = if entry.output_path.is_absolute() {
            entry.output_path.clone()
        } else {
            context.workspace_root.join(&entry.output_path)
        };
        if resolved.exists() {
            debug!("Cleaning output directory {}", resolved.display());
            tokio::fs::remove_dir_all(&resolved)
                .await
                .map_err(|source| GenerationError::Cleanup { path: resolved, source })?;
        }
        Ok(())
    }

    async fn generate_with_retry(
        &self,
        plugin: &Arc<dyn crate::generator::GeneratorPlugin>,
        request: &GenerateRequest,
        context: &GeneratorContext,
    ) -> Result<(), GenerationError> {
        let mut delay = self.retry.delay;
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match plugin.generate(request, context).await {
                Ok(()) => return Ok(()),
                Err(err) if err.is_retryable() && attempt < self.retry.max_attempts => {
                    warn!(
                        "Generation attempt {}/{} failed: {}",
                        attempt, self.retry.max_attempts, err
                    );
                    tokio::time::sleep(delay).await;
                    delay = delay.mul_f64(self.retry.backoff_multiplier);
                }
                Err(err) if err.is_retryable() => {
                    return Err(GenerationError::RetriesExhausted {
                        attempts: attempt,
                        service: request.service.clone(),
                        source: err,
                    });
                }
                Err(err) => {
                    return Err(GenerationError::Generator {
                        service: request.service.clone(),
                        source: err,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::GeneratorPlugin;
    use crate::generator::schema::{OptionsSchema, PropertyType};
    use crate::install::AutoNo;
    use crate::registry::RegistryOptions;
    use async_trait::async_trait;
    use indexmap::IndexMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tempfile::TempDir;

    /// Records every invocation and fails the first `failures` attempts.
    struct ScriptedPlugin {
        invocations: Mutex<Vec<(String, PathBuf, Option<String>)>>,
        failures: AtomicU32,
        schema: Option<OptionsSchema>,
    }

    impl ScriptedPlugin {
        fn new(failures: u32) -> Self {
            Self { invocations: Mutex::new(Vec::new()), failures: AtomicU32::new(failures), schema: None }
        }

        fn with_schema(mut self, schema: OptionsSchema) -> Self {
            self.schema = Some(schema);
            self
        }

        fn invocations(&self) -> Vec<(String, PathBuf, Option<String>)> {
            self.invocations.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GeneratorPlugin for ScriptedPlugin {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(
            &self,
            request: &GenerateRequest,
            _context: &GeneratorContext,
        ) -> Result<(), GeneratorError> {
            self.invocations.lock().unwrap().push((
                request.input_spec.clone(),
                request.output_path.clone(),
                request.service.clone(),
            ));
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                return Err(GeneratorError::ExitStatus { tool: "scripted".to_string(), code: 1 });
            }
            Ok(())
        }

        fn options_schema(&self) -> Option<OptionsSchema> {
            self.schema.clone()
        }
    }

    fn dispatcher(dir: &TempDir, plugin: Arc<ScriptedPlugin>, max_attempts: u32) -> Dispatcher {
        let registry = Arc::new(GeneratorRegistry::new(RegistryOptions::default()));
        registry.register(plugin).unwrap();
        let installer =
            Arc::new(AutoInstaller::new(dir.path()).with_confirmation(Box::new(AutoNo)));
        Dispatcher::new(registry, installer).with_retry_policy(RetryPolicy::new(
            max_attempts,
            Duration::from_millis(1),
            2.0,
        ))
    }

    fn single_task(generator: &str) -> GenerationTask {
        GenerationTask {
            project: "my-api".to_string(),
            target_name: "generate-api".to_string(),
            input_spec: InputSpec::Single("swagger.json".to_string()),
            output_path: PathBuf::from("libs/api"),
            generator_name: Some(generator.to_string()),
            generator_options: serde_json::Map::new(),
        }
    }

    fn mapped_task(services: &[(&str, &str)], base: &str) -> GenerationTask {
        let mut map = IndexMap::new();
        for (service, spec) in services {
            map.insert(service.to_string(), spec.to_string());
        }
        GenerationTask {
            project: "my-api".to_string(),
            target_name: "generate-api".to_string(),
            input_spec: InputSpec::PerService(map),
            output_path: PathBuf::from(base),
            generator_name: Some("scripted".to_string()),
            generator_options: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_fan_out_single_targets_base_output() {
        let entries = Dispatcher::fan_out(&single_task("scripted"));
        assert_eq!(
            entries,
            vec![ServiceFanoutEntry {
                service: None,
                input_spec: "swagger.json".to_string(),
                output_path: PathBuf::from("libs/api"),
            }]
        );
    }

    #[test]
    fn test_fan_out_mapping_joins_service_names_in_order() {
        let task = mapped_task(&[("users", "users.yaml"), ("products", "products.yaml")], "src/api");
        let entries = Dispatcher::fan_out(&task);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].output_path, PathBuf::from("src/api/users"));
        assert_eq!(entries[1].output_path, PathBuf::from("src/api/products"));
    }

    #[tokio::test]
    async fn test_mapping_invokes_backend_once_per_service_in_order() {
        let dir = TempDir::new().unwrap();
        let plugin = Arc::new(ScriptedPlugin::new(0));
        let dispatcher = dispatcher(&dir, plugin.clone(), 3);
        let task = mapped_task(&[("users", "users.yaml"), ("products", "products.yaml")], "src/api");
        let context = GeneratorContext::new(dir.path(), "test");

        let result = dispatcher.generate(&task, &context).await.unwrap();
        assert_eq!(
            result.output_paths,
            vec![PathBuf::from("src/api/users"), PathBuf::from("src/api/products")]
        );
        let invocations = plugin.invocations();
        assert_eq!(invocations.len(), 2);
        assert_eq!(invocations[0].0, "users.yaml");
        assert_eq!(invocations[0].2.as_deref(), Some("users"));
        assert_eq!(invocations[1].0, "products.yaml");
    }

    #[tokio::test]
    async fn test_output_directories_are_cleaned_before_generation() {
        let dir = TempDir::new().unwrap();
        let stale = dir.path().join("src/api/users/stale.ts");
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, "old").unwrap();

        let plugin = Arc::new(ScriptedPlugin::new(0));
        let dispatcher = dispatcher(&dir, plugin, 3);
        let task = mapped_task(&[("users", "users.yaml")], "src/api");
        let context = GeneratorContext::new(dir.path(), "test");

        dispatcher.generate(&task, &context).await.unwrap();
        assert!(!stale.exists());
    }

    #[tokio::test]
    async fn test_single_attempt_policy_fails_without_retry() {
        let dir = TempDir::new().unwrap();
        let plugin = Arc::new(ScriptedPlugin::new(u32::MAX));
        let dispatcher = dispatcher(&dir, plugin.clone(), 1);
        let context = GeneratorContext::new(dir.path(), "test");

        let err = dispatcher.generate(&single_task("scripted"), &context).await.unwrap_err();
        assert!(err.to_string().starts_with("Failed to generate code after 1 attempts"));
        assert_eq!(plugin.invocations().len(), 1);
    }

    #[tokio::test]
    async fn test_three_attempts_occur_before_exhaustion() {
        let dir = TempDir::new().unwrap();
        let plugin = Arc::new(ScriptedPlugin::new(u32::MAX));
        let dispatcher = dispatcher(&dir, plugin.clone(), 3);
        let context = GeneratorContext::new(dir.path(), "test");

        let err = dispatcher.generate(&single_task("scripted"), &context).await.unwrap_err();
        assert!(err.to_string().starts_with("Failed to generate code after 3 attempts"));
        assert_eq!(plugin.invocations().len(), 3);
    }

    #[tokio::test]
    async fn test_transient_failure_recovers_within_budget() {
        let dir = TempDir::new().unwrap();
        let plugin = Arc::new(ScriptedPlugin::new(1));
        let dispatcher = dispatcher(&dir, plugin.clone(), 3);
        let context = GeneratorContext::new(dir.path(), "test");

        dispatcher.generate(&single_task("scripted"), &context).await.unwrap();
        assert_eq!(plugin.invocations().len(), 2);
    }

    #[tokio::test]
    async fn test_exhausted_service_aborts_remaining_fan_out() {
        let dir = TempDir::new().unwrap();
        let plugin = Arc::new(ScriptedPlugin::new(u32::MAX));
        let dispatcher = dispatcher(&dir, plugin.clone(), 2);
        let task = mapped_task(&[("users", "users.yaml"), ("products", "products.yaml")], "src/api");
        let context = GeneratorContext::new(dir.path(), "test");

        let err = dispatcher.generate(&task, &context).await.unwrap_err();
        assert!(matches!(err, GenerationError::RetriesExhausted { service: Some(ref s), .. } if s.as_str() == "users"));
        // the second service was never attempted
        let invocations = plugin.invocations();
        assert!(invocations.iter().all(|(spec, _, _)| spec == "users.yaml"));
    }

    #[tokio::test]
    async fn test_schema_violation_produces_no_side_effects() {
        let dir = TempDir::new().unwrap();
        let stale = dir.path().join("libs/api/keep.ts");
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, "keep").unwrap();

        let schema = OptionsSchema::new().required("generatorType", PropertyType::String);
        let plugin = Arc::new(ScriptedPlugin::new(0).with_schema(schema));
        let dispatcher = dispatcher(&dir, plugin.clone(), 3);
        let context = GeneratorContext::new(dir.path(), "test");

        let err = dispatcher.generate(&single_task("scripted"), &context).await.unwrap_err();
        assert!(matches!(err, GenerationError::Schema { .. }));
        assert!(plugin.invocations().is_empty());
        assert!(stale.exists());
    }

    #[tokio::test]
    async fn test_non_retryable_error_is_not_retried() {
        struct BadOptionsPlugin {
            calls: AtomicU32,
        }

        #[async_trait]
        impl GeneratorPlugin for BadOptionsPlugin {
            fn name(&self) -> &str {
                "bad-options"
            }

            async fn generate(
                &self,
                _request: &GenerateRequest,
                _context: &GeneratorContext,
            ) -> Result<(), GeneratorError> {
                self.calls.fetch_add(1, Ordering::SeqCst);
                Err(GeneratorError::InvalidOptions { message: "nope".to_string() })
            }
        }

        let dir = TempDir::new().unwrap();
        let registry = Arc::new(GeneratorRegistry::new(RegistryOptions::default()));
        let plugin = Arc::new(BadOptionsPlugin { calls: AtomicU32::new(0) });
        registry.register(plugin.clone()).unwrap();
        let installer =
            Arc::new(AutoInstaller::new(dir.path()).with_confirmation(Box::new(AutoNo)));
        let dispatcher = Dispatcher::new(registry, installer)
            .with_retry_policy(RetryPolicy::new(3, Duration::from_millis(1), 2.0));
        let context = GeneratorContext::new(dir.path(), "test");

        let err = dispatcher.generate(&single_task("bad-options"), &context).await.unwrap_err();
        assert!(matches!(err, GenerationError::Generator { .. }));
        assert_eq!(plugin.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_generator_fails_before_cleanup() {
        let dir = TempDir::new().unwrap();
        let stale = dir.path().join("libs/api/keep.ts");
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, "keep").unwrap();

        let plugin = Arc::new(ScriptedPlugin::new(0));
        let dispatcher = dispatcher(&dir, plugin, 3);
        let context = GeneratorContext::new(dir.path(), "test");

        let err = dispatcher
            .generate(&single_task("definitely-not-installed-anywhere"), &context)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Plugin(_)));
        assert!(stale.exists());
    }

    #[test]
    fn test_retry_policy_clamps_to_one_attempt() {
        let policy = RetryPolicy::new(0, Duration::from_millis(1), 2.0);
        assert_eq!(policy.max_attempts, 1);
    }
}
