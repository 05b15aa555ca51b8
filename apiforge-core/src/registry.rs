//! Generator plugin registry
//!
//! An explicitly constructed registry instance maps backend names to
//! plugin instances. There is no process-wide singleton; callers share
//! one registry via `Arc` when they need the "resolve once, reuse"
//! semantics. Configuration is fixed at construction.

use indexmap::IndexMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{debug, info};

use crate::generator::external::{ExternalCommandPlugin, package_name_for};
use crate::generator::{GeneratorPlugin, command::CommandPlugin, openapi_generator::OpenApiGeneratorPlugin, orval::OrvalPlugin};
use crate::install::{AutoInstaller, InstallOptions, PackageManager};

/// How a plugin was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginSource {
    /// Pre-registered at startup
    Registered,
    /// Found as an external command
    Discovered,
    /// Installed on demand, then found
    Installed,
}

#[derive(Debug, Clone, Default)]
pub struct RegistryOptions {
    /// Install missing backend packages without confirmation
    pub auto_install: bool,
    /// Never prompt, even when `auto_install` is false
    pub skip_prompts: bool,
    /// Override the detected package manager for installs
    pub package_manager: Option<PackageManager>,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Generator '{name}' is not registered. Available generators: {}", .available.join(", "))]
    NotFound { name: String, available: Vec<String> },

    #[error("Generator '{name}' is already registered")]
    Duplicate { name: String },

    #[error("Failed to load generator '{name}': {message}")]
    LoadFailed { name: String, message: String },
}

/// Maps backend name to plugin instance. Entries are never removed by the
/// default flows; `unregister` exists for embedders that manage their own
/// plugin lifecycles.
pub struct GeneratorRegistry {
    options: RegistryOptions,
    plugins: RwLock<IndexMap<String, Arc<dyn GeneratorPlugin>>>,
}

impl GeneratorRegistry {
    pub fn new(options: RegistryOptions) -> Self {
        Self { options, plugins: RwLock::new(IndexMap::new()) }
    }

    /// A registry with the compile-time-known backends registered in
    /// deterministic order.
    pub fn with_builtin_generators(options: RegistryOptions) -> Self {
        let registry = Self::new(options);
        registry
            .register(Arc::new(OpenApiGeneratorPlugin))
            .and_then(|_| registry.register(Arc::new(OrvalPlugin)))
            .and_then(|_| registry.register(Arc::new(CommandPlugin)))
            .unwrap_or_else(|_| unreachable!("builtin names are unique"));
        registry
    }

    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    pub fn register(&self, plugin: Arc<dyn GeneratorPlugin>) -> Result<(), RegistryError> {
        let name = plugin.name().to_string();
        let mut plugins = self.plugins.write().unwrap_or_else(|e| e.into_inner());
        if plugins.contains_key(&name) {
            return Err(RegistryError::Duplicate { name });
        }
        debug!("Registered generator '{}'", name);
        plugins.insert(name, plugin);
        Ok(())
    }

    pub fn unregister(&self, name: &str) -> bool {
        let mut plugins = self.plugins.write().unwrap_or_else(|e| e.into_inner());
        plugins.shift_remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn GeneratorPlugin>, RegistryError> {
        let plugins = self.plugins.read().unwrap_or_else(|e| e.into_inner());
        plugins.get(name).cloned().ok_or_else(|| RegistryError::NotFound {
            name: name.to_string(),
            available: plugins.keys().cloned().collect(),
        })
    }

    /// Registered names, in registration order.
    pub fn available_names(&self) -> Vec<String> {
        let plugins = self.plugins.read().unwrap_or_else(|e| e.into_inner());
        plugins.keys().cloned().collect()
    }

    /// Resolve `name` as an external command, auto-installing its package
    /// when configured to. The install-then-retry happens exactly once;
    /// any further failure is fatal with the underlying message chained.
    pub async fn load_and_register_with_auto_install(
        &self,
        name: &str,
        installer: &AutoInstaller,
    ) -> Result<(Arc<dyn GeneratorPlugin>, PluginSource), RegistryError> {
        let workspace_root = installer.workspace_root().to_path_buf();
        if let Some(plugin) = ExternalCommandPlugin::discover(name, &workspace_root).await {
            let plugin: Arc<dyn GeneratorPlugin> = Arc::new(plugin);
            self.register(plugin.clone())?;
            return Ok((plugin, PluginSource::Discovered));
        }

        if !self.options.auto_install {
            return Err(RegistryError::NotFound {
                name: name.to_string(),
                available: self.available_names(),
            });
        }

        let package = package_name_for(name);
        info!("Generator '{}' not found, attempting to install {}", name, package);
        let install_options = InstallOptions {
            auto_install: self.options.auto_install,
            skip_prompts: self.options.skip_prompts,
            package_manager: self.options.package_manager,
            dev: true,
            additional_args: Vec::new(),
        };
        let outcome = installer.install_plugin(&package, &install_options).await;
        if !outcome.success {
            return Err(RegistryError::LoadFailed {
                name: name.to_string(),
                message: outcome.error.unwrap_or_else(|| "installation failed".to_string()),
            });
        }

        match ExternalCommandPlugin::discover(name, &workspace_root).await {
            Some(plugin) => {
                let plugin: Arc<dyn GeneratorPlugin> = Arc::new(plugin);
                self.register(plugin.clone())?;
                Ok((plugin, PluginSource::Installed))
            }
            None => Err(RegistryError::LoadFailed {
                name: name.to_string(),
                message: format!("installed {} but no generator executable was found", package),
            }),
        }
    }
}
