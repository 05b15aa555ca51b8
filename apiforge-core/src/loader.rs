//! Plugin resolution
//!
//! Resolves a backend name through a fixed chain: registry lookup first,
//! then external-command discovery, then install-and-retry when
//! auto-install is enabled. A name already in the registry is never
//! re-probed or re-installed.

use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::generator::GeneratorPlugin;
use crate::install::AutoInstaller;
use crate::registry::{GeneratorRegistry, PluginSource, RegistryError};

/// A resolved plugin together with how it was resolved.
#[derive(Debug)]
pub struct LoadedPlugin {
    pub plugin: Arc<dyn GeneratorPlugin>,
    pub source: PluginSource,
}

#[derive(Debug, Error)]
#[error(
    "Generator '{name}' could not be resolved (tried: {}). Available generators: {}",
    .tried.join(", "),
    .available.join(", ")
)]
pub struct PluginNotFoundError {
    pub name: String,
    pub tried: Vec<String>,
    pub available: Vec<String>,
    #[source]
    source: Option<RegistryError>,
}

/// Resolves backend names against a registry, installing missing
/// packages through the injected installer when configured to.
pub struct PluginLoader {
    registry: Arc<GeneratorRegistry>,
    installer: Arc<AutoInstaller>,
}

impl PluginLoader {
    pub fn new(registry: Arc<GeneratorRegistry>, installer: Arc<AutoInstaller>) -> Self {
        Self { registry, installer }
    }

    pub async fn load(&self, name: &str) -> Result<LoadedPlugin, PluginNotFoundError> {
        if let Ok(plugin) = self.registry.get(name) {
            debug!("Resolved generator '{}' from registry", name);
            return Ok(LoadedPlugin { plugin, source: PluginSource::Registered });
        }

        match self.registry.load_and_register_with_auto_install(name, &self.installer).await {
            Ok((plugin, source)) => Ok(LoadedPlugin { plugin, source }),
            Err(err) => {
                let mut tried =
                    vec!["registry lookup".to_string(), "external command discovery".to_string()];
                if self.registry.options().auto_install {
                    tried.push("auto-install".to_string());
                }
                Err(PluginNotFoundError {
                    name: name.to_string(),
                    tried,
                    available: self.registry.available_names(),
                    source: Some(err),
                })
            }
        }
    }
}
