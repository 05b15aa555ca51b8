use anyhow::Result;
use std::path::Path;

use apiforge_core::{GeneratorRegistry, PackageManager, RegistryOptions};

pub fn execute(workspace: &Path) -> Result<()> {
    let registry = GeneratorRegistry::with_builtin_generators(RegistryOptions::default());
    println!("Registered generators:");
    for name in registry.available_names() {
        let plugin = registry.get(&name)?;
        let types = plugin.supported_types();
        if types.is_empty() {
            println!("  {}", name);
        } else {
            println!("  {} ({})", name, types.join(", "));
        }
    }
    println!("Package manager: {}", PackageManager::detect(workspace).command());
    Ok(())
}
