use anyhow::Result;
use std::path::Path;

use apiforge_core::discovery::discover_specs;

use crate::cli::app::DiscoverArgs;

pub fn execute(args: DiscoverArgs, workspace: &Path) -> Result<()> {
    let root = args.path.unwrap_or_else(|| workspace.to_path_buf());
    let specs = discover_specs(&root);
    if specs.is_empty() {
        println!("No OpenAPI documents found under {}", root.display());
        return Ok(());
    }
    for spec in specs {
        println!("{} (version {})", spec.path.display(), spec.version);
    }
    Ok(())
}
