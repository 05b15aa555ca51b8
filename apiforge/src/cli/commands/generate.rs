use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use apiforge_core::ignore::ensure_ignore_entry;
use apiforge_core::{
    AutoInstaller, Dispatcher, GenerationTask, GeneratorContext, GeneratorRegistry,
    RegistryOptions, RetryPolicy,
};

use super::resolve_task_options;
use crate::cli::app::GenerateArgs;

pub async fn execute(args: GenerateArgs, workspace: PathBuf) -> Result<()> {
    let (project, target, mut options) = resolve_task_options(&args.task, &workspace)?;

    // direct flags override whatever the project file carries
    let option_map = options.as_object_mut().context("executor options must be an object")?;
    if let Some(generator) = &args.generator {
        option_map.insert("generatorName".to_string(), Value::String(generator.clone()));
    }
    if let Some(raw) = &args.generator_options {
        let parsed: Value =
            serde_json::from_str(raw).context("--generator-options must be a JSON object")?;
        if !parsed.is_object() {
            bail!("--generator-options must be a JSON object");
        }
        option_map.insert("generatorOptions".to_string(), parsed);
    }

    let task = GenerationTask::from_target(&project, &target, &options)?;

    let registry = Arc::new(GeneratorRegistry::with_builtin_generators(RegistryOptions {
        auto_install: args.auto_install,
        skip_prompts: args.skip_prompts,
        package_manager: None,
    }));
    let installer = Arc::new(AutoInstaller::new(&workspace));
    let mut dispatcher = Dispatcher::new(registry, installer);
    if let Some(max_attempts) = args.max_attempts {
        dispatcher =
            dispatcher.with_retry_policy(RetryPolicy::new(max_attempts, Duration::from_secs(1), 2.0));
    }

    let context = GeneratorContext::discover(&workspace);
    let result = dispatcher.generate(&task, &context).await?;
    for path in &result.output_paths {
        println!("{}", path.display());
    }

    let entry = task.output_path.display().to_string();
    if args.update_gitignore && ensure_ignore_entry(&workspace.join(".gitignore"), &entry)? {
        info!("Added {} to .gitignore", entry);
    }
    if args.update_prettierignore
        && ensure_ignore_entry(&workspace.join(".prettierignore"), &entry)?
    {
        info!("Added {} to .prettierignore", entry);
    }
    Ok(())
}
