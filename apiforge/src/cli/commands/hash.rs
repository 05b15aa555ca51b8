use anyhow::Result;
use std::path::PathBuf;

use apiforge_core::TaskHash;
use apiforge_core::fingerprint::hash_generate_api_task;

use super::resolve_task_options;
use crate::cli::app::HashArgs;

pub async fn execute(args: HashArgs, workspace: PathBuf) -> Result<()> {
    let (project, target, options) = resolve_task_options(&args.task, &workspace)?;
    let base = TaskHash::new(args.base_hash);
    let hash = hash_generate_api_task(&project, &target, &options, &base, &workspace).await?;
    println!("{}", serde_json::to_string_pretty(&hash)?);
    Ok(())
}
