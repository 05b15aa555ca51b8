//! Orval backend
//!
//! Wraps the `orval` CLI (npm package `orval`), which generates
//! TypeScript clients from OpenAPI documents.

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;

use super::schema::{OptionsSchema, PropertyType};
use super::{GenerateRequest, GeneratorContext, GeneratorError, GeneratorPlugin, run_tool};

pub const PACKAGE_NAME: &str = "orval";

pub struct OrvalPlugin;

impl OrvalPlugin {
    fn build_args(request: &GenerateRequest) -> Vec<String> {
        let mut args = vec![
            "--input".to_string(),
            request.input_spec.clone(),
            "--output".to_string(),
            request.output_path.display().to_string(),
        ];
        if let Some(config) = request.options.get("config").and_then(Value::as_str) {
            args.push("--config".to_string());
            args.push(config.to_string());
        }
        args
    }

    fn executable() -> &'static str {
        if cfg!(windows) { "orval.cmd" } else { "orval" }
    }
}

#[async_trait]
impl GeneratorPlugin for OrvalPlugin {
    fn name(&self) -> &str {
        "orval"
    }

    async fn generate(
        &self,
        request: &GenerateRequest,
        context: &GeneratorContext,
    ) -> Result<(), GeneratorError> {
        let mut command = Command::new(Self::executable());
        command.args(Self::build_args(request)).current_dir(&context.workspace_root);
        run_tool("orval", &mut command).await
    }

    fn supported_types(&self) -> Vec<String> {
        ["axios", "react-query", "swr", "angular", "zod"].iter().map(|s| s.to_string()).collect()
    }

    fn options_schema(&self) -> Option<OptionsSchema> {
        Some(OptionsSchema::new().optional("config", PropertyType::String))
    }
}
