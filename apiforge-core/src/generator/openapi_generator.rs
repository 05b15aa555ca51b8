//! Default backend wrapping the OpenAPI Generator CLI
//!
//! Invokes the `openapi-generator-cli` executable (npm package
//! `@openapitools/openapi-generator-cli`) with arguments built from the
//! task's option bag. The actual spec-to-code transformation is entirely
//! the tool's business.

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;

use super::schema::{OptionsSchema, PropertyType};
use super::{GenerateRequest, GeneratorContext, GeneratorError, GeneratorPlugin, run_tool};

/// npm package providing the CLI
pub const PACKAGE_NAME: &str = "@openapitools/openapi-generator-cli";

pub struct OpenApiGeneratorPlugin;

impl OpenApiGeneratorPlugin {
    /// Translate the option bag into CLI arguments. `generatorType` is
    /// required; everything else maps to an optional flag.
    fn build_args(request: &GenerateRequest) -> Result<Vec<String>, GeneratorError> {
        let opts = &request.options;
        let generator_type = opts
            .get("generatorType")
            .and_then(Value::as_str)
            .ok_or_else(|| GeneratorError::InvalidOptions {
                message: "'generatorType' is required".to_string(),
            })?;

        let mut args = vec![
            "generate".to_string(),
            "-i".to_string(),
            request.input_spec.clone(),
            "-o".to_string(),
            request.output_path.display().to_string(),
            "-g".to_string(),
            generator_type.to_string(),
        ];

        let string_flags = [
            ("additionalProperties", "--additional-properties"),
            ("configFile", "-c"),
            ("templateDirectory", "-t"),
            ("auth", "--auth"),
            ("globalProperties", "--global-property"),
            ("gitUserId", "--git-user-id"),
            ("gitRepoId", "--git-repo-id"),
        ];
        for (key, flag) in string_flags {
            if let Some(value) = opts.get(key).and_then(Value::as_str) {
                args.push(flag.to_string());
                args.push(value.to_string());
            }
        }
        if opts.get("skipValidateSpec").and_then(Value::as_bool) == Some(true) {
            args.push("--skip-validate-spec".to_string());
        }
        Ok(args)
    }

    fn executable() -> &'static str {
        if cfg!(windows) { "openapi-generator-cli.cmd" } else { "openapi-generator-cli" }
    }
}

#[async_trait]
impl GeneratorPlugin for OpenApiGeneratorPlugin {
    fn name(&self) -> &str {
        "openapi-generator"
    }

    async fn generate(
        &self,
        request: &GenerateRequest,
        context: &GeneratorContext,
    ) -> Result<(), GeneratorError> {
        let args = Self::build_args(request)?;
        let mut command = Command::new(Self::executable());
        command.args(&args).current_dir(&context.workspace_root);
        run_tool("openapi-generator-cli", &mut command).await
    }

    fn supported_types(&self) -> Vec<String> {
        [
            "typescript-axios",
            "typescript-fetch",
            "typescript-angular",
            "typescript-node",
            "javascript",
            "rust",
            "go",
            "python",
            "java",
            "kotlin",
            "csharp",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn options_schema(&self) -> Option<OptionsSchema> {
        Some(
            OptionsSchema::new()
                .required("generatorType", PropertyType::String)
                .optional("additionalProperties", PropertyType::String)
                .optional("configFile", PropertyType::String)
                .optional("templateDirectory", PropertyType::String)
                .optional("auth", PropertyType::String)
                .optional("skipValidateSpec", PropertyType::Bool)
                .optional("globalProperties", PropertyType::String)
                .optional("gitUserId", PropertyType::String)
                .optional("gitRepoId", PropertyType::String),
        )
    }
}
