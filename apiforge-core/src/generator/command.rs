//! Generic command-template backend
//!
//! Runs an arbitrary user-supplied command with `{input}` / `{output}`
//! placeholder substitution in its arguments, for codegen tools that have
//! no dedicated backend.

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;

use super::schema::{OptionsSchema, PropertyType};
use super::{GenerateRequest, GeneratorContext, GeneratorError, GeneratorPlugin, run_tool};

pub struct CommandPlugin;

impl CommandPlugin {
    fn build_invocation(request: &GenerateRequest) -> Result<(String, Vec<String>), GeneratorError> {
        let command = request
            .options
            .get("command")
            .and_then(Value::as_str)
            .ok_or_else(|| GeneratorError::InvalidOptions {
                message: "'command' is required".to_string(),
            })?
            .to_string();

        let output = request.output_path.display().to_string();
        let args = request
            .options
            .get("args")
            .and_then(Value::as_array)
            .map(|args| {
                args.iter()
                    .filter_map(Value::as_str)
                    .map(|arg| {
                        arg.replace("{input}", &request.input_spec).replace("{output}", &output)
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok((command, args))
    }
}

#[async_trait]
impl GeneratorPlugin for CommandPlugin {
    fn name(&self) -> &str {
        "command"
    }

    async fn generate(
        &self,
        request: &GenerateRequest,
        context: &GeneratorContext,
    ) -> Result<(), GeneratorError> {
        let (program, args) = Self::build_invocation(request)?;
        let mut command = Command::new(&program);
        command.args(&args).current_dir(&context.workspace_root);
        run_tool(&program, &mut command).await
    }

    fn options_schema(&self) -> Option<OptionsSchema> {
        Some(
            OptionsSchema::new()
                .required("command", PropertyType::String)
                .optional("args", PropertyType::Array)
                .closed(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    #[test]
    fn test_placeholder_substitution() {
        let request = GenerateRequest {
            input_spec: "specs/users.yaml".to_string(),
            output_path: PathBuf::from("src/api/users"),
            options: json!({
                "command": "my-codegen",
                "args": ["--from", "{input}", "--to", "{output}", "--strict"]
            })
            .as_object()
            .unwrap()
            .clone(),
            service: Some("users".to_string()),
        };
        let (program, args) = CommandPlugin::build_invocation(&request).unwrap();
        assert_eq!(program, "my-codegen");
        assert_eq!(args, vec!["--from", "specs/users.yaml", "--to", "src/api/users", "--strict"]);
    }

    #[test]
    fn test_missing_command_is_rejected() {
        let request = GenerateRequest {
            input_spec: "a.yaml".to_string(),
            output_path: PathBuf::from("out"),
            options: serde_json::Map::new(),
            service: None,
        };
        let err = CommandPlugin::build_invocation(&request).unwrap_err();
        assert!(err.to_string().contains("command"));
    }
}
