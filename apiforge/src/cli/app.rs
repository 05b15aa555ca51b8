use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "apiforge",
    version,
    about = "ApiForge - OpenAPI-driven code generation for monorepos",
    long_about = "ApiForge detects OpenAPI specifications, computes content-addressed cache keys for generation tasks, and dispatches generation to pluggable backend tools with per-service fan-out."
)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Workspace root directory
    #[arg(short, long, global = true, default_value = ".")]
    pub workspace: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one generation task
    #[command(about = "Generate client code from OpenAPI specifications")]
    Generate(GenerateArgs),

    /// Compute a task's cache key
    #[command(about = "Print the cache key for a generation task as JSON")]
    Hash(HashArgs),

    /// List registered generator backends
    #[command(about = "List registered generators and the detected package manager")]
    Generators,

    /// Find OpenAPI documents
    #[command(about = "List OpenAPI documents found under a directory")]
    Discover(DiscoverArgs),
}

/// Task selection shared by `generate` and `hash`: either a build-graph
/// project file plus target name, or the task fields given directly.
#[derive(Args, Debug)]
pub struct TaskSelection {
    /// Build-graph project file (project.json) to read the target from
    #[arg(long, value_name = "FILE")]
    pub project_file: Option<PathBuf>,

    /// Target name within the project file
    #[arg(long, default_value = "generate-api")]
    pub target: String,

    /// Input specification path or URL
    #[arg(long, value_name = "PATH_OR_URL")]
    pub input_spec: Option<String>,

    /// Per-service specification as name=path-or-url (repeatable)
    #[arg(long, value_name = "NAME=SPEC")]
    pub service: Vec<String>,

    /// Base output directory
    #[arg(long, value_name = "DIR")]
    pub output_path: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub task: TaskSelection,

    /// Generator backend name
    #[arg(long, short)]
    pub generator: Option<String>,

    /// Backend-specific options as a JSON object
    #[arg(long, value_name = "JSON")]
    pub generator_options: Option<String>,

    /// Maximum generation attempts per service
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Install missing generator packages without asking
    #[arg(long)]
    pub auto_install: bool,

    /// Never prompt (non-interactive/CI environments)
    #[arg(long)]
    pub skip_prompts: bool,

    /// Add the output path to .gitignore
    #[arg(long)]
    pub update_gitignore: bool,

    /// Add the output path to .prettierignore
    #[arg(long)]
    pub update_prettierignore: bool,
}

#[derive(Args, Debug)]
pub struct HashArgs {
    #[command(flatten)]
    pub task: TaskSelection,

    /// Base task hash from the build graph
    #[arg(long, default_value = "")]
    pub base_hash: String,
}

#[derive(Args, Debug)]
pub struct DiscoverArgs {
    /// Directory to search (defaults to the workspace root)
    #[arg(value_name = "DIR")]
    pub path: Option<PathBuf>,
}
