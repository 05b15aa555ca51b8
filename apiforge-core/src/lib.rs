//! Core functionality for apiforge
//!
//! This crate contains the generation-task hashing and dispatch subsystem:
//! cache-key computation for OpenAPI-driven generation tasks, the generator
//! plugin registry, on-demand backend installation, and the dispatcher that
//! fans out generation over one-or-many input specifications.

pub mod discovery;
pub mod dispatch;
pub mod fingerprint;
pub mod generator;
pub mod ignore;
pub mod install;
pub mod loader;
pub mod registry;
pub mod task;

pub use dispatch::{Dispatcher, GenerationError, GenerationResult, RetryPolicy};
pub use fingerprint::{FingerprintError, SpecFingerprinter, TaskHash, TaskHashDetails};
pub use generator::{GeneratorContext, GeneratorPlugin};
pub use install::{AutoInstaller, InstallOptions, PackageManager};
pub use loader::PluginLoader;
pub use registry::{GeneratorRegistry, RegistryOptions};
pub use task::{GenerationTask, InputSpec};
