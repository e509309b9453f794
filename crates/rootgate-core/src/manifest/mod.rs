//! Task manifests: authoring format for a task's operations.

pub mod parser;
pub mod toml_format;

pub use parser::{
    ManifestParseError, NamedOperation, TaskManifest, TaskTree, load_manifest, parse_manifest,
};
pub use toml_format::{OperationToml, StepToml, TaskManifestToml, TaskMeta};
