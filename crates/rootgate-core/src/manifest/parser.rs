//! Task manifest parser with validation.
//!
//! Parses a `task.toml` string into a [`TaskManifest`] and validates:
//! - At least one operation is declared.
//! - Operation names are unique.
//! - `call_data` is well-formed hex.
//! - Every step refers to a declared operation.
//!
//! Two non-repeatable operations sharing an `operation_id` is accepted with
//! a warning: executing either marks the id, which blocks the other.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::Context;
use thiserror::Error;

use rootgate_store::Hash;

use super::toml_format::{OperationToml, StepToml, TaskManifestToml, TaskMeta};
use crate::merkle::{MerkleError, MerkleTree};
use crate::operation::Operation;

/// Errors that can occur during manifest parsing and validation.
#[derive(Debug, Error)]
pub enum ManifestParseError {
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("manifest must contain at least one operation")]
    NoOperations,

    #[error("duplicate operation name: {0:?}")]
    DuplicateOperationName(String),

    #[error("operation {operation:?} has malformed call_data: {reason}")]
    InvalidCallData { operation: String, reason: String },

    #[error("step {step} refers to unknown operation {operation:?}")]
    UnknownStepOperation { step: usize, operation: String },
}

/// An operation together with its manifest name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedOperation {
    pub name: String,
    pub operation: Operation,
}

/// A validated task manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskManifest {
    pub task: TaskMeta,
    /// Operations in declaration order, which is also leaf order.
    pub operations: Vec<NamedOperation>,
    pub steps: Vec<StepToml>,
}

impl TaskManifest {
    pub fn operation(&self, name: &str) -> Option<&Operation> {
        self.operations
            .iter()
            .find(|named| named.name == name)
            .map(|named| &named.operation)
    }

    /// Build the Merkle tree over the manifest's operations.
    pub fn build_tree(&self) -> Result<TaskTree, MerkleError> {
        let leaves: Vec<Hash> = self
            .operations
            .iter()
            .map(|named| named.operation.leaf_hash())
            .collect();
        let by_name = self
            .operations
            .iter()
            .zip(&leaves)
            .enumerate()
            .map(|(index, (named, leaf))| (named.name.clone(), (index, *leaf)))
            .collect();
        Ok(TaskTree {
            tree: MerkleTree::from_leaves(leaves)?,
            by_name,
        })
    }
}

/// A Merkle tree built from a manifest, addressable by operation name.
#[derive(Debug, Clone)]
pub struct TaskTree {
    pub tree: MerkleTree,
    by_name: HashMap<String, (usize, Hash)>,
}

impl TaskTree {
    pub fn root(&self) -> Hash {
        self.tree.root()
    }

    pub fn leaf(&self, name: &str) -> Option<Hash> {
        self.by_name.get(name).map(|(_, leaf)| *leaf)
    }

    /// Inclusion proof for the named operation.
    pub fn proof(&self, name: &str) -> Option<Vec<Hash>> {
        let (index, _) = self.by_name.get(name)?;
        self.tree.proof(*index).ok()
    }
}

/// Parse and validate a `task.toml` string.
pub fn parse_manifest(content: &str) -> Result<TaskManifest, ManifestParseError> {
    let raw: TaskManifestToml = toml::from_str(content)?;
    validate(raw)
}

/// Read and parse a manifest file.
pub fn load_manifest(path: &Path) -> anyhow::Result<TaskManifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest {}", path.display()))?;
    parse_manifest(&content).with_context(|| format!("invalid manifest {}", path.display()))
}

fn validate(raw: TaskManifestToml) -> Result<TaskManifest, ManifestParseError> {
    if raw.operations.is_empty() {
        return Err(ManifestParseError::NoOperations);
    }

    let mut seen = HashSet::new();
    for op in &raw.operations {
        if !seen.insert(op.name.as_str()) {
            return Err(ManifestParseError::DuplicateOperationName(op.name.clone()));
        }
    }

    for (step, entry) in raw.steps.iter().enumerate() {
        if !seen.contains(entry.operation.as_str()) {
            return Err(ManifestParseError::UnknownStepOperation {
                step,
                operation: entry.operation.clone(),
            });
        }
    }

    warn_on_shared_ids(&raw.operations);

    let operations = raw
        .operations
        .into_iter()
        .map(convert)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TaskManifest {
        task: raw.task,
        operations,
        steps: raw.steps,
    })
}

fn warn_on_shared_ids(operations: &[OperationToml]) {
    let mut owners: HashMap<u32, &str> = HashMap::new();
    for op in operations.iter().filter(|op| !op.repeatable) {
        if let Some(first) = owners.insert(op.operation_id, &op.name) {
            tracing::warn!(
                operation_id = op.operation_id,
                first = first,
                second = %op.name,
                "non-repeatable operations share an id; executing one blocks the other"
            );
        }
    }
}

fn convert(op: OperationToml) -> Result<NamedOperation, ManifestParseError> {
    let digits = op.call_data.strip_prefix("0x").unwrap_or(&op.call_data);
    let call_data = hex::decode(digits).map_err(|e| ManifestParseError::InvalidCallData {
        operation: op.name.clone(),
        reason: e.to_string(),
    })?;

    Ok(NamedOperation {
        operation: Operation {
            target: op.target,
            value: op.value,
            call_data,
            call_type: op.call_type,
            operation_id: op.operation_id,
            is_repeatable: op.repeatable,
            start_time: op.start_time,
            end_time: op.end_time,
            max_gas_price: op.max_gas_price,
            gas_limit: op.gas_limit,
            gas_token: op.gas_token,
        },
        name: op.name,
    })
}
