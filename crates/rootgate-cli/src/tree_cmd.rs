//! `rootgate tree` and `rootgate verify`: build and check task commitments.

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Serialize;

use rootgate_core::manifest::{TaskManifest, load_manifest};
use rootgate_core::merkle;
use rootgate_store::Hash;

/// JSON output of `rootgate tree`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeReport {
    pub root: Hash,
    pub operations: Vec<LeafReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeafReport {
    pub name: String,
    pub operation_id: u32,
    pub repeatable: bool,
    pub leaf: Hash,
    pub proof: Vec<Hash>,
}

pub fn build_report(manifest: &TaskManifest) -> Result<TreeReport> {
    let tree = manifest.build_tree()?;
    let operations = manifest
        .operations
        .iter()
        .map(|named| {
            let leaf = tree
                .leaf(&named.name)
                .with_context(|| format!("operation {:?} missing from tree", named.name))?;
            let proof = tree
                .proof(&named.name)
                .with_context(|| format!("no proof for operation {:?}", named.name))?;
            Ok(LeafReport {
                name: named.name.clone(),
                operation_id: named.operation.operation_id,
                repeatable: named.operation.is_repeatable,
                leaf,
                proof,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(TreeReport {
        root: tree.root(),
        operations,
    })
}

pub fn run_tree(path: &Path) -> Result<()> {
    let manifest = load_manifest(path)?;
    let report = build_report(&manifest)?;
    tracing::info!(root = %report.root, operations = report.operations.len(), "task tree built");
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Check `leaf` against `root` with a comma-separated or repeated proof.
pub fn verify(root: &str, leaf: &str, proof: &[String]) -> Result<bool> {
    let root: Hash = root.parse().context("invalid root")?;
    let leaf: Hash = leaf.parse().context("invalid leaf")?;
    let proof = proof
        .iter()
        .enumerate()
        .map(|(i, node)| {
            node.parse::<Hash>()
                .with_context(|| format!("invalid proof node {i}"))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(merkle::verify(&proof, &root, &leaf))
}

pub fn run_verify(root: &str, leaf: &str, proof: &[String]) -> Result<()> {
    if !verify(root, leaf, proof)? {
        bail!("leaf {leaf} is not included under root {root}");
    }
    println!("valid");
    Ok(())
}
