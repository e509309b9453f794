//! `rootgate simulate`: replay a manifest's steps against an in-process
//! engine.
//!
//! The engine is owned by the configured account and validates
//! registrations against the configured whitelist. Module calls are logged
//! and always succeed.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;

use rootgate_core::collaborators::WhitelistRegistry;
use rootgate_core::manifest::{TaskManifest, load_manifest};
use rootgate_core::{CallContext, CallOutcome, Engine, ModuleExecutor, StaticOwner};
use rootgate_store::{Address, Hash, MemoryTaskStore, TaskStore};

use crate::config::RootgateConfig;

/// A [`ModuleExecutor`] that logs each call and reports success.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingModuleExecutor;

#[async_trait]
impl ModuleExecutor for LoggingModuleExecutor {
    async fn execute_direct_call(&self, target: Address, value: u128, data: &[u8]) -> CallOutcome {
        tracing::info!(
            target_address = %target,
            value = %value,
            data = %format!("0x{}", hex::encode(data)),
            "module call"
        );
        CallOutcome::success(Vec::new())
    }
}

/// Outcome of one simulated step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub step: usize,
    pub operation: String,
    pub caller: Address,
    pub timestamp: u64,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationReport {
    pub root: Hash,
    pub steps: Vec<StepReport>,
    /// Operation ids recorded as executed after the last step.
    pub executed: Vec<u32>,
}

/// Register the manifest's task and run its steps. Steps without a
/// timestamp run at `now`.
pub async fn simulate(
    config: &RootgateConfig,
    manifest: &TaskManifest,
    now: u64,
) -> Result<SimulationReport> {
    let store = Arc::new(MemoryTaskStore::new());
    let engine = Engine::builder(
        Arc::new(StaticOwner(config.owner)),
        Arc::new(WhitelistRegistry::from_config(&config.registry)),
        Arc::new(LoggingModuleExecutor),
    )
    .store(store.clone())
    .build();

    let tree = manifest.build_tree()?;
    let root = tree.root();
    let task = &manifest.task;
    engine
        .register_task(
            &CallContext::new(config.owner, now, 0),
            root,
            task.executor,
            task.fee_token,
            task.init_fee,
            task.max_fee,
        )
        .await
        .context("task registration failed")?;

    let mut steps = Vec::with_capacity(manifest.steps.len());
    for (index, step) in manifest.steps.iter().enumerate() {
        let operation = manifest
            .operation(&step.operation)
            .with_context(|| format!("step {index} refers to unknown operation"))?;
        let proof = tree
            .proof(&step.operation)
            .with_context(|| format!("no proof for operation {:?}", step.operation))?;
        let caller = step.caller.unwrap_or(task.executor);
        let timestamp = step.timestamp.unwrap_or(now);
        let ctx = CallContext::new(caller, timestamp, step.gas_price);

        let result = engine.execute_transaction(&ctx, root, operation, &proof).await;
        if let Err(e) = &result {
            tracing::warn!(step = index, operation = %step.operation, kind = ?e.kind(), error = %e, "step rejected");
        }
        steps.push(StepReport {
            step: index,
            operation: step.operation.clone(),
            caller,
            timestamp,
            ok: result.is_ok(),
            error: result.err().map(|e| e.to_string()),
        });
    }

    let executed = store
        .get(&root)
        .map(|record| record.executed.iter().collect())
        .unwrap_or_default();

    Ok(SimulationReport {
        root,
        steps,
        executed,
    })
}

pub async fn run_simulate(config_path: Option<&Path>, manifest_path: &Path) -> Result<()> {
    let config = RootgateConfig::resolve(config_path)?;
    let manifest = load_manifest(manifest_path)?;
    let now = u64::try_from(chrono::Utc::now().timestamp()).context("system clock before epoch")?;

    let report = simulate(&config, &manifest, now).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
