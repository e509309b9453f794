//! Structured notifications emitted after state changes commit.

use serde::{Deserialize, Serialize};

use rootgate_store::{Address, Hash, TaskStatus};

use crate::operation::CallType;

/// An event emitted by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    TaskRegistered {
        root: Hash,
        executor: Address,
        fee_token: Address,
        init_fee: u128,
        max_fee: u128,
    },
    TaskStatusChanged {
        root: Hash,
        old_status: TaskStatus,
        new_status: TaskStatus,
    },
    ExecutionSuccess {
        root: Hash,
        executor: Address,
        target: Address,
        value: u128,
        #[serde(with = "crate::operation::hex_bytes")]
        data: Vec<u8>,
        call_type: CallType,
    },
}

impl EngineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::TaskRegistered { .. } => "TaskRegistered",
            Self::TaskStatusChanged { .. } => "TaskStatusChanged",
            Self::ExecutionSuccess { .. } => "ExecutionSuccess",
        }
    }

    pub fn root(&self) -> &Hash {
        match self {
            Self::TaskRegistered { root, .. }
            | Self::TaskStatusChanged { root, .. }
            | Self::ExecutionSuccess { root, .. } => root,
        }
    }
}

/// Destination for engine events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &EngineEvent);
}

/// Logs each event at `info` with its JSON payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: &EngineEvent) {
        let payload = serde_json::to_string(event).unwrap_or_else(|e| format!("<{e}>"));
        tracing::info!(
            event = event.name(),
            root = %event.root(),
            payload = %payload,
            "engine event"
        );
    }
}
