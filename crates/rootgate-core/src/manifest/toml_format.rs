//! TOML format types for task manifest files.
//!
//! These types map directly to the `task.toml` on-disk format:
//!
//! ```toml
//! [task]
//! executor = "0x...01"
//! fee_token = "0x...02"
//! init_fee = 1000
//! max_fee = "250000000000000000000"
//!
//! [[operations]]
//! name = "swap"
//! target = "0x...10"
//! call_data = "0xa9059cbb"
//! operation_id = 0
//! start_time = 1700000000
//! end_time = 1700086400
//! max_gas_price = 50000000000
//!
//! [[steps]]
//! operation = "swap"
//! timestamp = 1700000100
//! gas_price = 30000000000
//! ```
//!
//! Amounts may be written as TOML integers or, when they exceed the signed
//! 64-bit range TOML allows, as decimal strings.

use serde::{Deserialize, Serialize};

use rootgate_store::Address;

use crate::operation::{CallType, amount};

/// Top-level structure of a `task.toml` file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskManifestToml {
    pub task: TaskMeta,
    #[serde(default)]
    pub operations: Vec<OperationToml>,
    /// Calls to replay with `rootgate simulate`.
    #[serde(default)]
    pub steps: Vec<StepToml>,
}

/// Registration parameters in `[task]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskMeta {
    pub executor: Address,
    pub fee_token: Address,
    #[serde(with = "amount")]
    pub init_fee: u128,
    #[serde(with = "amount")]
    pub max_fee: u128,
}

/// A single `[[operations]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationToml {
    /// Unique name within the manifest, referenced by steps.
    pub name: String,
    pub target: Address,
    #[serde(default, with = "amount")]
    pub value: u128,
    /// `0x`-prefixed hex payload. Decoded during validation.
    #[serde(default)]
    pub call_data: String,
    #[serde(default)]
    pub call_type: CallType,
    pub operation_id: u32,
    #[serde(default)]
    pub repeatable: bool,
    #[serde(default)]
    pub start_time: u64,
    #[serde(default = "default_end_time")]
    pub end_time: u64,
    #[serde(default = "default_max_gas_price", with = "amount")]
    pub max_gas_price: u128,
    #[serde(default)]
    pub gas_limit: u64,
    #[serde(default = "default_gas_token")]
    pub gas_token: Address,
}

/// A single `[[steps]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepToml {
    /// Name of the operation to submit.
    pub operation: String,
    /// Submitting identity. Defaults to the task's executor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller: Option<Address>,
    /// Block time for the call. Defaults to the current time when simulated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    #[serde(default, with = "amount")]
    pub gas_price: u128,
}

fn default_end_time() -> u64 {
    u64::MAX
}

fn default_max_gas_price() -> u128 {
    u128::MAX
}

fn default_gas_token() -> Address {
    Address::ZERO
}
