//! In-process registry oracle backed by explicit whitelists.
//!
//! Mirrors what an external registry enforces: both identities non-zero and
//! whitelisted, `min_fee <= init_fee <= max_fee(config)`,
//! `min_fee <= max_fee <= max_fee(config)` and `init_fee <= max_fee`.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use rootgate_store::Address;

use super::{RegistryOracle, RegistryRejection};
use crate::operation::amount;

/// Fee bounds for one whitelisted fee token, as written in config files.
/// Bounds past the 64-bit TOML integer range are written as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBounds {
    pub address: Address,
    #[serde(with = "amount")]
    pub min_fee: u128,
    #[serde(with = "amount")]
    pub max_fee: u128,
}

/// Serialisable whitelist definition, the `[registry]` config section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub executors: Vec<Address>,
    #[serde(default)]
    pub fee_tokens: Vec<FeeBounds>,
}

/// A [`RegistryOracle`] over in-memory whitelists.
#[derive(Debug, Clone, Default)]
pub struct WhitelistRegistry {
    executors: HashSet<Address>,
    fee_tokens: HashMap<Address, (u128, u128)>,
}

impl WhitelistRegistry {
    /// Create an empty registry that rejects everything.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &RegistryConfig) -> Self {
        let mut registry = Self::new();
        for executor in &config.executors {
            registry.allow_executor(*executor);
        }
        for token in &config.fee_tokens {
            registry.allow_fee_token(token.address, token.min_fee, token.max_fee);
        }
        registry
    }

    /// Whitelist an executor. Returns `false` if it was already present.
    pub fn allow_executor(&mut self, executor: Address) -> bool {
        self.executors.insert(executor)
    }

    /// Whitelist a fee token with its fee bounds, replacing any previous
    /// bounds for the token.
    pub fn allow_fee_token(&mut self, token: Address, min_fee: u128, max_fee: u128) {
        self.fee_tokens.insert(token, (min_fee, max_fee));
    }

    pub fn is_executor_allowed(&self, executor: &Address) -> bool {
        self.executors.contains(executor)
    }

    pub fn fee_bounds(&self, token: &Address) -> Option<(u128, u128)> {
        self.fee_tokens.get(token).copied()
    }

    /// The synchronous check behind the [`RegistryOracle`] impl.
    pub fn check(
        &self,
        executor: Address,
        fee_token: Address,
        init_fee: u128,
        max_fee: u128,
    ) -> Result<(), RegistryRejection> {
        if executor.is_zero() {
            return Err(RegistryRejection::ZeroExecutor);
        }
        if fee_token.is_zero() {
            return Err(RegistryRejection::ZeroFeeToken);
        }
        if !self.is_executor_allowed(&executor) {
            return Err(RegistryRejection::ExecutorNotWhitelisted(executor));
        }
        let (min, max) = self
            .fee_bounds(&fee_token)
            .ok_or(RegistryRejection::FeeTokenNotWhitelisted(fee_token))?;

        if init_fee < min || init_fee > max {
            return Err(RegistryRejection::InitFeeOutOfBounds {
                fee: init_fee,
                min,
                max,
            });
        }
        if max_fee < min || max_fee > max {
            return Err(RegistryRejection::MaxFeeOutOfBounds {
                fee: max_fee,
                min,
                max,
            });
        }
        if init_fee > max_fee {
            return Err(RegistryRejection::InitFeeExceedsMaxFee { init_fee, max_fee });
        }
        Ok(())
    }
}

#[async_trait]
impl RegistryOracle for WhitelistRegistry {
    async fn validate_task_registration(
        &self,
        executor: Address,
        fee_token: Address,
        init_fee: u128,
        max_fee: u128,
    ) -> Result<(), RegistryRejection> {
        self.check(executor, fee_token, init_fee, max_fee)
    }
}
