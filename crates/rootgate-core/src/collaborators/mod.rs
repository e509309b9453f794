//! External collaborators the engine depends on.
//!
//! The engine never moves assets or decides whitelists itself. It consults:
//!
//! ```text
//! Engine
//!   |-- OwnerSource::owner()                      (permission checks)
//!   |-- RegistryOracle::validate_task_registration (once, at registration)
//!   `-- ModuleExecutor::execute_direct_call        (phase 4 of execution)
//! ```
//!
//! The async traits are object-safe so they can be held as `Arc<dyn _>`.

pub mod whitelist;

use async_trait::async_trait;

use rootgate_store::Address;

pub use whitelist::{FeeBounds, RegistryConfig, WhitelistRegistry};

/// Result of a call made through the module executor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CallOutcome {
    pub success: bool,
    /// Return payload on success, revert payload on failure (may be empty).
    pub return_data: Vec<u8>,
}

impl CallOutcome {
    pub fn success(return_data: Vec<u8>) -> Self {
        Self {
            success: true,
            return_data,
        }
    }

    pub fn failure(return_data: Vec<u8>) -> Self {
        Self {
            success: false,
            return_data,
        }
    }
}

/// The asset-moving authority that performs calls on behalf of the
/// controlling account. The engine only ever requests direct calls.
#[async_trait]
pub trait ModuleExecutor: Send + Sync {
    async fn execute_direct_call(&self, target: Address, value: u128, data: &[u8])
    -> CallOutcome;
}

/// Reasons a registry oracle can decline a task registration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryRejection {
    #[error("executor address is zero")]
    ZeroExecutor,

    #[error("fee token address is zero")]
    ZeroFeeToken,

    #[error("executor {0} is not whitelisted")]
    ExecutorNotWhitelisted(Address),

    #[error("fee token {0} is not whitelisted")]
    FeeTokenNotWhitelisted(Address),

    #[error("init fee {fee} outside allowed range [{min}, {max}]")]
    InitFeeOutOfBounds { fee: u128, min: u128, max: u128 },

    #[error("max fee {fee} outside allowed range [{min}, {max}]")]
    MaxFeeOutOfBounds { fee: u128, min: u128, max: u128 },

    #[error("init fee {init_fee} exceeds max fee {max_fee}")]
    InitFeeExceedsMaxFee { init_fee: u128, max_fee: u128 },

    #[error("{0}")]
    Other(String),
}

/// The whitelist and fee-bound authority consulted on every registration.
#[async_trait]
pub trait RegistryOracle: Send + Sync {
    async fn validate_task_registration(
        &self,
        executor: Address,
        fee_token: Address,
        init_fee: u128,
        max_fee: u128,
    ) -> Result<(), RegistryRejection>;
}

/// Source of the account's current controlling identity.
pub trait OwnerSource: Send + Sync {
    fn owner(&self) -> Address;
}

/// An [`OwnerSource`] that always returns the same identity.
#[derive(Debug, Clone, Copy)]
pub struct StaticOwner(pub Address);

impl OwnerSource for StaticOwner {
    fn owner(&self) -> Address {
        self.0
    }
}

// Compile-time assertion: the async collaborators must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn ModuleExecutor, _: &dyn RegistryOracle, _: &dyn OwnerSource) {}
};

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoExecutor;

    #[async_trait]
    impl ModuleExecutor for EchoExecutor {
        async fn execute_direct_call(
            &self,
            _target: Address,
            _value: u128,
            data: &[u8],
        ) -> CallOutcome {
            CallOutcome::success(data.to_vec())
        }
    }

    #[tokio::test]
    async fn executor_is_usable_as_trait_object() {
        let executor: Box<dyn ModuleExecutor> = Box::new(EchoExecutor);
        let outcome = executor
            .execute_direct_call(Address::from_low_u8(1), 0, b"ping")
            .await;
        assert!(outcome.success);
        assert_eq!(outcome.return_data, b"ping");
    }

    #[test]
    fn static_owner_returns_identity() {
        let owner = StaticOwner(Address::from_low_u8(7));
        assert_eq!(owner.owner(), Address::from_low_u8(7));
    }

    #[test]
    fn rejection_messages() {
        assert_eq!(
            RegistryRejection::InitFeeExceedsMaxFee {
                init_fee: 10,
                max_fee: 5
            }
            .to_string(),
            "init fee 10 exceeds max fee 5"
        );
        assert_eq!(
            RegistryRejection::ExecutorNotWhitelisted(Address::from_low_u8(1)).to_string(),
            "executor 0x0000000000000000000000000000000000000001 is not whitelisted"
        );
    }
}
