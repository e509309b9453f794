//! Task registration, status updates and queries.

use rootgate_store::{Address, CompressedAmount, Hash, StoreError, TaskRecord, TaskStatus};

use super::{Engine, TaskInfo};
use crate::error::EngineError;
use crate::events::EngineEvent;
use crate::operation::CallContext;
use crate::state::{Roles, TaskStateMachine};

impl Engine {
    /// Register a new task under `root`.
    ///
    /// Only the account owner may register. The registry oracle is consulted
    /// before anything is written; on success the task is stored `Active`
    /// with an empty executed bitmap. `init_fee` is stored rounded down and
    /// `max_fee` rounded up.
    pub async fn register_task(
        &self,
        ctx: &CallContext,
        root: Hash,
        executor: Address,
        fee_token: Address,
        init_fee: u128,
        max_fee: u128,
    ) -> Result<(), EngineError> {
        // 1. Owner authority.
        let owner = self.owner.owner();
        if ctx.caller != owner {
            tracing::warn!(caller = %ctx.caller, root = %root, "registration by non-owner rejected");
            return Err(EngineError::NotOwner(ctx.caller));
        }

        // 2. Uniqueness.
        if self.store.get(&root).is_some() {
            return Err(EngineError::TaskAlreadyRegistered(root));
        }

        // 3. Upstream validation, before any write.
        self.registry
            .validate_task_registration(executor, fee_token, init_fee, max_fee)
            .await?;

        // 4. Persist. A concurrent registration of the same root that slipped
        // past step 2 is caught by the store.
        let record = TaskRecord::new(
            executor,
            fee_token,
            CompressedAmount::compress(init_fee, false),
            CompressedAmount::compress(max_fee, true),
        );
        self.store.insert_new(root, record)?;

        tracing::info!(
            root = %root,
            executor = %executor,
            fee_token = %fee_token,
            init_fee = %init_fee,
            max_fee = %max_fee,
            "task registered"
        );
        self.emit(EngineEvent::TaskRegistered {
            root,
            executor,
            fee_token,
            init_fee,
            max_fee,
        });
        Ok(())
    }

    /// Move a task to `new_status` on behalf of the owner or its executor.
    pub async fn update_task_status(
        &self,
        ctx: &CallContext,
        root: Hash,
        new_status: TaskStatus,
    ) -> Result<(), EngineError> {
        // Authorize against a snapshot and apply only if the status is still
        // the one that was authorized. A concurrent update forces a re-check.
        let old_status = loop {
            let task = self
                .store
                .get(&root)
                .ok_or(EngineError::TaskNotFound(root))?;

            let roles = Roles::resolve(ctx.caller, self.owner.owner(), task.executor);
            TaskStateMachine::authorize(ctx.caller, roles, task.status, new_status)?;

            match self
                .store
                .compare_and_set_status(&root, task.status, new_status)
            {
                Ok(()) => break task.status,
                Err(StoreError::StatusMismatch { actual, .. }) => {
                    tracing::debug!(root = %root, actual = %actual, "status changed concurrently, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        };

        tracing::info!(
            root = %root,
            caller = %ctx.caller,
            from = %old_status,
            to = %new_status,
            "task status changed"
        );
        self.emit(EngineEvent::TaskStatusChanged {
            root,
            old_status,
            new_status,
        });
        Ok(())
    }

    /// Look up a task, decoding its stored fees.
    pub fn get_task_info(&self, root: &Hash) -> Result<TaskInfo, EngineError> {
        let task = self
            .store
            .get(root)
            .ok_or(EngineError::TaskNotFound(*root))?;
        Ok(TaskInfo {
            executor: task.executor,
            status: task.status,
            fee_token: task.fee_token,
            init_fee: task.init_fee.decompress()?,
            max_fee: task.max_fee.decompress()?,
        })
    }
}
