//! The execution validator.
//!
//! `execute_transaction` runs four phases against a snapshot of the task
//! record and only then writes:
//!
//! 1. authentication: task exists, caller is its executor, task is active
//! 2. proof: the operation's leaf is included under the task root
//! 3. constraints: id in range, direct call, time window, gas price, replay
//! 4. execution: the module executor performs the call
//!
//! The executed bit for a non-repeatable operation is committed after the
//! call succeeds. Until then an in-flight reservation keeps reentrant or
//! concurrent submissions of the same operation out.

use rootgate_store::{ExecutedBitmap, Hash, TaskRecord, TaskStatus};

use super::Engine;
use crate::error::EngineError;
use crate::events::EngineEvent;
use crate::merkle;
use crate::operation::{CallContext, CallType, Operation};

impl Engine {
    /// Validate and execute one pre-authorized operation of the task at
    /// `root`, returning the module executor's return data.
    ///
    /// On any error nothing is recorded and no event is emitted.
    pub async fn execute_transaction(
        &self,
        ctx: &CallContext,
        root: Hash,
        operation: &Operation,
        proof: &[Hash],
    ) -> Result<Vec<u8>, EngineError> {
        let task = self
            .store
            .get(&root)
            .ok_or(EngineError::TaskNotFound(root))?;

        authenticate(ctx, &task)?;

        let leaf = operation.leaf_hash();
        if !merkle::verify(proof, &root, &leaf) {
            tracing::warn!(root = %root, leaf = %leaf, "merkle proof rejected");
            return Err(EngineError::InvalidMerkleProof(root));
        }

        check_constraints(ctx, &task, operation)?;

        // Held until the executed bit is committed, or dropped with the error.
        let _reservation = if operation.is_repeatable {
            None
        } else {
            let reservation = self.in_flight.reserve(root, operation.operation_id)?;
            // Another submission may have committed between snapshot and
            // reservation.
            let current = self
                .store
                .get(&root)
                .ok_or(EngineError::TaskNotFound(root))?;
            if current.executed.is_set(operation.operation_id)? {
                return Err(EngineError::OperationAlreadyExecuted(operation.operation_id));
            }
            Some(reservation)
        };

        tracing::debug!(
            root = %root,
            operation_id = operation.operation_id,
            target = %operation.target,
            value = %operation.value,
            "dispatching operation"
        );
        let outcome = self
            .executor
            .execute_direct_call(operation.target, operation.value, &operation.call_data)
            .await;

        if !outcome.success {
            tracing::warn!(
                root = %root,
                operation_id = operation.operation_id,
                revert_len = outcome.return_data.len(),
                "module call failed"
            );
            return Err(if outcome.return_data.is_empty() {
                EngineError::ModuleExecutionFailed
            } else {
                EngineError::ModuleCallReverted(outcome.return_data)
            });
        }

        if !operation.is_repeatable {
            self.store.mark_executed(&root, operation.operation_id)?;
        }

        tracing::info!(
            root = %root,
            operation_id = operation.operation_id,
            repeatable = operation.is_repeatable,
            "operation executed"
        );
        self.emit(EngineEvent::ExecutionSuccess {
            root,
            executor: ctx.caller,
            target: operation.target,
            value: operation.value,
            data: operation.call_data.clone(),
            call_type: operation.call_type,
        });
        Ok(outcome.return_data)
    }

    /// Whether operation `operation_id` of the task at `root` has been
    /// recorded as executed. Repeatable operations are never recorded.
    pub fn is_operation_executed(&self, root: &Hash, operation_id: u32) -> Result<bool, EngineError> {
        ExecutedBitmap::check_bounds(operation_id)?;
        let task = self
            .store
            .get(root)
            .ok_or(EngineError::TaskNotFound(*root))?;
        Ok(task.executed.is_set(operation_id)?)
    }
}

fn authenticate(ctx: &CallContext, task: &TaskRecord) -> Result<(), EngineError> {
    if ctx.caller != task.executor {
        return Err(EngineError::UnauthorizedExecutor(ctx.caller));
    }
    if task.status != TaskStatus::Active {
        return Err(EngineError::TaskNotActive(task.status));
    }
    Ok(())
}

fn check_constraints(
    ctx: &CallContext,
    task: &TaskRecord,
    operation: &Operation,
) -> Result<(), EngineError> {
    let id = operation.operation_id;
    ExecutedBitmap::check_bounds(id)?;

    if operation.call_type != CallType::Call {
        return Err(EngineError::InvalidCallType);
    }

    if !operation.is_within_window(ctx.timestamp) {
        return Err(EngineError::InvalidTimeWindow {
            now: ctx.timestamp,
            start: operation.start_time,
            end: operation.end_time,
        });
    }

    if ctx.gas_price > operation.max_gas_price {
        return Err(EngineError::GasPriceTooHigh {
            actual: ctx.gas_price,
            max: operation.max_gas_price,
        });
    }

    if !operation.is_repeatable && task.executed.is_set(id)? {
        return Err(EngineError::OperationAlreadyExecuted(id));
    }
    Ok(())
}
