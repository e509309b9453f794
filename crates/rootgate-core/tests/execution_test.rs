//! Integration tests for the execution validator: authentication, proof
//! checks, per-operation constraints and commit behaviour.

use rootgate_core::{CallContext, CallOutcome, CallType, EngineError, EngineEvent, ErrorKind};
use rootgate_store::{ExecutedBitmap, TaskStatus, TaskStore};
use rootgate_test_utils::{
    EXECUTOR, MAX_GAS_PRICE, OWNER, RecordedCall, STRANGER, TestEngine, WINDOW_END,
    WINDOW_START, ctx, operation, proof_for, random_hash, repeatable_operation,
};

fn at(timestamp: u64) -> CallContext {
    CallContext::new(EXECUTOR, timestamp, MAX_GAS_PRICE)
}

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn executes_and_records_non_repeatable_operation() {
    let t = TestEngine::new();
    let op = operation(3);
    let tree = t.register(&[operation(0), op.clone()]).await;
    t.executor.push_outcome(CallOutcome::success(vec![0x01, 0x02]));

    let returned = t
        .engine
        .execute_transaction(&ctx(EXECUTOR), tree.root(), &op, &proof_for(&tree, 1))
        .await
        .unwrap();

    assert_eq!(returned, vec![0x01, 0x02]);
    assert_eq!(
        t.executor.calls(),
        vec![RecordedCall {
            target: op.target,
            value: op.value,
            data: op.call_data.clone(),
        }]
    );
    assert!(t.engine.is_operation_executed(&tree.root(), 3).unwrap());
    assert!(!t.engine.is_operation_executed(&tree.root(), 0).unwrap());
    assert_eq!(
        t.events.events(),
        vec![EngineEvent::ExecutionSuccess {
            root: tree.root(),
            executor: EXECUTOR,
            target: op.target,
            value: op.value,
            data: op.call_data.clone(),
            call_type: CallType::Call,
        }]
    );
}

#[tokio::test]
async fn non_repeatable_replay_fails_at_any_time_in_window() {
    let t = TestEngine::new();
    let op = operation(0);
    let tree = t.register(&[op.clone(), operation(1)]).await;
    let proof = proof_for(&tree, 0);

    t.engine
        .execute_transaction(&at(WINDOW_START), tree.root(), &op, &proof)
        .await
        .unwrap();

    for timestamp in [WINDOW_START, WINDOW_START + 1, WINDOW_END] {
        let err = t
            .engine
            .execute_transaction(&at(timestamp), tree.root(), &op, &proof)
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::OperationAlreadyExecuted(0));
        assert_eq!(err.kind(), ErrorKind::AlreadyExecuted);
    }
    assert_eq!(t.executor.call_count(), 1);
    assert_eq!(t.events.events().len(), 1);
}

#[tokio::test]
async fn repeatable_operation_never_sets_its_bit() {
    for runs in [1usize, 2, 50] {
        let t = TestEngine::new();
        let op = repeatable_operation(5);
        let tree = t.register(&[op.clone(), operation(6)]).await;
        let proof = proof_for(&tree, 0);

        for _ in 0..runs {
            t.engine
                .execute_transaction(&ctx(EXECUTOR), tree.root(), &op, &proof)
                .await
                .unwrap();
            assert!(!t.engine.is_operation_executed(&tree.root(), 5).unwrap());
        }
        assert_eq!(t.executor.call_count(), runs);
        assert_eq!(t.events.events().len(), runs);
        assert_eq!(t.store.get(&tree.root()).unwrap().executed, ExecutedBitmap::EMPTY);
    }
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_root_is_not_found() {
    let t = TestEngine::new();
    let root = random_hash();
    let err = t
        .engine
        .execute_transaction(&ctx(EXECUTOR), root, &operation(0), &[])
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::TaskNotFound(root));
}

#[tokio::test]
async fn only_the_registered_executor_may_execute() {
    let t = TestEngine::new();
    let op = operation(0);
    let tree = t.register(&[op.clone()]).await;

    for caller in [OWNER, STRANGER] {
        let err = t
            .engine
            .execute_transaction(&ctx(caller), tree.root(), &op, &[])
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::UnauthorizedExecutor(caller));
    }
    assert_eq!(t.executor.call_count(), 0);
}

#[tokio::test]
async fn closed_task_cannot_execute() {
    for status in [TaskStatus::Completed, TaskStatus::Cancelled] {
        let t = TestEngine::new();
        let op = operation(0);
        let tree = t.register(&[op.clone()]).await;
        t.engine
            .update_task_status(&ctx(EXECUTOR), tree.root(), status)
            .await
            .unwrap();

        let err = t
            .engine
            .execute_transaction(&ctx(EXECUTOR), tree.root(), &op, &[])
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::TaskNotActive(status));
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }
}

// ---------------------------------------------------------------------------
// Proof
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tampered_operation_fails_proof() {
    let t = TestEngine::new();
    let op = operation(0);
    let tree = t.register(&[op.clone(), operation(1)]).await;

    let mut tampered = op.clone();
    tampered.value += 1;
    let err = t
        .engine
        .execute_transaction(&ctx(EXECUTOR), tree.root(), &tampered, &proof_for(&tree, 0))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InvalidMerkleProof(tree.root()));
    assert_eq!(err.kind(), ErrorKind::ProofInvalid);
}

// ---------------------------------------------------------------------------
// Constraints
// ---------------------------------------------------------------------------

#[tokio::test]
async fn time_window_is_inclusive_at_both_ends() {
    let t = TestEngine::new();
    let ops: Vec<_> = (0..4).map(operation).collect();
    let tree = t.register(&ops).await;

    for (index, timestamp) in [(0, WINDOW_START), (1, WINDOW_END)] {
        t.engine
            .execute_transaction(&at(timestamp), tree.root(), &ops[index], &proof_for(&tree, index))
            .await
            .unwrap();
    }

    for (index, timestamp) in [(2, WINDOW_START - 1), (3, WINDOW_END + 1)] {
        let err = t
            .engine
            .execute_transaction(&at(timestamp), tree.root(), &ops[index], &proof_for(&tree, index))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidTimeWindow {
                now: timestamp,
                start: WINDOW_START,
                end: WINDOW_END,
            }
        );
        assert_eq!(err.kind(), ErrorKind::ConstraintViolation);
    }
}

#[tokio::test]
async fn gas_price_at_limit_passes_and_above_fails() {
    let t = TestEngine::new();
    let op = operation(0);
    let tree = t.register(&[op.clone()]).await;

    let err = t
        .engine
        .execute_transaction(
            &CallContext::new(EXECUTOR, WINDOW_START, MAX_GAS_PRICE + 1),
            tree.root(),
            &op,
            &[],
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::GasPriceTooHigh {
            actual: MAX_GAS_PRICE + 1,
            max: MAX_GAS_PRICE,
        }
    );

    t.engine
        .execute_transaction(
            &CallContext::new(EXECUTOR, WINDOW_START, MAX_GAS_PRICE),
            tree.root(),
            &op,
            &[],
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn delegate_call_is_rejected() {
    let t = TestEngine::new();
    let mut op = operation(0);
    op.call_type = CallType::DelegateCall;
    let tree = t.register(&[op.clone()]).await;

    let err = t
        .engine
        .execute_transaction(&ctx(EXECUTOR), tree.root(), &op, &[])
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InvalidCallType);
    assert_eq!(t.executor.call_count(), 0);
}

#[tokio::test]
async fn bitmap_boundary_is_87() {
    let t = TestEngine::new();
    let last = operation(87);
    let beyond = operation(88);
    let tree = t.register(&[last.clone(), beyond.clone(), operation(86)]).await;

    t.engine
        .execute_transaction(&ctx(EXECUTOR), tree.root(), &last, &proof_for(&tree, 0))
        .await
        .unwrap();
    assert!(t.engine.is_operation_executed(&tree.root(), 87).unwrap());
    assert!(!t.engine.is_operation_executed(&tree.root(), 86).unwrap());

    let err = t
        .engine
        .execute_transaction(&ctx(EXECUTOR), tree.root(), &beyond, &proof_for(&tree, 1))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::OperationIdOutOfBounds(88));

    assert_eq!(
        t.engine.is_operation_executed(&tree.root(), 88).unwrap_err(),
        EngineError::OperationIdOutOfBounds(88)
    );
}

#[tokio::test]
async fn is_operation_executed_checks_bounds_before_existence() {
    let t = TestEngine::new();
    let root = random_hash();
    assert_eq!(
        t.engine.is_operation_executed(&root, 88).unwrap_err(),
        EngineError::OperationIdOutOfBounds(88)
    );
    assert_eq!(
        t.engine.is_operation_executed(&root, 0).unwrap_err(),
        EngineError::TaskNotFound(root)
    );
}

// ---------------------------------------------------------------------------
// Module call failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn revert_payload_is_propagated_and_nothing_recorded() {
    let t = TestEngine::new();
    let op = operation(0);
    let tree = t.register(&[op.clone()]).await;
    t.executor.push_outcome(CallOutcome::failure(vec![0x08, 0xc3, 0x79, 0xa0]));

    let err = t
        .engine
        .execute_transaction(&ctx(EXECUTOR), tree.root(), &op, &[])
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ModuleCallReverted(vec![0x08, 0xc3, 0x79, 0xa0]));
    assert_eq!(err.kind(), ErrorKind::ExternalCallFailed);
    assert!(!t.engine.is_operation_executed(&tree.root(), 0).unwrap());
    assert!(t.events.events().is_empty());

    // The failed attempt left no trace, so a retry can succeed.
    t.engine
        .execute_transaction(&ctx(EXECUTOR), tree.root(), &op, &[])
        .await
        .unwrap();
    assert!(t.engine.is_operation_executed(&tree.root(), 0).unwrap());
}

#[tokio::test]
async fn empty_failure_is_generic() {
    let t = TestEngine::new();
    let op = operation(0);
    let tree = t.register(&[op.clone()]).await;
    t.executor.push_outcome(CallOutcome::failure(Vec::new()));

    let err = t
        .engine
        .execute_transaction(&ctx(EXECUTOR), tree.root(), &op, &[])
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ModuleExecutionFailed);
    assert!(!t.engine.is_operation_executed(&tree.root(), 0).unwrap());
}
