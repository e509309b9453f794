//! Shared test utilities for rootgate integration tests.
//!
//! Provides a recording module executor, a recording event sink, permissive
//! and rejecting registry oracles, sample operations and a ready-wired
//! [`TestEngine`].

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use rootgate_core::merkle::MerkleTree;
use rootgate_core::{
    CallContext, CallOutcome, CallType, Engine, EngineEvent, EventSink, ModuleExecutor,
    Operation, RegistryOracle, RegistryRejection, StaticOwner,
};
use rootgate_store::{Address, Hash, MemoryTaskStore};

// ---------------------------------------------------------------------------
// Identities
// ---------------------------------------------------------------------------

pub const OWNER: Address = Address::from_low_u8(0x01);
pub const EXECUTOR: Address = Address::from_low_u8(0x02);
pub const FEE_TOKEN: Address = Address::from_low_u8(0x03);
pub const STRANGER: Address = Address::from_low_u8(0x04);

/// Start of the default operation window.
pub const WINDOW_START: u64 = 1_000;
/// End of the default operation window.
pub const WINDOW_END: u64 = 2_000;
/// Default `max_gas_price` of sample operations.
pub const MAX_GAS_PRICE: u128 = 100;

pub fn addr(n: u8) -> Address {
    Address::from_low_u8(n)
}

/// A uniformly random 32-byte hash.
pub fn random_hash() -> Hash {
    Hash(rand::random())
}

/// A context for `caller` inside the default window at an acceptable gas
/// price.
pub fn ctx(caller: Address) -> CallContext {
    CallContext::new(caller, WINDOW_START + 500, MAX_GAS_PRICE / 2)
}

// ---------------------------------------------------------------------------
// Operations and trees
// ---------------------------------------------------------------------------

/// A non-repeatable direct call with id `operation_id`.
pub fn operation(operation_id: u32) -> Operation {
    Operation {
        target: addr(0x10),
        value: u128::from(operation_id),
        call_data: vec![0xa9, 0x05, 0x9c, 0xbb, operation_id as u8],
        call_type: CallType::Call,
        operation_id,
        is_repeatable: false,
        start_time: WINDOW_START,
        end_time: WINDOW_END,
        max_gas_price: MAX_GAS_PRICE,
        gas_limit: 100_000,
        gas_token: Address::ZERO,
    }
}

pub fn repeatable_operation(operation_id: u32) -> Operation {
    Operation {
        is_repeatable: true,
        ..operation(operation_id)
    }
}

pub fn tree_of(operations: &[Operation]) -> MerkleTree {
    let leaves = operations.iter().map(Operation::leaf_hash).collect();
    MerkleTree::from_leaves(leaves).expect("at least one operation")
}

/// Proof for the operation at `index` in `tree`.
pub fn proof_for(tree: &MerkleTree, index: usize) -> Vec<Hash> {
    tree.proof(index).expect("index in range")
}

// ---------------------------------------------------------------------------
// Module executor
// ---------------------------------------------------------------------------

/// A call observed by [`MockModuleExecutor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub target: Address,
    pub value: u128,
    pub data: Vec<u8>,
}

/// Records every call and answers with scripted outcomes, falling back to
/// success with empty return data.
#[derive(Debug, Default)]
pub struct MockModuleExecutor {
    calls: Mutex<Vec<RecordedCall>>,
    scripted: Mutex<VecDeque<CallOutcome>>,
}

impl MockModuleExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `outcome` as the answer to the next unanswered call.
    pub fn push_outcome(&self, outcome: CallOutcome) {
        self.scripted.lock().unwrap().push_back(outcome);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ModuleExecutor for MockModuleExecutor {
    async fn execute_direct_call(&self, target: Address, value: u128, data: &[u8]) -> CallOutcome {
        self.calls.lock().unwrap().push(RecordedCall {
            target,
            value,
            data: data.to_vec(),
        });
        self.scripted
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| CallOutcome::success(Vec::new()))
    }
}

// ---------------------------------------------------------------------------
// Event sink
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(EngineEvent::name).collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: &EngineEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

// ---------------------------------------------------------------------------
// Registry oracles
// ---------------------------------------------------------------------------

/// Accepts every registration.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAllRegistry;

#[async_trait]
impl RegistryOracle for AcceptAllRegistry {
    async fn validate_task_registration(
        &self,
        _executor: Address,
        _fee_token: Address,
        _init_fee: u128,
        _max_fee: u128,
    ) -> Result<(), RegistryRejection> {
        Ok(())
    }
}

/// Rejects every registration with the given reason.
#[derive(Debug, Clone)]
pub struct RejectingRegistry(pub RegistryRejection);

#[async_trait]
impl RegistryOracle for RejectingRegistry {
    async fn validate_task_registration(
        &self,
        _executor: Address,
        _fee_token: Address,
        _init_fee: u128,
        _max_fee: u128,
    ) -> Result<(), RegistryRejection> {
        Err(self.0.clone())
    }
}

// ---------------------------------------------------------------------------
// Engine fixture
// ---------------------------------------------------------------------------

/// An engine wired to inspectable collaborators.
pub struct TestEngine {
    pub engine: Arc<Engine>,
    pub store: Arc<MemoryTaskStore>,
    pub executor: Arc<MockModuleExecutor>,
    pub events: Arc<RecordingEventSink>,
}

impl TestEngine {
    /// Engine owned by [`OWNER`] that accepts every registration.
    pub fn new() -> Self {
        Self::with_registry(Arc::new(AcceptAllRegistry))
    }

    pub fn with_registry(registry: Arc<dyn RegistryOracle>) -> Self {
        Self::with_parts(registry, Arc::new(MockModuleExecutor::new()))
    }

    pub fn with_parts(registry: Arc<dyn RegistryOracle>, executor: Arc<MockModuleExecutor>) -> Self {
        let store = Arc::new(MemoryTaskStore::new());
        let events = Arc::new(RecordingEventSink::new());
        let engine = Engine::builder(Arc::new(StaticOwner(OWNER)), registry, executor.clone())
            .store(store.clone())
            .event_sink(events.clone())
            .build();
        Self {
            engine: Arc::new(engine),
            store,
            executor,
            events,
        }
    }

    /// Register a task over `operations` for [`EXECUTOR`] and return its
    /// tree. Clears the registration event.
    pub async fn register(&self, operations: &[Operation]) -> MerkleTree {
        let tree = tree_of(operations);
        self.engine
            .register_task(&ctx(OWNER), tree.root(), EXECUTOR, FEE_TOKEN, 1_000, 10_000)
            .await
            .expect("registration succeeds");
        self.events.clear();
        tree
    }
}

impl Default for TestEngine {
    fn default() -> Self {
        Self::new()
    }
}
