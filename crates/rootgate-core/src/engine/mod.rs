//! The task engine: registry, lifecycle and execution validator.
//!
//! ```text
//! owner --register_task------> TaskStore (root -> TaskRecord)
//! owner/executor --update_task_status--^
//! executor --execute_transaction--> snapshot -> validate -> ModuleExecutor
//!                                                     |
//!                                      commit bitmap <-+
//! ```
//!
//! Every entry point is all-or-nothing: validation and external calls
//! happen before the single store write that commits the result.

mod execute;
mod lifecycle;
mod reservation;

use std::sync::Arc;

use rootgate_store::{Address, MemoryTaskStore, TaskStatus, TaskStore};

use crate::collaborators::{ModuleExecutor, OwnerSource, RegistryOracle};
use crate::events::{EngineEvent, EventSink, TracingEventSink};

use reservation::InFlight;

/// Decoded view of a task, as returned by [`Engine::get_task_info`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskInfo {
    pub executor: Address,
    pub status: TaskStatus,
    pub fee_token: Address,
    /// Approximate: decoded from the compact encoding.
    pub init_fee: u128,
    /// Approximate: decoded from the compact encoding.
    pub max_fee: u128,
}

/// Registry and execution validator for Merkle-committed tasks.
pub struct Engine {
    store: Arc<dyn TaskStore>,
    owner: Arc<dyn OwnerSource>,
    registry: Arc<dyn RegistryOracle>,
    executor: Arc<dyn ModuleExecutor>,
    events: Arc<dyn EventSink>,
    in_flight: InFlight,
}

impl Engine {
    pub fn builder(
        owner: Arc<dyn OwnerSource>,
        registry: Arc<dyn RegistryOracle>,
        executor: Arc<dyn ModuleExecutor>,
    ) -> EngineBuilder {
        EngineBuilder::new(owner, registry, executor)
    }

    /// The account's current controlling identity.
    pub fn owner(&self) -> Address {
        self.owner.owner()
    }

    fn emit(&self, event: EngineEvent) {
        self.events.emit(&event);
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("owner", &self.owner.owner())
            .field("tasks", &self.store.len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Engine`].
///
/// The store defaults to an empty [`MemoryTaskStore`] and events go to
/// [`TracingEventSink`] unless overridden.
pub struct EngineBuilder {
    owner: Arc<dyn OwnerSource>,
    registry: Arc<dyn RegistryOracle>,
    executor: Arc<dyn ModuleExecutor>,
    store: Option<Arc<dyn TaskStore>>,
    events: Option<Arc<dyn EventSink>>,
}

impl EngineBuilder {
    pub fn new(
        owner: Arc<dyn OwnerSource>,
        registry: Arc<dyn RegistryOracle>,
        executor: Arc<dyn ModuleExecutor>,
    ) -> Self {
        Self {
            owner,
            registry,
            executor,
            store: None,
            events: None,
        }
    }

    pub fn store(mut self, store: Arc<dyn TaskStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            store: self
                .store
                .unwrap_or_else(|| Arc::new(MemoryTaskStore::new())),
            owner: self.owner,
            registry: self.registry,
            executor: self.executor,
            events: self.events.unwrap_or_else(|| Arc::new(TracingEventSink)),
            in_flight: InFlight::default(),
        }
    }
}
