//! Core engine for rootgate: Merkle-committed task registration, lifecycle
//! management and validated execution of pre-authorized operations.

pub mod collaborators;
pub mod engine;
pub mod error;
pub mod events;
pub mod manifest;
pub mod merkle;
pub mod operation;
pub mod state;

pub use collaborators::{
    CallOutcome, ModuleExecutor, OwnerSource, RegistryOracle, RegistryRejection, StaticOwner,
};
pub use engine::{Engine, EngineBuilder, TaskInfo};
pub use error::{EngineError, ErrorKind};
pub use events::{EngineEvent, EventSink, TracingEventSink};
pub use operation::{CallContext, CallType, Operation};
