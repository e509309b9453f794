//! Engine errors and their coarse classification.

use rootgate_store::{Address, BitmapError, CompactError, Hash, StoreError, TaskStatus};

use crate::collaborators::RegistryRejection;

/// Every way an engine entry point can fail. A failed call leaves no state
/// behind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("no task registered at root {0}")]
    TaskNotFound(Hash),

    #[error("a task is already registered at root {0}")]
    TaskAlreadyRegistered(Hash),

    #[error("caller {0} is not authorized for this task")]
    UnauthorizedExecutor(Address),

    #[error("caller {0} is not the account owner")]
    NotOwner(Address),

    #[error("status transition {from} -> {to} is not allowed")]
    InvalidTaskStatus { from: TaskStatus, to: TaskStatus },

    #[error("task status changed from {expected} to {actual} while it was being updated")]
    StatusChanged {
        expected: TaskStatus,
        actual: TaskStatus,
    },

    #[error("task is not active (status: {0})")]
    TaskNotActive(TaskStatus),

    #[error("operation is not included under root {0}")]
    InvalidMerkleProof(Hash),

    #[error("operation id {0} is out of bounds")]
    OperationIdOutOfBounds(u32),

    #[error("only direct calls may be executed")]
    InvalidCallType,

    #[error("timestamp {now} is outside the window [{start}, {end}]")]
    InvalidTimeWindow { now: u64, start: u64, end: u64 },

    #[error("gas price {actual} exceeds the operation's limit of {max}")]
    GasPriceTooHigh { actual: u128, max: u128 },

    #[error("operation {0} has already been executed")]
    OperationAlreadyExecuted(u32),

    #[error("operation {0} is already being executed")]
    OperationInFlight(u32),

    #[error("module call reverted with 0x{}", hex::encode(.0))]
    ModuleCallReverted(Vec<u8>),

    #[error("module execution failed")]
    ModuleExecutionFailed,

    #[error("registration rejected by registry: {0}")]
    RegistrationRejected(#[from] RegistryRejection),

    #[error("stored fee cannot be decoded: {0}")]
    FeeDecoding(#[from] CompactError),
}

/// Coarse classification of [`EngineError`] for callers that only need to
/// know what went wrong, not the exact variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Unauthorized,
    InvalidState,
    ProofInvalid,
    ConstraintViolation,
    AlreadyExecuted,
    AlreadyRegistered,
    ExternalCallFailed,
    UpstreamRejected,
    Internal,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TaskNotFound(_) => ErrorKind::NotFound,
            Self::UnauthorizedExecutor(_) | Self::NotOwner(_) => ErrorKind::Unauthorized,
            Self::InvalidTaskStatus { .. } | Self::StatusChanged { .. } | Self::TaskNotActive(_) => {
                ErrorKind::InvalidState
            }
            Self::InvalidMerkleProof(_) => ErrorKind::ProofInvalid,
            Self::OperationIdOutOfBounds(_)
            | Self::InvalidCallType
            | Self::InvalidTimeWindow { .. }
            | Self::GasPriceTooHigh { .. } => ErrorKind::ConstraintViolation,
            Self::OperationAlreadyExecuted(_) | Self::OperationInFlight(_) => {
                ErrorKind::AlreadyExecuted
            }
            Self::TaskAlreadyRegistered(_) => ErrorKind::AlreadyRegistered,
            Self::ModuleCallReverted(_) | Self::ModuleExecutionFailed => {
                ErrorKind::ExternalCallFailed
            }
            Self::RegistrationRejected(_) => ErrorKind::UpstreamRejected,
            Self::FeeDecoding(_) => ErrorKind::Internal,
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyExists(root) => Self::TaskAlreadyRegistered(root),
            StoreError::NotFound(root) => Self::TaskNotFound(root),
            StoreError::StatusMismatch { expected, actual } => {
                Self::StatusChanged { expected, actual }
            }
            StoreError::Bitmap(err) => err.into(),
        }
    }
}

impl From<BitmapError> for EngineError {
    fn from(err: BitmapError) -> Self {
        match err {
            BitmapError::OutOfBounds(id) => Self::OperationIdOutOfBounds(id),
        }
    }
}
