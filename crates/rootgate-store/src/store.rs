//! Root-keyed task storage.
//!
//! [`TaskStore`] is the only path through which task records change. The
//! engine snapshots a record with [`TaskStore::get`], validates against the
//! copy, and writes back with one of the narrow mutators. Implementations
//! must make each method atomic on its own; nothing here is held across an
//! `.await`.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::bitmap::{BitmapError, ExecutedBitmap};
use crate::models::{Hash, TaskRecord, TaskStatus};

/// Errors from store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("a task is already registered at root {0}")]
    AlreadyExists(Hash),

    #[error("no task registered at root {0}")]
    NotFound(Hash),

    #[error("task status is {actual}, expected {expected}")]
    StatusMismatch {
        expected: TaskStatus,
        actual: TaskStatus,
    },

    #[error(transparent)]
    Bitmap(#[from] BitmapError),
}

/// Storage for task records keyed by Merkle root.
pub trait TaskStore: Send + Sync {
    /// Return a copy of the record at `root`, if any.
    fn get(&self, root: &Hash) -> Option<TaskRecord>;

    /// Insert a record at a previously unused root.
    fn insert_new(&self, root: Hash, record: TaskRecord) -> Result<(), StoreError>;

    /// Move the status from `expected` to `status`, leaving every other
    /// field untouched. Fails with [`StoreError::StatusMismatch`] if the
    /// stored status is no longer `expected`.
    fn compare_and_set_status(
        &self,
        root: &Hash,
        expected: TaskStatus,
        status: TaskStatus,
    ) -> Result<(), StoreError>;

    /// Set bit `operation_id` in the stored bitmap (read-modify-write).
    /// Returns the updated bitmap.
    fn mark_executed(&self, root: &Hash, operation_id: u32) -> Result<ExecutedBitmap, StoreError>;

    /// Number of registered tasks.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-process [`TaskStore`] backed by a mutex-guarded map.
///
/// Starts empty; records are never removed.
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    tasks: Mutex<HashMap<Hash, TaskRecord>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Hash, TaskRecord>> {
        // A panic while holding the lock cannot leave a record half-written:
        // every mutation below is a single field assignment.
        self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// All registered roots, in no particular order.
    pub fn roots(&self) -> Vec<Hash> {
        self.lock().keys().copied().collect()
    }
}

impl TaskStore for MemoryTaskStore {
    fn get(&self, root: &Hash) -> Option<TaskRecord> {
        self.lock().get(root).copied()
    }

    fn insert_new(&self, root: Hash, record: TaskRecord) -> Result<(), StoreError> {
        let mut tasks = self.lock();
        if tasks.contains_key(&root) {
            return Err(StoreError::AlreadyExists(root));
        }
        tasks.insert(root, record);
        tracing::debug!(root = %root, tasks = tasks.len(), "task record inserted");
        Ok(())
    }

    fn compare_and_set_status(
        &self,
        root: &Hash,
        expected: TaskStatus,
        status: TaskStatus,
    ) -> Result<(), StoreError> {
        let mut tasks = self.lock();
        let record = tasks.get_mut(root).ok_or(StoreError::NotFound(*root))?;
        if record.status != expected {
            return Err(StoreError::StatusMismatch {
                expected,
                actual: record.status,
            });
        }
        record.status = status;
        Ok(())
    }

    fn mark_executed(&self, root: &Hash, operation_id: u32) -> Result<ExecutedBitmap, StoreError> {
        let mut tasks = self.lock();
        let record = tasks.get_mut(root).ok_or(StoreError::NotFound(*root))?;
        record.executed.set(operation_id)?;
        Ok(record.executed)
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}
