//! In-flight reservations for non-repeatable operations.
//!
//! Between validation and commit the engine awaits the module executor. A
//! reservation on `(root, operation_id)` spans that window so a reentrant
//! or concurrent submission of the same id cannot pass validation against
//! a bitmap that has not been written yet. Dropping the reservation
//! releases it, so a failed or cancelled call leaves nothing behind.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use rootgate_store::Hash;

use crate::error::EngineError;

#[derive(Debug, Default)]
pub(crate) struct InFlight {
    active: Mutex<HashSet<(Hash, u32)>>,
}

impl InFlight {
    fn lock(&self) -> MutexGuard<'_, HashSet<(Hash, u32)>> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Reserve `(root, operation_id)`, failing if it is already reserved.
    pub(crate) fn reserve(&self, root: Hash, operation_id: u32) -> Result<Reservation<'_>, EngineError> {
        let key = (root, operation_id);
        if !self.lock().insert(key) {
            return Err(EngineError::OperationInFlight(operation_id));
        }
        Ok(Reservation {
            in_flight: self,
            key,
        })
    }

    #[cfg(test)]
    pub(crate) fn is_reserved(&self, root: &Hash, operation_id: u32) -> bool {
        self.lock().contains(&(*root, operation_id))
    }
}

/// RAII handle for a reservation.
#[derive(Debug)]
pub(crate) struct Reservation<'a> {
    in_flight: &'a InFlight,
    key: (Hash, u32),
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.key);
    }
}
