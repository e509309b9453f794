//! Fixed-capacity execution bitmap.
//!
//! Bit `i` records whether the non-repeatable operation with id `i` has
//! fired. Capacity is [`ExecutedBitmap::CAPACITY`] ids; bits are only ever
//! set, never cleared.

use serde::{Deserialize, Serialize};

/// Errors from bitmap access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BitmapError {
    #[error("operation id {0} out of bounds (capacity {cap})", cap = ExecutedBitmap::CAPACITY)]
    OutOfBounds(u32),
}

/// An 88-bit set of executed operation ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutedBitmap(u128);

impl ExecutedBitmap {
    /// Number of trackable operation ids: `0..CAPACITY`.
    pub const CAPACITY: u32 = 88;

    pub const EMPTY: ExecutedBitmap = ExecutedBitmap(0);

    const MASK: u128 = (1u128 << Self::CAPACITY) - 1;

    /// Rebuild a bitmap from its raw word. Bits at or above
    /// [`Self::CAPACITY`] are dropped.
    pub fn from_bits(bits: u128) -> Self {
        Self(bits & Self::MASK)
    }

    pub fn bits(&self) -> u128 {
        self.0
    }

    /// Check that `id` addresses a bit inside the bitmap.
    pub fn check_bounds(id: u32) -> Result<(), BitmapError> {
        if id >= Self::CAPACITY {
            return Err(BitmapError::OutOfBounds(id));
        }
        Ok(())
    }

    pub fn is_set(&self, id: u32) -> Result<bool, BitmapError> {
        Self::check_bounds(id)?;
        Ok(self.0 & (1u128 << id) != 0)
    }

    /// Set bit `id`. Setting an already-set bit is a no-op.
    pub fn set(&mut self, id: u32) -> Result<(), BitmapError> {
        Self::check_bounds(id)?;
        self.0 |= 1u128 << id;
        Ok(())
    }

    /// Return a copy with bit `id` set.
    pub fn with(mut self, id: u32) -> Result<Self, BitmapError> {
        self.set(id)?;
        Ok(self)
    }

    pub fn count(&self) -> u32 {
        self.0.count_ones()
    }

    /// Iterate over the set ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        (0..Self::CAPACITY).filter(move |id| self.0 & (1u128 << id) != 0)
    }
}
