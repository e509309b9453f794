//! Compact decimal-float encoding for fee amounts.
//!
//! A [`CompressedAmount`] is 48 bits wide: a 40-bit significand in the upper
//! bits and an 8-bit base-10 exponent in the low byte, so the decoded value
//! is `significand * 10^exponent`.
//!
//! Encoding is lossy. For a value that had to be scaled, the decoded amount
//! differs from the original by less than `10^exponent`, which keeps the
//! relative error below `1e-11`. Values below `2^40` round-trip exactly.

use serde::{Deserialize, Serialize};

/// Errors from the compact encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CompactError {
    #[error("compressed amount {0:#x} is wider than 48 bits")]
    TooWide(u64),

    #[error("significand {0} does not fit in 40 bits")]
    SignificandTooWide(u64),

    #[error("decoding {significand}e{exponent} overflows a 128-bit amount")]
    Overflow { significand: u64, exponent: u8 },
}

/// A fee amount in compact `significand × 10^exponent` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompressedAmount(u64);

impl CompressedAmount {
    /// Width of the significand field in bits.
    pub const SIGNIFICAND_BITS: u32 = 40;
    /// Width of the exponent field in bits.
    pub const EXPONENT_BITS: u32 = 8;
    /// Total encoded width in bits.
    pub const WIDTH: u32 = Self::SIGNIFICAND_BITS + Self::EXPONENT_BITS;

    pub const MAX_SIGNIFICAND: u64 = (1u64 << Self::SIGNIFICAND_BITS) - 1;

    pub const ZERO: CompressedAmount = CompressedAmount(0);

    /// Encode `value`.
    ///
    /// With `round_up` the result never decodes below `value`; without it
    /// the discarded digits are truncated and the result never decodes
    /// above `value`. Rounding up saturates: when the rounded encoding would
    /// decode past `u128::MAX`, the truncated encoding is returned instead,
    /// so every result of `compress` decodes.
    pub fn compress(value: u128, round_up: bool) -> Self {
        if value == 0 {
            return Self::ZERO;
        }

        let max = u128::from(Self::MAX_SIGNIFICAND);
        let mut significand = value;
        let mut exponent: u8 = 0;
        let mut inexact = false;

        while significand > max {
            inexact |= significand % 10 != 0;
            significand /= 10;
            exponent += 1;
        }

        // `significand <= MAX_SIGNIFICAND` here, so the narrowing is lossless.
        let truncated = Self::pack(significand as u64, exponent);
        if !(round_up && inexact) {
            return truncated;
        }

        significand += 1;
        if significand > max {
            significand = significand.div_ceil(10);
            exponent += 1;
        }
        let rounded = Self::pack(significand as u64, exponent);
        match rounded.decompress() {
            Ok(_) => rounded,
            Err(_) => truncated,
        }
    }

    /// Build from explicit parts.
    pub fn from_parts(significand: u64, exponent: u8) -> Result<Self, CompactError> {
        if significand > Self::MAX_SIGNIFICAND {
            return Err(CompactError::SignificandTooWide(significand));
        }
        Ok(Self::pack(significand, exponent))
    }

    /// Rebuild from the raw 48-bit word.
    pub fn from_raw(raw: u64) -> Result<Self, CompactError> {
        if raw >> Self::WIDTH != 0 {
            return Err(CompactError::TooWide(raw));
        }
        Ok(Self(raw))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    pub fn significand(&self) -> u64 {
        self.0 >> Self::EXPONENT_BITS
    }

    pub fn exponent(&self) -> u8 {
        (self.0 & 0xff) as u8
    }

    /// Decode back to an amount.
    pub fn decompress(&self) -> Result<u128, CompactError> {
        let significand = self.significand();
        let exponent = self.exponent();
        if significand == 0 {
            return Ok(0);
        }
        10u128
            .checked_pow(u32::from(exponent))
            .and_then(|scale| scale.checked_mul(u128::from(significand)))
            .ok_or(CompactError::Overflow {
                significand,
                exponent,
            })
    }

    fn pack(significand: u64, exponent: u8) -> Self {
        Self((significand << Self::EXPONENT_BITS) | u64::from(exponent))
    }
}
