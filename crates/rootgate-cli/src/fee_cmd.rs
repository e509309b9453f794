//! `rootgate fee`: inspect the compact fee encoding.

use anyhow::{Context, Result};
use serde::Serialize;

use rootgate_store::CompressedAmount;

/// Breakdown of one compressed amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeeReport {
    pub raw: u64,
    pub raw_hex: String,
    pub significand: u64,
    pub exponent: u8,
    pub decoded: String,
}

impl FeeReport {
    fn new(amount: CompressedAmount) -> Result<Self> {
        let decoded = amount
            .decompress()
            .context("compressed amount does not decode to a 128-bit value")?;
        Ok(Self {
            raw: amount.raw(),
            raw_hex: format!("{:#014x}", amount.raw()),
            significand: amount.significand(),
            exponent: amount.exponent(),
            decoded: decoded.to_string(),
        })
    }
}

/// Encode a decimal amount, rounding down unless `round_up` is set.
pub fn encode(amount: &str, round_up: bool) -> Result<FeeReport> {
    let value: u128 = amount
        .replace('_', "")
        .parse()
        .with_context(|| format!("invalid amount: {amount:?}"))?;
    FeeReport::new(CompressedAmount::compress(value, round_up))
}

/// Decode a raw 48-bit value given in decimal or `0x` hex.
pub fn decode(raw: &str) -> Result<FeeReport> {
    let parsed = match raw.strip_prefix("0x") {
        Some(digits) => u64::from_str_radix(digits, 16),
        None => raw.parse(),
    }
    .with_context(|| format!("invalid raw value: {raw:?}"))?;
    let amount = CompressedAmount::from_raw(parsed)?;
    FeeReport::new(amount)
}

pub fn print(report: &FeeReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
