//! Fee policy constants and the per-transaction fee configuration.

use serde::{Deserialize, Serialize};

/// Outputs below this many satoshis are dust (data outputs excepted).
pub const DUST_AMOUNT: u64 = 546;

/// Factor bounding how far the actual fee may stray from the estimate.
pub const FEE_SECURITY_MARGIN: u64 = 150;

/// Largest amount any single output, or all outputs together, may carry.
pub const MAX_MONEY: u64 = 21_000_000 * 100_000_000;

/// Default fee rate in satoshis per 1000 bytes.
pub const FEE_PER_KB: u64 = 100_000;

/// Fee and dust policy for one transaction.
///
/// The transaction-level `fee_per_kb` / `fee_per_byte` settings take
/// priority over `fee_per_kb` here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeConfig {
    pub fee_per_kb: u64,
    pub dust_amount: u64,
    pub fee_security_margin: u64,
}

impl Default for FeeConfig {
    fn default() -> Self {
        FeeConfig {
            fee_per_kb: FEE_PER_KB,
            dust_amount: DUST_AMOUNT,
            fee_security_margin: FEE_SECURITY_MARGIN,
        }
    }
}

/// A fee rate, either per 1000 bytes or per byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FeeRate {
    PerKb(u64),
    PerByte(u64),
}

impl FeeRate {
    /// The fee for `size` bytes, rounded up.
    pub(crate) fn fee_for(&self, size: u64) -> u64 {
        match *self {
            FeeRate::PerKb(rate) => (size.saturating_mul(rate)).div_ceil(1000),
            FeeRate::PerByte(rate) => size.saturating_mul(rate),
        }
    }
}
