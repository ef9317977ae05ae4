//! Signature hash computation for transaction signing.
//!
//! Three digest algorithms are supported, selected by the kind of output
//! being spent:
//! - [`legacy`]: the original algorithm, used for P2PKH, P2PK, bare and
//!   P2SH multisig spends.
//! - [`witness`]: BIP143, used for native and nested witness v0 spends.
//! - [`taproot`]: BIP341, used for taproot key-path spends.

pub mod legacy;
pub mod taproot;
pub mod witness;

// -----------------------------------------------------------------------
// Sighash flag constants
// -----------------------------------------------------------------------

/// Taproot only: sign everything, and omit the sighash byte from the signature.
pub const SIGHASH_DEFAULT: u32 = 0x00;

/// Sign all inputs and all outputs.
pub const SIGHASH_ALL: u32 = 0x01;

/// Sign all inputs but no outputs, allowing outputs to be modified.
pub const SIGHASH_NONE: u32 = 0x02;

/// Sign all inputs and only the output with the same index as the signed input.
pub const SIGHASH_SINGLE: u32 = 0x03;

/// Combined with another flag: only sign the current input, allowing other
/// inputs to be added later.
pub const SIGHASH_ANYONECANPAY: u32 = 0x80;

/// Mask applied to extract the base sighash type (ALL, NONE, SINGLE).
pub const SIGHASH_BASE_MASK: u32 = 0x1f;

/// Taproot: the bits selecting which outputs are committed to.
pub const SIGHASH_OUTPUT_MASK: u32 = 0x03;

/// Taproot: the bit selecting whether other inputs are committed to.
pub const SIGHASH_INPUT_MASK: u32 = 0x80;

/// Base type of a sighash flag.
pub(crate) fn base_type(sighash_type: u32) -> u32 {
    sighash_type & SIGHASH_BASE_MASK
}

pub(crate) fn is_anyone_can_pay(sighash_type: u32) -> bool {
    sighash_type & SIGHASH_ANYONECANPAY != 0
}
