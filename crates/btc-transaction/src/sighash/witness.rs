//! BIP143 signature hash for witness v0 spends.
//!
//! See <https://github.com/bitcoin/bips/blob/master/bip-0143.mediawiki>

use btc_primitives::hash::sha256d;
use btc_primitives::util::{VarInt, WireWriter};
use log::trace;

use super::{base_type, is_anyone_can_pay, SIGHASH_NONE, SIGHASH_SINGLE};
use crate::transaction::Transaction;
use crate::TransactionError;

/// Compute the BIP143 signature hash for a given input.
///
/// # Arguments
/// * `tx`           - The transaction being signed.
/// * `input_index`  - Index of the input being signed.
/// * `script_code`  - The scriptCode, without its length prefix.
/// * `satoshis`     - The value of the output being spent.
/// * `sighash_type` - The sighash flag.
///
/// # Returns
/// A 32-byte double-SHA256 hash to be signed by ECDSA.
pub fn signature_hash(
    tx: &Transaction,
    input_index: usize,
    script_code: &[u8],
    satoshis: u64,
    sighash_type: u32,
) -> Result<[u8; 32], TransactionError> {
    let preimage = calc_preimage(tx, input_index, script_code, satoshis, sighash_type)?;
    let digest = sha256d(&preimage);
    trace!(
        "witness v0 sighash input={} type=0x{:02x} digest={}",
        input_index,
        sighash_type,
        hex::encode(digest)
    );
    Ok(digest)
}

/// Compute the BIP143 preimage bytes before double-hashing.
///
/// The preimage consists of:
/// 1. nVersion (4 bytes LE)
/// 2. hashPrevouts (32 bytes) - sha256d of all outpoints unless ANYONECANPAY
/// 3. hashSequence (32 bytes) - sha256d of all sequences unless ANYONECANPAY/SINGLE/NONE
/// 4. outpoint (32+4 bytes) - txid + vout of the input being signed
/// 5. scriptCode (varint + script)
/// 6. value (8 bytes LE) - satoshis of the output being spent
/// 7. nSequence (4 bytes LE) - sequence of the input being signed
/// 8. hashOutputs (32 bytes) - sha256d of all outputs or one output
/// 9. nLocktime (4 bytes LE)
/// 10. sighashType (4 bytes LE)
pub fn calc_preimage(
    tx: &Transaction,
    input_index: usize,
    script_code: &[u8],
    satoshis: u64,
    sighash_type: u32,
) -> Result<Vec<u8>, TransactionError> {
    let inputs = tx.inputs();
    let input = inputs.get(input_index).ok_or(TransactionError::InvalidIndex {
        index: input_index,
        len: inputs.len(),
    })?;
    let base = base_type(sighash_type);
    let anyone_can_pay = is_anyone_can_pay(sighash_type);

    let hash_prevouts = if !anyone_can_pay {
        prevouts_hash(tx)
    } else {
        [0u8; 32]
    };

    let hash_sequence = if !anyone_can_pay && base != SIGHASH_SINGLE && base != SIGHASH_NONE {
        sequence_hash(tx)
    } else {
        [0u8; 32]
    };

    let hash_outputs = if base != SIGHASH_SINGLE && base != SIGHASH_NONE {
        outputs_hash(tx, None)
    } else if base == SIGHASH_SINGLE && input_index < tx.outputs().len() {
        outputs_hash(tx, Some(input_index))
    } else {
        [0u8; 32]
    };

    let mut writer = WireWriter::with_capacity(156 + script_code.len());
    writer.write_u32_le(tx.version);
    writer.write_bytes(&hash_prevouts);
    writer.write_bytes(&hash_sequence);
    writer.write_bytes(input.prev_tx_id.as_bytes());
    writer.write_u32_le(input.output_index);
    writer.write_varint(VarInt::from(script_code.len()));
    writer.write_bytes(script_code);
    writer.write_u64_le(satoshis);
    writer.write_u32_le(input.sequence_number);
    writer.write_bytes(&hash_outputs);
    writer.write_u32_le(tx.lock_time);
    writer.write_u32_le(sighash_type);

    Ok(writer.into_bytes())
}

// -----------------------------------------------------------------------
// Internal helper functions
// -----------------------------------------------------------------------

fn prevouts_hash(tx: &Transaction) -> [u8; 32] {
    let mut writer = WireWriter::with_capacity(tx.inputs().len() * 36);
    for input in tx.inputs() {
        writer.write_bytes(input.prev_tx_id.as_bytes());
        writer.write_u32_le(input.output_index);
    }
    sha256d(writer.as_bytes())
}

fn sequence_hash(tx: &Transaction) -> [u8; 32] {
    let mut writer = WireWriter::with_capacity(tx.inputs().len() * 4);
    for input in tx.inputs() {
        writer.write_u32_le(input.sequence_number);
    }
    sha256d(writer.as_bytes())
}

/// sha256d of all serialized outputs, or of the single output at `only`.
fn outputs_hash(tx: &Transaction, only: Option<usize>) -> [u8; 32] {
    let mut writer = WireWriter::new();
    match only {
        Some(index) => tx.outputs()[index].write_to(&mut writer),
        None => {
            for output in tx.outputs() {
                output.write_to(&mut writer);
            }
        }
    }
    sha256d(writer.as_bytes())
}
