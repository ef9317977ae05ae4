//! The original (pre-segwit) signature hash.
//!
//! The digest is the double SHA-256 of a modified copy of the transaction:
//! every input script is blanked except the one being signed, which carries
//! the subscript, and inputs and outputs are dropped or truncated according
//! to the sighash flag. The 4-byte flag is appended before hashing.

use btc_primitives::hash::sha256d;
use btc_primitives::util::{VarInt, WireWriter};
use btc_script::opcodes::{OP_CODESEPARATOR, OP_PUSHDATA1, OP_PUSHDATA2, OP_PUSHDATA4};
use btc_script::Script;
use log::trace;

use super::{base_type, is_anyone_can_pay, SIGHASH_NONE, SIGHASH_SINGLE};
use crate::input::Input;
use crate::transaction::Transaction;
use crate::TransactionError;

/// Digest returned for SIGHASH_SINGLE when the input has no matching output:
/// the integer one, little-endian.
fn sighash_single_bug() -> [u8; 32] {
    let mut one = [0u8; 32];
    one[0] = 1;
    one
}

/// Compute the legacy signature hash for a given input.
///
/// # Arguments
/// * `tx`           - The transaction being signed.
/// * `input_index`  - Index of the input being signed.
/// * `subscript`    - The script being satisfied: the spent output's script,
///   or the redeem script for P2SH.
/// * `sighash_type` - The sighash flag.
///
/// # Returns
/// The 32-byte digest to sign, or `InvalidIndex` for a bad input index.
pub fn signature_hash(
    tx: &Transaction,
    input_index: usize,
    subscript: &Script,
    sighash_type: u32,
) -> Result<[u8; 32], TransactionError> {
    let inputs = tx.inputs();
    let outputs = tx.outputs();
    if input_index >= inputs.len() {
        return Err(TransactionError::InvalidIndex {
            index: input_index,
            len: inputs.len(),
        });
    }

    let base = base_type(sighash_type);
    if base == SIGHASH_SINGLE && input_index >= outputs.len() {
        return Ok(sighash_single_bug());
    }

    let script_code = strip_code_separators(subscript)?;
    let mut writer = WireWriter::with_capacity(tx.base_size() + script_code.len() + 4);
    writer.write_u32_le(tx.version);

    if is_anyone_can_pay(sighash_type) {
        writer.write_varint(VarInt::from(1usize));
        let input = &inputs[input_index];
        write_input(&mut writer, input, &script_code, input.sequence_number);
    } else {
        writer.write_varint(VarInt::from(inputs.len()));
        for (i, input) in inputs.iter().enumerate() {
            if i == input_index {
                write_input(&mut writer, input, &script_code, input.sequence_number);
            } else {
                let sequence = match base {
                    SIGHASH_NONE | SIGHASH_SINGLE => 0,
                    _ => input.sequence_number,
                };
                write_input(&mut writer, input, &[], sequence);
            }
        }
    }

    match base {
        SIGHASH_NONE => writer.write_varint(VarInt::from(0usize)),
        SIGHASH_SINGLE => {
            writer.write_varint(VarInt::from(input_index + 1));
            for _ in 0..input_index {
                writer.write_u64_le(u64::MAX);
                writer.write_varint(VarInt::from(0usize));
            }
            outputs[input_index].write_to(&mut writer);
        }
        _ => {
            writer.write_varint(VarInt::from(outputs.len()));
            for output in outputs {
                output.write_to(&mut writer);
            }
        }
    }

    writer.write_u32_le(tx.lock_time);
    writer.write_u32_le(sighash_type);

    let digest = sha256d(writer.as_bytes());
    trace!(
        "legacy sighash input={} type=0x{:02x} digest={}",
        input_index,
        sighash_type,
        hex::encode(digest)
    );
    Ok(digest)
}

fn write_input(writer: &mut WireWriter, input: &Input, script: &[u8], sequence: u32) {
    writer.write_bytes(input.prev_tx_id.as_bytes());
    writer.write_u32_le(input.output_index);
    writer.write_var_bytes(script);
    writer.write_u32_le(sequence);
}

/// The subscript with every OP_CODESEPARATOR removed.
fn strip_code_separators(script: &Script) -> Result<Vec<u8>, TransactionError> {
    if !script.has_code_separators() {
        return Ok(script.to_bytes().to_vec());
    }
    let mut out = Vec::with_capacity(script.len());
    for chunk in script.chunks()? {
        if chunk.op == OP_CODESEPARATOR {
            continue;
        }
        out.push(chunk.op);
        if let Some(data) = &chunk.data {
            match chunk.op {
                OP_PUSHDATA1 => out.push(data.len() as u8),
                OP_PUSHDATA2 => out.extend_from_slice(&(data.len() as u16).to_le_bytes()),
                OP_PUSHDATA4 => out.extend_from_slice(&(data.len() as u32).to_le_bytes()),
                _ => {}
            }
            out.extend_from_slice(data);
        }
    }
    Ok(out)
}
