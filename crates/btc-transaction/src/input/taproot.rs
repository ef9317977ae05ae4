//! Key-path spends of taproot outputs.

use btc_primitives::ec::{PrivateKey, PublicKey};
use btc_primitives::schnorr;
use btc_script::Script;

use crate::sighash::taproot as taproot_sighash;
use crate::transaction::Transaction;
use crate::TransactionError;

/// Witness item count, length byte, 64-byte signature and optional sighash byte.
const WITNESS_SIZE: usize = 1 + 1 + 65;

/// True if `script` is the key-path-only taproot output of `key`.
pub(crate) fn pays_to(script: &Script, key: &PublicKey) -> bool {
    match Script::build_taproot_out(key) {
        Ok(expected) => &expected == script,
        Err(_) => false,
    }
}

/// The tweaked x-only output key committed to by `script`.
pub(crate) fn output_key(script: &Script) -> Option<[u8; 32]> {
    match script.witness_program() {
        Some((1, program)) => program.try_into().ok(),
        _ => None,
    }
}

/// Sign the key-path digest with the tweaked private key.
pub(crate) fn sign(
    tx: &Transaction,
    key: &PrivateKey,
    input_index: usize,
    sighash_type: u32,
) -> Result<[u8; 64], TransactionError> {
    let digest = taproot_sighash::signature_hash(tx, input_index, sighash_type)?;
    Ok(key.sign_schnorr_tweaked(&digest)?)
}

/// Check a key-path signature against the output key in `script`.
pub(crate) fn verify(
    tx: &Transaction,
    script: &Script,
    input_index: usize,
    sighash_type: u32,
    signature: &[u8; 64],
) -> Result<bool, TransactionError> {
    let Some(output_key) = output_key(script) else {
        return Ok(false);
    };
    let digest = taproot_sighash::signature_hash(tx, input_index, sighash_type)?;
    Ok(schnorr::verify(&output_key, &digest, signature))
}

pub(crate) fn weight(base: usize) -> usize {
    4 * base + WITNESS_SIZE
}
