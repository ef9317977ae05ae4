//! Spends of bare pay-to-public-key outputs.

use btc_primitives::ec::PublicKey;
use btc_script::Script;

/// Length byte plus DER signature with sighash byte.
const SIGNATURE_SIZE: usize = 73;

/// True if `script` pays to `key`, in the encoding the key was given in.
pub(crate) fn pays_to(script: &Script, key: &PublicKey) -> bool {
    match script.public_key() {
        Ok(locked) => locked.to_bytes() == key.to_bytes(),
        Err(_) => false,
    }
}

/// True once the scriptSig is a single push.
pub(crate) fn is_fully_signed(script: &Script) -> bool {
    match script.chunks() {
        Ok(chunks) => chunks.len() == 1 && chunks[0].data.is_some(),
        Err(_) => false,
    }
}

pub(crate) fn weight(base: usize) -> usize {
    4 * (base + SIGNATURE_SIZE)
}
