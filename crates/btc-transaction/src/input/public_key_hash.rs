//! Single-key spends of P2PKH, P2WPKH and P2SH-wrapped P2WPKH outputs.

use btc_primitives::ec::PublicKey;
use btc_script::Script;

use super::ScriptWrapping;
use crate::TransactionError;

/// Length byte plus DER signature with sighash byte, and length byte plus compressed key.
const SIGNATURE_AND_KEY_SIZE: usize = 73 + 34;
/// The `0014{hash}` program pushed by a nested scriptSig.
const NESTED_PROGRAM_SIZE: usize = 23;

/// Find how a key-hash output is wrapped.
///
/// A P2SH output is taken to be P2SH-P2WPKH; whether it really is can only
/// be checked once a key is offered.
pub(crate) fn wrapping_of(script: &Script) -> Option<ScriptWrapping> {
    if script.is_public_key_hash_out() {
        Some(ScriptWrapping::Legacy)
    } else if script.is_witness_public_key_hash_out() {
        Some(ScriptWrapping::Native)
    } else if script.is_script_hash_out() {
        Some(ScriptWrapping::Nested)
    } else {
        None
    }
}

/// The output script `key` can spend under `wrapping`.
pub(crate) fn locking_script(key: &PublicKey, wrapping: ScriptWrapping) -> Script {
    let hash = key.hash160();
    match wrapping {
        ScriptWrapping::Legacy => Script::build_public_key_hash_out(&hash),
        ScriptWrapping::Native => Script::build_witness_public_key_hash_out(&hash),
        ScriptWrapping::Nested => {
            Script::build_script_hash_out(&Script::build_witness_public_key_hash_out(&hash))
        }
    }
}

/// BIP143 scriptCode for a witness key-hash spend.
pub(crate) fn script_code(key: &PublicKey) -> Script {
    Script::build_public_key_hash_out(&key.hash160())
}

/// scriptSig and witness stack carrying `signature` for `key`.
pub(crate) fn unlocking(
    signature: &[u8],
    key: &PublicKey,
    wrapping: ScriptWrapping,
) -> Result<(Script, Vec<Vec<u8>>), TransactionError> {
    match wrapping {
        ScriptWrapping::Legacy => Ok((Script::build_public_key_hash_in(signature, key), Vec::new())),
        ScriptWrapping::Native => Ok((Script::new(), vec![signature.to_vec(), key.to_bytes()])),
        ScriptWrapping::Nested => {
            let mut script_sig = Script::new();
            script_sig
                .append_push_data(Script::build_witness_public_key_hash_out(&key.hash160()).to_bytes())?;
            Ok((script_sig, vec![signature.to_vec(), key.to_bytes()]))
        }
    }
}

/// True once the scriptSig or witness has the `<sig> <pubkey>` shape.
pub(crate) fn is_fully_signed(script: &Script, witnesses: &[Vec<u8>], wrapping: ScriptWrapping) -> bool {
    match wrapping {
        ScriptWrapping::Legacy => match script.chunks() {
            Ok(chunks) => chunks.len() == 2 && chunks.iter().all(|c| c.data.is_some()),
            Err(_) => false,
        },
        ScriptWrapping::Native | ScriptWrapping::Nested => {
            witnesses.len() == 2 && witnesses.iter().all(|item| !item.is_empty())
        }
    }
}

pub(crate) fn weight(base: usize, wrapping: ScriptWrapping) -> usize {
    match wrapping {
        ScriptWrapping::Legacy => 4 * (base + SIGNATURE_AND_KEY_SIZE),
        ScriptWrapping::Native => 4 * base + SIGNATURE_AND_KEY_SIZE,
        ScriptWrapping::Nested => 4 * (base + NESTED_PROGRAM_SIZE) + SIGNATURE_AND_KEY_SIZE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "02feab7deafbdb39885ef92a285dfa0f4ada0feefce43685e6551c95e71496d980";

    #[test]
    fn test_wrapping_of() {
        let key = PublicKey::from_hex(KEY).unwrap();
        for wrapping in [ScriptWrapping::Legacy, ScriptWrapping::Native, ScriptWrapping::Nested] {
            assert_eq!(wrapping_of(&locking_script(&key, wrapping)), Some(wrapping));
        }
        assert_eq!(wrapping_of(&Script::from_hex("6a").unwrap()), None);
    }

    #[test]
    fn test_nested_unlocking_pushes_program() {
        let key = PublicKey::from_hex(KEY).unwrap();
        let (script_sig, stack) = unlocking(&[0x30, 0x01], &key, ScriptWrapping::Nested).unwrap();
        assert_eq!(script_sig.len(), 23);
        assert_eq!(&script_sig.to_bytes()[..3], &[0x16, 0x00, 0x14]);
        assert_eq!(stack.len(), 2);
        assert!(is_fully_signed(&script_sig, &stack, ScriptWrapping::Nested));
    }

    #[test]
    fn test_weights() {
        assert_eq!(weight(41, ScriptWrapping::Legacy), 592);
        assert_eq!(weight(41, ScriptWrapping::Native), 271);
        assert_eq!(weight(41, ScriptWrapping::Nested), 363);
    }
}
