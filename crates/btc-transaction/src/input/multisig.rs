//! Threshold signature collection for bare and script-hash multisig inputs.
//!
//! Signatures are held in one slot per public key, in the order the keys
//! appear in the locking (or redeem) script. CHECKMULTISIG consumes
//! signatures in key order, so the unlocking data is always rebuilt from
//! the slots rather than from arrival order.

use btc_primitives::ec::PublicKey;
use btc_script::Script;

use super::ScriptWrapping;
use crate::signature::TransactionSignature;
use crate::TransactionError;

/// Push opcodes, threshold and CHECKMULTISIG of a redeem script, plus its length prefix.
const MAX_OPCODES_SIZE: usize = 8;
/// Length byte, DER signature and sighash byte.
const MAX_SIGNATURE_SIZE: usize = 74;
/// Length byte and compressed key.
const MAX_PUBKEY_SIZE: usize = 34;
/// The `0020{hash}` program pushed by a nested scriptSig.
const NESTED_PROGRAM_SIZE: usize = 34;
/// Length byte, DER signature and sighash byte in a bare scriptSig.
const BARE_SIGNATURE_SIZE: usize = 73;

/// Keys and threshold for a multisig spending condition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultisigParams {
    pub public_keys: Vec<PublicKey>,
    pub threshold: usize,
    /// Sort the keys before building the redeem script.
    pub sort_keys: bool,
}

impl MultisigParams {
    pub fn new(public_keys: Vec<PublicKey>, threshold: usize) -> Self {
        MultisigParams {
            public_keys,
            threshold,
            sort_keys: true,
        }
    }

    /// Keep the keys in the given order.
    pub fn without_sorting(mut self) -> Self {
        self.sort_keys = false;
        self
    }
}

/// Signatures collected so far for an m-of-n condition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultisigState {
    public_keys: Vec<PublicKey>,
    threshold: usize,
    signatures: Vec<Option<TransactionSignature>>,
}

impl MultisigState {
    pub(crate) fn new(public_keys: Vec<PublicKey>, threshold: usize) -> Self {
        let signatures = vec![None; public_keys.len()];
        MultisigState {
            public_keys,
            threshold,
            signatures,
        }
    }

    /// The keys in script order.
    pub fn public_keys(&self) -> &[PublicKey] {
        &self.public_keys
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// One slot per key, `None` where that key has not signed.
    pub fn signatures(&self) -> &[Option<TransactionSignature>] {
        &self.signatures
    }

    pub(crate) fn key_index(&self, key: &PublicKey) -> Option<usize> {
        self.public_keys.iter().position(|k| k == key)
    }

    pub fn count_signatures(&self) -> usize {
        self.signatures.iter().filter(|s| s.is_some()).count()
    }

    pub fn count_missing_signatures(&self) -> usize {
        self.threshold.saturating_sub(self.count_signatures())
    }

    pub fn public_keys_without_signature(&self) -> Vec<PublicKey> {
        self.public_keys
            .iter()
            .zip(&self.signatures)
            .filter(|(_, sig)| sig.is_none())
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn is_fully_signed(&self) -> bool {
        self.count_signatures() >= self.threshold
    }

    /// Store `signature` in the slot of its key, replacing any earlier one.
    pub(crate) fn set_signature(&mut self, signature: TransactionSignature) -> Result<(), TransactionError> {
        let index = self.key_index(&signature.public_key).ok_or_else(|| {
            TransactionError::InvalidArgument("signature has no matching public key".to_string())
        })?;
        self.signatures[index] = Some(signature);
        Ok(())
    }

    /// Replace every slot, as restored from an object.
    pub(crate) fn set_signatures(
        &mut self,
        signatures: Vec<Option<TransactionSignature>>,
    ) -> Result<(), TransactionError> {
        if signatures.len() != self.public_keys.len() {
            return Err(TransactionError::InvalidArgument(format!(
                "expected {} signature slots, got {}",
                self.public_keys.len(),
                signatures.len()
            )));
        }
        for (key, sig) in self.public_keys.iter().zip(&signatures) {
            if let Some(sig) = sig {
                if &sig.public_key != key {
                    return Err(TransactionError::InvalidArgument(format!(
                        "signature for {} is in the slot of {}",
                        sig.public_key, key
                    )));
                }
            }
        }
        self.signatures = signatures;
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        self.signatures = vec![None; self.public_keys.len()];
    }

    /// Script bytes (DER plus sighash byte) of the held signatures, in key order.
    pub(crate) fn script_signatures(&self) -> Vec<Vec<u8>> {
        self.signatures
            .iter()
            .flatten()
            .map(|sig| sig.to_script_bytes())
            .collect()
    }
}

/// Resolve a bare multisig output into its keys and threshold.
pub(crate) fn bare_state(script: &Script) -> Result<MultisigState, TransactionError> {
    let (threshold, raw_keys) = script.multisig_params().ok_or_else(|| {
        TransactionError::UnsupportedScript("not a bare multisig output".to_string())
    })?;
    let keys = raw_keys
        .iter()
        .map(|raw| PublicKey::from_bytes(raw))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(MultisigState::new(keys, threshold))
}

/// Build the redeem script for `params` and find how `output_script` wraps it.
///
/// # Returns
/// The signature state, the redeem script and the wrapping, or
/// `InvalidArgument` when the keys do not hash to the output.
pub(crate) fn script_hash_condition(
    params: &MultisigParams,
    output_script: &Script,
) -> Result<(MultisigState, Script, ScriptWrapping), TransactionError> {
    let mut keys = params.public_keys.clone();
    if params.sort_keys {
        keys.sort();
    }
    let redeem_script = Script::build_multisig_out(&keys, params.threshold, false)?;
    let witness_out = Script::build_witness_script_hash_out(&redeem_script);

    let wrapping = if &witness_out == output_script {
        ScriptWrapping::Native
    } else if &Script::build_script_hash_out(&witness_out) == output_script {
        ScriptWrapping::Nested
    } else if &Script::build_script_hash_out(&redeem_script) == output_script {
        ScriptWrapping::Legacy
    } else {
        return Err(TransactionError::InvalidArgument(
            "provided public keys don't hash to the provided output".to_string(),
        ));
    };
    Ok((MultisigState::new(keys, params.threshold), redeem_script, wrapping))
}

/// scriptSig and witness stack for a script-hash multisig input.
pub(crate) fn script_hash_unlocking(
    state: &MultisigState,
    redeem_script: &Script,
    wrapping: ScriptWrapping,
) -> (Script, Vec<Vec<u8>>) {
    let signatures = state.script_signatures();
    match wrapping {
        ScriptWrapping::Legacy => (
            Script::build_p2sh_multisig_in(&signatures, redeem_script),
            Vec::new(),
        ),
        ScriptWrapping::Nested | ScriptWrapping::Native => {
            let mut stack = Vec::with_capacity(signatures.len() + 2);
            stack.push(Vec::new());
            stack.extend(signatures);
            stack.push(redeem_script.to_bytes().to_vec());
            let script_sig = if wrapping == ScriptWrapping::Nested {
                nested_script_sig(redeem_script)
            } else {
                Script::new()
            };
            (script_sig, stack)
        }
    }
}

/// A direct push of the 34-byte P2WSH program committing to `redeem_script`.
fn nested_script_sig(redeem_script: &Script) -> Script {
    let program = Script::build_witness_script_hash_out(redeem_script);
    let mut bytes = Vec::with_capacity(program.len() + 1);
    bytes.push(program.len() as u8);
    bytes.extend_from_slice(program.to_bytes());
    Script::from(bytes)
}

pub(crate) fn bare_weight(base: usize, state: &MultisigState) -> usize {
    4 * (base + 1 + state.threshold * BARE_SIGNATURE_SIZE)
}

pub(crate) fn script_hash_weight(base: usize, state: &MultisigState, wrapping: ScriptWrapping) -> usize {
    let witness_size = MAX_OPCODES_SIZE
        + state.threshold * MAX_SIGNATURE_SIZE
        + state.public_keys.len() * MAX_PUBKEY_SIZE;
    match wrapping {
        ScriptWrapping::Legacy => 4 * (base + witness_size),
        ScriptWrapping::Native => 4 * base + witness_size,
        ScriptWrapping::Nested => 4 * (base + NESTED_PROGRAM_SIZE) + witness_size,
    }
}
