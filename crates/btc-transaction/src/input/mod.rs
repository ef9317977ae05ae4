//! Transaction inputs and the spending conditions they know how to sign.
//!
//! An [`Input`] always carries its outpoint, sequence number, scriptSig and
//! witness stack. Its [`InputKind`] names the spending condition of the
//! output it spends, which decides how the input is sized, which sighash
//! algorithm it signs with and how signatures turn into unlocking data.
//!
//! Inputs read from wire bytes start out as [`InputKind::Generic`]: without
//! the spent output they can be serialized but not signed or verified.
//! [`Input::classify`] resolves them once the output is known.

mod multisig;
mod public_key;
mod public_key_hash;
mod taproot;

pub use multisig::{MultisigParams, MultisigState};

use btc_primitives::chainhash::Hash;
use btc_primitives::ec::{PrivateKey, PublicKey};
use btc_primitives::util::{VarInt, WireReader, WireWriter};
use btc_script::Script;
use log::{debug, warn};

use crate::lock_time::{
    RelativeLockTime, DEFAULT_SEQNUMBER, SEQUENCE_BLOCKDIFF_LIMIT, SEQUENCE_LOCKTIME_GRANULARITY,
    SEQUENCE_LOCKTIME_MASK, SEQUENCE_LOCKTIME_TYPE_FLAG,
};
use crate::output::Output;
use crate::sighash::{legacy, witness, SIGHASH_ALL, SIGHASH_DEFAULT};
use crate::signature::{SignatureData, SigningMethod, TransactionSignature};
use crate::transaction::Transaction;
use crate::unspent_output::UnspentOutput;
use crate::TransactionError;

/// Outpoint (36), script length byte (1) and sequence (4).
const BASE_INPUT_SIZE: usize = 41;

/// How a key-hash or script-hash condition sits inside the spent output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptWrapping {
    /// Plain P2PKH or P2SH, signed with the legacy digest.
    Legacy,
    /// A witness v0 program inside P2SH.
    Nested,
    /// A native witness v0 output.
    Native,
}

impl ScriptWrapping {
    pub fn is_witness(&self) -> bool {
        !matches!(self, ScriptWrapping::Legacy)
    }
}

/// The spending condition an input satisfies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputKind {
    /// Not yet classified; signing operations fail.
    Generic,
    PublicKeyHash(ScriptWrapping),
    PublicKey,
    MultisigBare(MultisigState),
    MultisigScriptHash {
        state: MultisigState,
        redeem_script: Script,
        wrapping: ScriptWrapping,
    },
    TaprootKeyPath,
}

/// A transaction input.
///
/// # Wire format
///
/// | Field           | Size             |
/// |-----------------|------------------|
/// | prev_tx_id      | 32 bytes (wire order) |
/// | output_index    | 4 bytes (LE)     |
/// | script length   | VarInt           |
/// | script          | variable         |
/// | sequence_number | 4 bytes (LE)     |
///
/// The witness stack is written separately, after all outputs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Input {
    pub prev_tx_id: Hash,
    pub output_index: u32,
    pub sequence_number: u32,
    script: Script,
    witnesses: Vec<Vec<u8>>,
    output: Option<Output>,
    kind: InputKind,
}

impl Input {
    /// An unclassified input with the final sequence number.
    pub fn new(prev_tx_id: Hash, output_index: u32, script: Script) -> Self {
        Input {
            prev_tx_id,
            output_index,
            sequence_number: DEFAULT_SEQNUMBER,
            script,
            witnesses: Vec::new(),
            output: None,
            kind: InputKind::Generic,
        }
    }

    /// Build a classified input spending `utxo`.
    ///
    /// # Arguments
    /// * `utxo`     - The output being spent.
    /// * `multisig` - Keys and threshold when the output is a multisig condition.
    ///
    /// # Returns
    /// The input, `UnsupportedScript` if the script matches no known
    /// condition, or `InvalidArgument` if the multisig keys do not hash to it.
    pub fn from_unspent(
        utxo: &UnspentOutput,
        multisig: Option<&MultisigParams>,
    ) -> Result<Self, TransactionError> {
        let mut input = Input::new(utxo.tx_id, utxo.output_index, Script::new())
            .with_output(utxo.to_output());
        if let Some(sequence) = utxo.sequence_number {
            input.sequence_number = sequence;
        }
        input.classify(multisig)?;
        Ok(input)
    }

    /// Attach the output this input spends. The kind is left unchanged.
    pub fn with_output(mut self, output: Output) -> Self {
        self.output = Some(output);
        self
    }

    /// Resolve the spending condition from the attached output.
    ///
    /// Multisig inputs get unlocking data rebuilt from their (empty)
    /// signature slots; other kinds keep their current script and witness.
    ///
    /// # Returns
    /// `NeedMoreInfo` without an attached output, `UnsupportedScript` for
    /// an unknown script, `InvalidArgument` for multisig keys that do not
    /// match the output.
    pub fn classify(&mut self, multisig: Option<&MultisigParams>) -> Result<(), TransactionError> {
        let script = &self
            .output
            .as_ref()
            .ok_or_else(|| {
                TransactionError::NeedMoreInfo(format!(
                    "input {}:{} has no previous output to classify against",
                    self.prev_tx_id, self.output_index
                ))
            })?
            .script;

        let kind = if let Some(params) = multisig {
            if script.is_multisig_out() {
                InputKind::MultisigBare(multisig::bare_state(script)?)
            } else {
                let (state, redeem_script, wrapping) =
                    multisig::script_hash_condition(params, script)?;
                InputKind::MultisigScriptHash {
                    state,
                    redeem_script,
                    wrapping,
                }
            }
        } else if let Some(wrapping) = public_key_hash::wrapping_of(script) {
            InputKind::PublicKeyHash(wrapping)
        } else if script.is_public_key_out() {
            InputKind::PublicKey
        } else if script.is_taproot_out() {
            InputKind::TaprootKeyPath
        } else if script.is_multisig_out() {
            InputKind::MultisigBare(multisig::bare_state(script)?)
        } else {
            return Err(TransactionError::UnsupportedScript(format!(
                "no spending condition matches output script {}",
                script
            )));
        };

        self.kind = kind;
        self.rebuild_unlocking();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Wire format
    // -----------------------------------------------------------------------

    /// Deserialize an unclassified input from a `WireReader`.
    pub fn read_from(reader: &mut WireReader) -> Result<Self, TransactionError> {
        let txid = reader.read_bytes(32).map_err(|e| {
            TransactionError::SerializationError(format!("reading previous txid: {}", e))
        })?;
        let prev_tx_id = Hash::from_slice(txid)?;
        let output_index = reader.read_u32_le().map_err(|e| {
            TransactionError::SerializationError(format!("reading output index: {}", e))
        })?;
        let script = reader.read_var_bytes().map_err(|e| {
            TransactionError::SerializationError(format!("reading unlocking script: {}", e))
        })?;
        let sequence_number = reader.read_u32_le().map_err(|e| {
            TransactionError::SerializationError(format!("reading sequence number: {}", e))
        })?;

        let mut input = Input::new(prev_tx_id, output_index, Script::from(script));
        input.sequence_number = sequence_number;
        Ok(input)
    }

    pub fn write_to(&self, writer: &mut WireWriter) {
        writer.write_bytes(self.prev_tx_id.as_bytes());
        writer.write_u32_le(self.output_index);
        writer.write_var_bytes(self.script.to_bytes());
        writer.write_u32_le(self.sequence_number);
    }

    /// Read this input's witness stack.
    pub(crate) fn read_witnesses(&mut self, reader: &mut WireReader) -> Result<(), TransactionError> {
        let count = reader.read_varint().map_err(|e| {
            TransactionError::SerializationError(format!("reading witness count: {}", e))
        })?;
        let mut stack = Vec::new();
        for _ in 0..count.value() {
            let item = reader.read_var_bytes().map_err(|e| {
                TransactionError::SerializationError(format!("reading witness item: {}", e))
            })?;
            stack.push(item);
        }
        self.witnesses = stack;
        Ok(())
    }

    pub(crate) fn write_witnesses(&self, writer: &mut WireWriter) {
        writer.write_varint(VarInt::from(self.witnesses.len()));
        for item in &self.witnesses {
            writer.write_var_bytes(item);
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub fn set_script(&mut self, script: Script) {
        self.script = script;
    }

    pub fn witnesses(&self) -> &[Vec<u8>] {
        &self.witnesses
    }

    pub fn set_witnesses(&mut self, witnesses: Vec<Vec<u8>>) {
        self.witnesses = witnesses;
    }

    pub fn has_witnesses(&self) -> bool {
        !self.witnesses.is_empty()
    }

    /// The output this input spends, if known.
    pub fn output(&self) -> Option<&Output> {
        self.output.as_ref()
    }

    pub fn kind(&self) -> &InputKind {
        &self.kind
    }

    /// Signature state of a multisig input.
    pub fn multisig_state(&self) -> Option<&MultisigState> {
        match &self.kind {
            InputKind::MultisigBare(state) | InputKind::MultisigScriptHash { state, .. } => {
                Some(state)
            }
            _ => None,
        }
    }

    pub(crate) fn multisig_state_mut(&mut self) -> Option<&mut MultisigState> {
        match &mut self.kind {
            InputKind::MultisigBare(state) | InputKind::MultisigScriptHash { state, .. } => {
                Some(state)
            }
            _ => None,
        }
    }

    /// All-zero txid with index 0xffffffff: the input of a coinbase.
    pub fn is_null(&self) -> bool {
        self.prev_tx_id.is_zero() && self.output_index == 0xffff_ffff
    }

    /// True when the sequence number is final.
    pub fn is_final(&self) -> bool {
        self.sequence_number == DEFAULT_SEQNUMBER
    }

    /// True when this input's kind puts its signature data in the witness.
    pub fn uses_witness(&self) -> bool {
        match &self.kind {
            InputKind::Generic => self.has_witnesses(),
            InputKind::PublicKeyHash(wrapping) => wrapping.is_witness(),
            InputKind::MultisigScriptHash { wrapping, .. } => wrapping.is_witness(),
            InputKind::TaprootKeyPath => true,
            InputKind::PublicKey | InputKind::MultisigBare(_) => false,
        }
    }

    // -----------------------------------------------------------------------
    // Relative lock time (BIP68)
    // -----------------------------------------------------------------------

    /// Lock this input for `seconds` after the spent output confirms,
    /// rounded down to 512-second units.
    ///
    /// # Returns
    /// `LockTimeRange` if the lock does not fit in 16 bits of 512-second units.
    pub fn lock_for_seconds(&mut self, seconds: u32) -> Result<(), TransactionError> {
        if seconds >= SEQUENCE_LOCKTIME_GRANULARITY * SEQUENCE_LOCKTIME_MASK {
            return Err(TransactionError::LockTimeRange(seconds as u64));
        }
        self.sequence_number = (seconds / SEQUENCE_LOCKTIME_GRANULARITY) | SEQUENCE_LOCKTIME_TYPE_FLAG;
        Ok(())
    }

    /// Lock this input for `height_diff` blocks after the spent output confirms.
    pub fn lock_until_block_height(&mut self, height_diff: u32) -> Result<(), TransactionError> {
        if height_diff >= SEQUENCE_BLOCKDIFF_LIMIT {
            return Err(TransactionError::BlockHeightOutOfRange(height_diff as u64));
        }
        self.sequence_number = height_diff;
        Ok(())
    }

    pub fn get_lock_time(&self) -> Option<RelativeLockTime> {
        RelativeLockTime::from_sequence(self.sequence_number)
    }

    // -----------------------------------------------------------------------
    // Size estimation
    // -----------------------------------------------------------------------

    /// Expected weight in units once fully signed.
    pub fn estimate_weight(&self) -> usize {
        match &self.kind {
            InputKind::Generic => {
                let mut writer = WireWriter::new();
                self.write_to(&mut writer);
                let mut weight = 4 * writer.len();
                if self.has_witnesses() {
                    let mut witness = WireWriter::new();
                    self.write_witnesses(&mut witness);
                    weight += witness.len();
                }
                weight
            }
            InputKind::PublicKeyHash(wrapping) => public_key_hash::weight(BASE_INPUT_SIZE, *wrapping),
            InputKind::PublicKey => public_key::weight(BASE_INPUT_SIZE),
            InputKind::MultisigBare(state) => multisig::bare_weight(BASE_INPUT_SIZE, state),
            InputKind::MultisigScriptHash { state, wrapping, .. } => {
                multisig::script_hash_weight(BASE_INPUT_SIZE, state, *wrapping)
            }
            InputKind::TaprootKeyPath => taproot::weight(BASE_INPUT_SIZE),
        }
    }

    /// Expected virtual size in bytes once fully signed.
    pub fn estimate_size(&self) -> usize {
        self.estimate_weight().div_ceil(4)
    }

    // -----------------------------------------------------------------------
    // Signing
    // -----------------------------------------------------------------------

    /// Sign this input with `key` if the key belongs to its spending condition.
    ///
    /// # Arguments
    /// * `tx`           - The transaction holding this input.
    /// * `key`          - The signing key.
    /// * `input_index`  - Position of this input in `tx`.
    /// * `sighash_type` - The flag; `None` means SIGHASH_ALL, or
    ///   SIGHASH_DEFAULT for taproot.
    /// * `method`       - Schnorr is only accepted for taproot inputs, which
    ///   always sign with Schnorr.
    ///
    /// # Returns
    /// Zero or one signature. `AbstractMethodInvoked` for a generic input.
    pub fn get_signatures(
        &self,
        tx: &Transaction,
        key: &PrivateKey,
        input_index: usize,
        sighash_type: Option<u32>,
        method: SigningMethod,
    ) -> Result<Vec<TransactionSignature>, TransactionError> {
        if matches!(self.kind, InputKind::Generic) {
            return Err(TransactionError::AbstractMethodInvoked(format!(
                "cannot sign unclassified input {}",
                input_index
            )));
        }
        let public_key = key.pub_key();
        if !self.owns_key(&public_key, input_index)? {
            return Ok(Vec::new());
        }

        let signature = if matches!(self.kind, InputKind::TaprootKeyPath) {
            let sighash_type = sighash_type.unwrap_or(SIGHASH_DEFAULT);
            let sig = taproot::sign(tx, key, input_index, sighash_type)?;
            TransactionSignature {
                public_key,
                prev_tx_id: self.prev_tx_id,
                output_index: self.output_index,
                input_index,
                signature: SignatureData::Schnorr(sig),
                sighash_type,
            }
        } else {
            if method == SigningMethod::Schnorr {
                return Err(TransactionError::InvalidArgument(format!(
                    "input {} cannot be signed with schnorr",
                    input_index
                )));
            }
            let sighash_type = sighash_type.unwrap_or(SIGHASH_ALL);
            let digest = self.signature_hash(tx, input_index, sighash_type, &public_key)?;
            TransactionSignature {
                signature: SignatureData::Ecdsa(key.sign(&digest)?),
                public_key,
                prev_tx_id: self.prev_tx_id,
                output_index: self.output_index,
                input_index,
                sighash_type,
            }
        };
        Ok(vec![signature])
    }

    /// Validate `signature` and record it in the unlocking data.
    ///
    /// Only usable when this input is not owned by `tx`; inside a
    /// transaction use [`Transaction::apply_signature`].
    pub fn add_signature(
        &mut self,
        tx: &Transaction,
        signature: TransactionSignature,
    ) -> Result<(), TransactionError> {
        self.check_can_add(tx, &signature)?;
        self.insert_signature(signature)
    }

    /// The admission checks of [`add_signature`](Self::add_signature).
    ///
    /// # Returns
    /// `InvalidArgument` when already fully signed or when the key is not
    /// part of the condition, `InvalidSignature` when verification fails.
    pub(crate) fn check_can_add(
        &self,
        tx: &Transaction,
        signature: &TransactionSignature,
    ) -> Result<(), TransactionError> {
        if self.is_fully_signed()? {
            return Err(TransactionError::InvalidArgument(format!(
                "all needed signatures have already been added to input {}",
                signature.input_index
            )));
        }
        if !self.owns_key(&signature.public_key, signature.input_index)? {
            return Err(TransactionError::InvalidArgument(format!(
                "signature key {} does not match input {}",
                signature.public_key, signature.input_index
            )));
        }
        if !self.is_valid_signature(tx, signature)? {
            warn!(
                "rejected invalid signature from {} for input {}",
                signature.public_key, signature.input_index
            );
            return Err(TransactionError::InvalidSignature(format!(
                "signature from {} does not verify for input {}",
                signature.public_key, signature.input_index
            )));
        }
        Ok(())
    }

    /// Record an already validated signature and rebuild the unlocking data.
    pub(crate) fn insert_signature(
        &mut self,
        signature: TransactionSignature,
    ) -> Result<(), TransactionError> {
        debug!(
            "adding signature from {} to input {}",
            signature.public_key, signature.input_index
        );
        match &mut self.kind {
            InputKind::Generic => Err(TransactionError::AbstractMethodInvoked(
                "cannot add a signature to an unclassified input".to_string(),
            )),
            InputKind::PublicKeyHash(wrapping) => {
                let (script, witnesses) = public_key_hash::unlocking(
                    &signature.to_script_bytes(),
                    &signature.public_key,
                    *wrapping,
                )?;
                self.script = script;
                self.witnesses = witnesses;
                Ok(())
            }
            InputKind::PublicKey => {
                self.script = Script::build_public_key_in(&signature.to_script_bytes());
                Ok(())
            }
            InputKind::MultisigBare(state) | InputKind::MultisigScriptHash { state, .. } => {
                state.set_signature(signature)?;
                self.rebuild_unlocking();
                Ok(())
            }
            InputKind::TaprootKeyPath => {
                self.script = Script::new();
                self.witnesses = vec![signature.to_script_bytes()];
                Ok(())
            }
        }
    }

    /// Rebuild the scriptSig and witness of a multisig input from its slots.
    /// Other kinds are left untouched.
    pub(crate) fn rebuild_unlocking(&mut self) {
        match &self.kind {
            InputKind::MultisigBare(state) => {
                self.script = Script::build_multisig_in(&state.script_signatures());
                self.witnesses.clear();
            }
            InputKind::MultisigScriptHash {
                state,
                redeem_script,
                wrapping,
            } => {
                let (script, witnesses) =
                    multisig::script_hash_unlocking(state, redeem_script, *wrapping);
                self.script = script;
                self.witnesses = witnesses;
            }
            _ => {}
        }
    }

    /// Whether enough signatures are present to spend.
    ///
    /// # Returns
    /// `AbstractMethodInvoked` for a generic input.
    pub fn is_fully_signed(&self) -> Result<bool, TransactionError> {
        match &self.kind {
            InputKind::Generic => Err(TransactionError::AbstractMethodInvoked(
                "cannot tell whether an unclassified input is signed".to_string(),
            )),
            InputKind::PublicKeyHash(wrapping) => Ok(public_key_hash::is_fully_signed(
                &self.script,
                &self.witnesses,
                *wrapping,
            )),
            InputKind::PublicKey => Ok(public_key::is_fully_signed(&self.script)),
            InputKind::MultisigBare(state) | InputKind::MultisigScriptHash { state, .. } => {
                Ok(state.is_fully_signed())
            }
            InputKind::TaprootKeyPath => Ok(!self.witnesses.is_empty()),
        }
    }

    /// Drop all signatures, returning to the unsigned unlocking data.
    ///
    /// A generic input is left untouched.
    pub fn clear_signatures(&mut self) {
        match &mut self.kind {
            InputKind::Generic => {}
            InputKind::PublicKeyHash(_) | InputKind::PublicKey | InputKind::TaprootKeyPath => {
                self.script = Script::new();
                self.witnesses.clear();
            }
            InputKind::MultisigBare(state) | InputKind::MultisigScriptHash { state, .. } => {
                state.clear();
                self.rebuild_unlocking();
            }
        }
    }

    /// Recompute the digest `signature` claims to sign and verify it.
    ///
    /// # Returns
    /// `Ok(false)` for a bad signature or a scheme mismatch,
    /// `AbstractMethodInvoked` for a generic input.
    pub fn is_valid_signature(
        &self,
        tx: &Transaction,
        signature: &TransactionSignature,
    ) -> Result<bool, TransactionError> {
        let index = signature.input_index;
        match (&self.kind, &signature.signature) {
            (InputKind::Generic, _) => Err(TransactionError::AbstractMethodInvoked(format!(
                "cannot verify a signature for unclassified input {}",
                index
            ))),
            (InputKind::TaprootKeyPath, SignatureData::Schnorr(sig)) => {
                let output = self.spent_output(index)?;
                if !output.script.is_taproot_out() {
                    return Ok(false);
                }
                taproot::verify(tx, &output.script, index, signature.sighash_type, sig)
            }
            (InputKind::TaprootKeyPath, SignatureData::Ecdsa(_)) => Ok(false),
            (_, SignatureData::Schnorr(_)) => Ok(false),
            (_, SignatureData::Ecdsa(sig)) => {
                let digest =
                    self.signature_hash(tx, index, signature.sighash_type, &signature.public_key)?;
                Ok(signature.public_key.verify(&digest, sig))
            }
        }
    }

    /// The ECDSA digest this input signs for `public_key`.
    fn signature_hash(
        &self,
        tx: &Transaction,
        input_index: usize,
        sighash_type: u32,
        public_key: &PublicKey,
    ) -> Result<[u8; 32], TransactionError> {
        let output = self.spent_output(input_index)?;
        match &self.kind {
            InputKind::PublicKeyHash(ScriptWrapping::Legacy)
            | InputKind::PublicKey
            | InputKind::MultisigBare(_) => {
                legacy::signature_hash(tx, input_index, &output.script, sighash_type)
            }
            InputKind::PublicKeyHash(_) => witness::signature_hash(
                tx,
                input_index,
                public_key_hash::script_code(public_key).to_bytes(),
                output.satoshis,
                sighash_type,
            ),
            InputKind::MultisigScriptHash {
                redeem_script,
                wrapping: ScriptWrapping::Legacy,
                ..
            } => legacy::signature_hash(tx, input_index, redeem_script, sighash_type),
            InputKind::MultisigScriptHash { redeem_script, .. } => {
                if redeem_script.has_code_separators() {
                    return Err(TransactionError::UnsupportedScript(
                        "witness redeem scripts with OP_CODESEPARATOR are not supported".to_string(),
                    ));
                }
                witness::signature_hash(
                    tx,
                    input_index,
                    redeem_script.to_bytes(),
                    output.satoshis,
                    sighash_type,
                )
            }
            InputKind::TaprootKeyPath | InputKind::Generic => Err(
                TransactionError::AbstractMethodInvoked(format!(
                    "no ECDSA digest for input {}",
                    input_index
                )),
            ),
        }
    }

    /// True if `key` takes part in this input's spending condition.
    fn owns_key(&self, key: &PublicKey, input_index: usize) -> Result<bool, TransactionError> {
        let script = &self.spent_output(input_index)?.script;
        Ok(match &self.kind {
            InputKind::Generic => false,
            InputKind::PublicKeyHash(wrapping) => {
                &public_key_hash::locking_script(key, *wrapping) == script
            }
            InputKind::PublicKey => public_key::pays_to(script, key),
            InputKind::MultisigBare(state) | InputKind::MultisigScriptHash { state, .. } => {
                state.key_index(key).is_some()
            }
            InputKind::TaprootKeyPath => taproot::pays_to(script, key),
        })
    }

    fn spent_output(&self, index: usize) -> Result<&Output, TransactionError> {
        self.output
            .as_ref()
            .ok_or(TransactionError::MissingPreviousOutput { index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock_time::DEFAULT_RBF_SEQNUMBER;

    const TXID: &str = "a477af6b2667c29670467e4e0728b685ee07b240235771862318e29ddbe58458";

    fn p2pkh_utxo() -> UnspentOutput {
        UnspentOutput::new(
            TXID,
            0,
            Script::from_hex("76a914ef6aa14d8f5ba65a12c327a9659681c44cd821b088ac").unwrap(),
            100_000,
        )
        .unwrap()
    }

    #[test]
    fn test_wire_roundtrip_keeps_txid_order() {
        let mut input = Input::new(Hash::from_hex(TXID).unwrap(), 7, Script::from_hex("51").unwrap());
        input.sequence_number = DEFAULT_RBF_SEQNUMBER;
        let mut writer = WireWriter::new();
        input.write_to(&mut writer);
        let bytes = writer.into_bytes();
        // wire order is the reverse of display order
        assert_eq!(hex::encode(&bytes[..4]), "5884e5db");
        assert_eq!(bytes.len(), 32 + 4 + 2 + 4);

        let mut reader = WireReader::new(&bytes);
        let back = Input::read_from(&mut reader).unwrap();
        assert_eq!(back, input);
        assert_eq!(back.kind(), &InputKind::Generic);
    }

    #[test]
    fn test_from_unspent_classifies() {
        let input = Input::from_unspent(&p2pkh_utxo(), None).unwrap();
        assert_eq!(input.kind(), &InputKind::PublicKeyHash(ScriptWrapping::Legacy));
        assert_eq!(input.sequence_number, DEFAULT_SEQNUMBER);
        assert_eq!(input.estimate_weight(), 592);
        assert_eq!(input.estimate_size(), 148);
        assert!(!input.uses_witness());
    }

    #[test]
    fn test_from_unspent_keeps_sequence() {
        let utxo = p2pkh_utxo().with_sequence_number(5);
        assert_eq!(Input::from_unspent(&utxo, None).unwrap().sequence_number, 5);
    }

    #[test]
    fn test_unsupported_script() {
        let utxo = UnspentOutput::new(TXID, 0, Script::from_hex("6a0131").unwrap(), 0).unwrap();
        assert!(matches!(
            Input::from_unspent(&utxo, None),
            Err(TransactionError::UnsupportedScript(_))
        ));
    }

    #[test]
    fn test_classify_needs_output() {
        let mut input = Input::new(Hash::from_hex(TXID).unwrap(), 0, Script::new());
        assert!(matches!(input.classify(None), Err(TransactionError::NeedMoreInfo(_))));
    }

    #[test]
    fn test_generic_input_cannot_sign() {
        let input = Input::new(Hash::from_hex(TXID).unwrap(), 0, Script::new());
        assert!(matches!(
            input.is_fully_signed(),
            Err(TransactionError::AbstractMethodInvoked(_))
        ));
        let tx = Transaction::new();
        let key = PrivateKey::new();
        assert!(matches!(
            input.get_signatures(&tx, &key, 0, None, SigningMethod::Ecdsa),
            Err(TransactionError::AbstractMethodInvoked(_))
        ));
    }

    #[test]
    fn test_null_input() {
        let input = Input::new(Hash::default(), 0xffff_ffff, Script::from_hex("0101").unwrap());
        assert!(input.is_null());
        assert!(input.is_final());
    }

    #[test]
    fn test_relative_lock_time() {
        let mut input = Input::from_unspent(&p2pkh_utxo(), None).unwrap();
        input.lock_for_seconds(1024).unwrap();
        assert_eq!(input.sequence_number, SEQUENCE_LOCKTIME_TYPE_FLAG | 2);
        assert_eq!(input.get_lock_time(), Some(RelativeLockTime::Seconds(1024)));
        assert!(matches!(
            input.lock_for_seconds(512 * 0xffff),
            Err(TransactionError::LockTimeRange(_))
        ));

        input.lock_until_block_height(144).unwrap();
        assert_eq!(input.get_lock_time(), Some(RelativeLockTime::Blocks(144)));
        assert!(matches!(
            input.lock_until_block_height(0xffff),
            Err(TransactionError::BlockHeightOutOfRange(_))
        ));
    }
}
