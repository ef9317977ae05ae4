/// Script type - a sequence of opcodes and data pushes.
///
/// Scripts are used in transaction inputs (unlocking) and outputs (locking)
/// to define spending conditions. The Script wraps a `Vec<u8>` and provides
/// construction, classification of the standard output templates,
/// builders for those templates, serialization and ASM output.

use std::fmt;

use btc_primitives::ec::PublicKey;
use btc_primitives::hash::{hash160, sha256};
use btc_primitives::schnorr;

use crate::chunk::{decode_script, push_data_prefix, read_chunk, ScriptChunk};
use crate::opcodes::*;
use crate::ScriptError;

/// Largest number of keys a standard CHECKMULTISIG template may list.
pub const MAX_MULTISIG_KEYS: usize = 16;

/// A script, represented as a byte vector newtype.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Script(Vec<u8>);

impl Script {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// Create a new empty script.
    pub fn new() -> Self {
        Script(Vec::new())
    }

    /// Create a script from a hex-encoded string.
    ///
    /// # Returns
    /// A `Script` wrapping the decoded bytes, or an error if the hex is invalid.
    pub fn from_hex(hex_str: &str) -> Result<Self, ScriptError> {
        let bytes = hex::decode(hex_str).map_err(|e| ScriptError::InvalidHex(e.to_string()))?;
        Ok(Script(bytes))
    }

    /// Create a script from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Script(bytes.to_vec())
    }

    /// Create a script from an ASM string.
    ///
    /// Known opcode names (e.g. "OP_DUP") are emitted directly and every
    /// other token is treated as hex push data.
    pub fn from_asm(asm: &str) -> Result<Self, ScriptError> {
        let mut script = Script::new();
        for section in asm.split_whitespace() {
            match string_to_opcode(section) {
                Some(opcode) if opcode == OP_0 || opcode > OP_PUSHDATA4 => {
                    script.0.push(opcode);
                }
                _ => script.append_push_data_hex(section)?,
            }
        }
        Ok(script)
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    /// Encode the script as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Convert the script to its ASM representation.
    ///
    /// # Returns
    /// A space-separated ASM string, or an empty string for a malformed script.
    pub fn to_asm(&self) -> String {
        let mut parts = Vec::new();
        let mut pos = 0;
        while pos < self.0.len() {
            match read_chunk(&self.0, &mut pos) {
                Ok(chunk) => parts.push(chunk.to_asm_string()),
                Err(_) => return String::new(),
            }
        }
        parts.join(" ")
    }

    /// Return a reference to the underlying bytes.
    pub fn to_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume the script and return its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Return the length of the script in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the script is empty (zero bytes).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse the script into decoded chunks.
    pub fn chunks(&self) -> Result<Vec<ScriptChunk>, ScriptError> {
        decode_script(&self.0)
    }

    // -----------------------------------------------------------------------
    // Classification
    // -----------------------------------------------------------------------

    /// `OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIG`
    pub fn is_public_key_hash_out(&self) -> bool {
        let b = &self.0;
        b.len() == 25
            && b[0] == OP_DUP
            && b[1] == OP_HASH160
            && b[2] == OP_DATA_20
            && b[23] == OP_EQUALVERIFY
            && b[24] == OP_CHECKSIG
    }

    /// `<pubkey> OP_CHECKSIG` with a 33-byte compressed or 65-byte
    /// uncompressed key.
    pub fn is_public_key_out(&self) -> bool {
        let b = &self.0;
        match b.len() {
            35 => b[0] == OP_DATA_33 && (b[1] == 0x02 || b[1] == 0x03) && b[34] == OP_CHECKSIG,
            67 => b[0] == OP_DATA_65 && b[1] == 0x04 && b[66] == OP_CHECKSIG,
            _ => false,
        }
    }

    /// `OP_HASH160 <20 bytes> OP_EQUAL`
    pub fn is_script_hash_out(&self) -> bool {
        let b = &self.0;
        b.len() == 23 && b[0] == OP_HASH160 && b[1] == OP_DATA_20 && b[22] == OP_EQUAL
    }

    /// `OP_0 <20 bytes>`
    pub fn is_witness_public_key_hash_out(&self) -> bool {
        matches!(self.witness_program(), Some((0, program)) if program.len() == 20)
    }

    /// `OP_0 <32 bytes>`
    pub fn is_witness_script_hash_out(&self) -> bool {
        matches!(self.witness_program(), Some((0, program)) if program.len() == 32)
    }

    /// `OP_1 <32 bytes>`
    pub fn is_taproot_out(&self) -> bool {
        matches!(self.witness_program(), Some((1, program)) if program.len() == 32)
    }

    /// True for any segwit output of version 0 to 16.
    pub fn is_witness_out(&self) -> bool {
        self.witness_program().is_some()
    }

    /// `OP_m <pubkey>... OP_n OP_CHECKMULTISIG` with `1 <= m <= n`.
    pub fn is_multisig_out(&self) -> bool {
        self.multisig_params().is_some()
    }

    /// `OP_RETURN` followed only by pushes.
    pub fn is_data_out(&self) -> bool {
        if self.0.first() != Some(&OP_RETURN) {
            return false;
        }
        match decode_script(&self.0[1..]) {
            Ok(chunks) => chunks.iter().all(|c| c.is_push()),
            Err(_) => false,
        }
    }

    // -----------------------------------------------------------------------
    // Data extraction
    // -----------------------------------------------------------------------

    /// The version and program of a BIP141 witness output.
    ///
    /// A witness output is one small-int version opcode followed by a single
    /// direct push of 2 to 40 bytes, with no other bytes.
    pub fn witness_program(&self) -> Option<(u8, &[u8])> {
        let b = &self.0;
        if b.len() < 4 || b.len() > 42 {
            return None;
        }
        let version = small_int_value(b[0])?;
        let push_len = b[1] as usize;
        if !(2..=40).contains(&push_len) || push_len + 2 != b.len() {
            return None;
        }
        Some((version, &b[2..]))
    }

    /// The 20-byte hash of a P2PKH or P2WPKH output.
    pub fn public_key_hash(&self) -> Result<[u8; 20], ScriptError> {
        if self.0.is_empty() {
            return Err(ScriptError::EmptyScript);
        }
        let hash = if self.is_public_key_hash_out() {
            &self.0[3..23]
        } else if self.is_witness_public_key_hash_out() {
            &self.0[2..22]
        } else {
            return Err(ScriptError::NotPublicKeyHash);
        };
        let mut out = [0u8; 20];
        out.copy_from_slice(hash);
        Ok(out)
    }

    /// The 20-byte script hash of a P2SH output.
    pub fn script_hash(&self) -> Result<[u8; 20], ScriptError> {
        if !self.is_script_hash_out() {
            return Err(ScriptError::NotScriptHash);
        }
        let mut out = [0u8; 20];
        out.copy_from_slice(&self.0[2..22]);
        Ok(out)
    }

    /// The key of a P2PK output.
    pub fn public_key(&self) -> Result<PublicKey, ScriptError> {
        if !self.is_public_key_out() {
            return Err(ScriptError::UnsupportedScript("not a pay-to-public-key output".to_string()));
        }
        Ok(PublicKey::from_bytes(&self.0[1..self.0.len() - 1])?)
    }

    /// The threshold and raw keys of a multisig output.
    pub fn multisig_params(&self) -> Option<(usize, Vec<Vec<u8>>)> {
        let parts = self.chunks().ok()?;
        if parts.len() < 4 || parts[parts.len() - 1].op != OP_CHECKMULTISIG {
            return None;
        }
        let threshold = small_int_value(parts[0].op)? as usize;
        let total = small_int_value(parts[parts.len() - 2].op)? as usize;
        let keys: Vec<Vec<u8>> = parts[1..parts.len() - 2]
            .iter()
            .map(|c| match &c.data {
                Some(d) if d.len() == 33 || d.len() == 65 => Some(d.clone()),
                _ => None,
            })
            .collect::<Option<_>>()?;
        if threshold == 0 || keys.len() != total || threshold > total {
            return None;
        }
        Some((threshold, keys))
    }

    /// True if the script contains OP_CODESEPARATOR outside push data.
    pub fn has_code_separators(&self) -> bool {
        match self.chunks() {
            Ok(chunks) => chunks.iter().any(|c| c.op == OP_CODESEPARATOR),
            Err(_) => false,
        }
    }

    // -----------------------------------------------------------------------
    // Builders
    // -----------------------------------------------------------------------

    /// Build a P2PKH output paying to a public key hash.
    pub fn build_public_key_hash_out(hash: &[u8; 20]) -> Self {
        let mut b = Vec::with_capacity(25);
        b.extend_from_slice(&[OP_DUP, OP_HASH160, OP_DATA_20]);
        b.extend_from_slice(hash);
        b.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
        Script(b)
    }

    /// Build a P2PK output, using the key's own encoding.
    pub fn build_public_key_out(key: &PublicKey) -> Self {
        let mut script = Script::new();
        script.push_bytes(&key.to_bytes());
        script.0.push(OP_CHECKSIG);
        script
    }

    /// Build a P2SH output committing to `redeem_script`.
    pub fn build_script_hash_out(redeem_script: &Script) -> Self {
        Self::build_script_hash_out_from_hash(&hash160(&redeem_script.0))
    }

    /// Build a P2SH output from a precomputed script hash.
    pub fn build_script_hash_out_from_hash(hash: &[u8; 20]) -> Self {
        let mut b = Vec::with_capacity(23);
        b.extend_from_slice(&[OP_HASH160, OP_DATA_20]);
        b.extend_from_slice(hash);
        b.push(OP_EQUAL);
        Script(b)
    }

    /// Build a native segwit output of the given version.
    ///
    /// # Returns
    /// The script, or `InvalidScript` for a version above 16 or a program
    /// outside 2..=40 bytes.
    pub fn build_witness_out(version: u8, program: &[u8]) -> Result<Self, ScriptError> {
        let op = small_int_op(version)
            .ok_or_else(|| ScriptError::InvalidScript(format!("bad witness version {}", version)))?;
        if !(2..=40).contains(&program.len()) {
            return Err(ScriptError::InvalidScript(format!(
                "bad witness program length {}",
                program.len()
            )));
        }
        let mut b = Vec::with_capacity(program.len() + 2);
        b.push(op);
        b.push(program.len() as u8);
        b.extend_from_slice(program);
        Ok(Script(b))
    }

    /// Build a P2WPKH output from a key hash.
    pub fn build_witness_public_key_hash_out(hash: &[u8; 20]) -> Self {
        let mut b = Vec::with_capacity(22);
        b.extend_from_slice(&[OP_0, OP_DATA_20]);
        b.extend_from_slice(hash);
        Script(b)
    }

    /// Build a P2WSH output committing to `witness_script`.
    pub fn build_witness_script_hash_out(witness_script: &Script) -> Self {
        let mut b = Vec::with_capacity(34);
        b.extend_from_slice(&[OP_0, OP_DATA_32]);
        b.extend_from_slice(&sha256(&witness_script.0));
        Script(b)
    }

    /// Build a P2TR output for a key-path-only internal key.
    ///
    /// The output key is the BIP341 tweak of `internal_key` with no script tree.
    pub fn build_taproot_out(internal_key: &PublicKey) -> Result<Self, ScriptError> {
        let output_key = schnorr::tweak_public_key(internal_key, None)?;
        Ok(Self::build_taproot_out_from_output_key(&output_key))
    }

    /// Build a P2TR output from an already tweaked x-only key.
    pub fn build_taproot_out_from_output_key(output_key: &[u8; 32]) -> Self {
        let mut b = Vec::with_capacity(34);
        b.extend_from_slice(&[OP_1, OP_DATA_32]);
        b.extend_from_slice(output_key);
        Script(b)
    }

    /// Build an m-of-n CHECKMULTISIG script.
    ///
    /// With `sort` set the keys are ordered by their serialized bytes.
    pub fn build_multisig_out(
        keys: &[PublicKey],
        threshold: usize,
        sort: bool,
    ) -> Result<Self, ScriptError> {
        if keys.is_empty() || keys.len() > MAX_MULTISIG_KEYS {
            return Err(ScriptError::InvalidScript(format!(
                "multisig needs 1 to {} keys, got {}",
                MAX_MULTISIG_KEYS,
                keys.len()
            )));
        }
        if threshold == 0 || threshold > keys.len() {
            return Err(ScriptError::InvalidScript(format!(
                "threshold {} out of range for {} keys",
                threshold,
                keys.len()
            )));
        }
        let mut keys = keys.to_vec();
        if sort {
            keys.sort();
        }
        let mut script = Script::new();
        script.push_small_int(threshold as u8);
        for key in &keys {
            script.push_bytes(&key.to_bytes());
        }
        script.push_small_int(keys.len() as u8);
        script.0.push(OP_CHECKMULTISIG);
        Ok(script)
    }

    /// Build an `OP_RETURN <data>` output. Empty data yields a bare OP_RETURN.
    pub fn build_data_out(data: &[u8]) -> Result<Self, ScriptError> {
        let mut script = Script(vec![OP_RETURN]);
        if !data.is_empty() {
            script.append_push_data(data)?;
        }
        Ok(script)
    }

    /// Build a P2PKH unlocking script `<sig> <pubkey>`.
    pub fn build_public_key_hash_in(signature: &[u8], key: &PublicKey) -> Self {
        let mut script = Script::new();
        script.push_bytes(signature);
        script.push_bytes(&key.to_bytes());
        script
    }

    /// Build a P2PK unlocking script `<sig>`.
    pub fn build_public_key_in(signature: &[u8]) -> Self {
        let mut script = Script::new();
        script.push_bytes(signature);
        script
    }

    /// Build a bare multisig unlocking script `OP_0 <sig>...`.
    pub fn build_multisig_in(signatures: &[Vec<u8>]) -> Self {
        let mut script = Script(vec![OP_0]);
        for sig in signatures {
            script.push_bytes(sig);
        }
        script
    }

    /// Build a P2SH multisig unlocking script `OP_0 <sig>... <redeem script>`.
    pub fn build_p2sh_multisig_in(signatures: &[Vec<u8>], redeem_script: &Script) -> Self {
        let mut script = Self::build_multisig_in(signatures);
        script.push_bytes(&redeem_script.0);
        script
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Append data with the minimal PUSHDATA prefix.
    pub fn append_push_data(&mut self, data: &[u8]) -> Result<(), ScriptError> {
        let prefix = push_data_prefix(data.len())?;
        self.0.extend_from_slice(&prefix);
        self.0.extend_from_slice(data);
        Ok(())
    }

    /// Append hex-encoded data with the minimal PUSHDATA prefix.
    pub fn append_push_data_hex(&mut self, hex_str: &str) -> Result<(), ScriptError> {
        let data = hex::decode(hex_str).map_err(|_| ScriptError::InvalidOpcodeData)?;
        self.append_push_data(&data)
    }

    /// Append raw opcodes.
    ///
    /// Push opcodes (OP_DATA_1..OP_PUSHDATA4) are rejected; use
    /// `append_push_data` for those.
    pub fn append_opcodes(&mut self, opcodes: &[u8]) -> Result<(), ScriptError> {
        if let Some(op) = opcodes.iter().find(|op| (OP_DATA_1..=OP_PUSHDATA4).contains(*op)) {
            return Err(ScriptError::InvalidOpcodeType(opcode_to_string(*op)));
        }
        self.0.extend_from_slice(opcodes);
        Ok(())
    }

    /// Byte equality with another script.
    pub fn equals(&self, other: &Script) -> bool {
        self.0 == other.0
    }

    // Keys, signatures and redeem scripts are bounded by the block size, so
    // every push has a PUSHDATA prefix.
    fn push_bytes(&mut self, data: &[u8]) {
        if let Ok(prefix) = push_data_prefix(data.len()) {
            self.0.extend_from_slice(&prefix);
            self.0.extend_from_slice(data);
        }
    }

    fn push_small_int(&mut self, n: u8) {
        if let Some(op) = small_int_op(n) {
            self.0.push(op);
        }
    }
}

impl Default for Script {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<u8>> for Script {
    fn from(bytes: Vec<u8>) -> Self {
        Script(bytes)
    }
}

impl AsRef<[u8]> for Script {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Script {
    /// Display the script as a lowercase hex string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script({})", self.to_hex())
    }
}

impl serde::Serialize for Script {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Script {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Script::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
