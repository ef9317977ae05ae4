//! External UTXO descriptor used to manufacture inputs.

use std::fmt;

use btc_primitives::chainhash::Hash;
use btc_script::{Address, Script};
use serde::{Deserialize, Serialize};

use crate::output::Output;
use crate::TransactionError;

/// An unspent output as reported by a wallet or indexer.
///
/// Accepts `txid`/`vout` as aliases of `txId`/`outputIndex` in its object
/// form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnspentOutput {
    #[serde(alias = "txid")]
    pub tx_id: Hash,
    #[serde(alias = "vout")]
    pub output_index: u32,
    #[serde(alias = "scriptPubKey")]
    pub script: Script,
    pub satoshis: u64,
    /// Sequence number for the input spending this output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<u32>,
}

impl UnspentOutput {
    /// Create a descriptor from a display-order txid.
    ///
    /// # Returns
    /// `InvalidArgument` if the txid is not 64 hex characters.
    pub fn new(
        tx_id: &str,
        output_index: u32,
        script: Script,
        satoshis: u64,
    ) -> Result<Self, TransactionError> {
        let tx_id = Hash::from_hex(tx_id)
            .map_err(|e| TransactionError::InvalidArgument(format!("invalid txid: {}", e)))?;
        Ok(UnspentOutput {
            tx_id,
            output_index,
            script,
            satoshis,
            sequence_number: None,
        })
    }

    /// Create a descriptor for an output paying to `address`.
    pub fn from_address(
        tx_id: &str,
        output_index: u32,
        address: &Address,
        satoshis: u64,
    ) -> Result<Self, TransactionError> {
        Self::new(tx_id, output_index, address.to_script(), satoshis)
    }

    pub fn with_sequence_number(mut self, sequence_number: u32) -> Self {
        self.sequence_number = Some(sequence_number);
        self
    }

    /// The output this descriptor stands for.
    pub fn to_output(&self) -> Output {
        Output::new(self.satoshis, self.script.clone())
    }
}

impl fmt::Display for UnspentOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<UnspentOutput: {}:{}, satoshis: {}, script: {}>",
            self.tx_id, self.output_index, self.satoshis, self.script
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TX_ID: &str = "a477af6b2667c29670467e4e0728b685ee07b240235771862318e29ddbe58458";
    const SCRIPT_HEX: &str = "76a914089acaba6af8b2b4fb4bed3b747ab1e4e60b496588ac";

    #[test]
    fn test_new_and_display() {
        let utxo = UnspentOutput::new(TX_ID, 0, Script::from_hex(SCRIPT_HEX).unwrap(), 1_020_000).unwrap();
        assert_eq!(utxo.tx_id.to_string(), TX_ID);
        assert_eq!(utxo.to_output().satoshis, 1_020_000);
        assert_eq!(
            utxo.to_string(),
            format!("<UnspentOutput: {}:0, satoshis: 1020000, script: {}>", TX_ID, SCRIPT_HEX)
        );
    }

    #[test]
    fn test_rejects_bad_txid() {
        let script = Script::from_hex(SCRIPT_HEX).unwrap();
        assert!(matches!(
            UnspentOutput::new("abcd", 0, script, 1),
            Err(TransactionError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_object_form_accepts_aliases() {
        let json = format!(
            r#"{{"txid":"{}","vout":1,"scriptPubKey":"{}","satoshis":5000}}"#,
            TX_ID, SCRIPT_HEX
        );
        let utxo: UnspentOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(utxo.output_index, 1);
        assert_eq!(utxo.sequence_number, None);

        let canonical = serde_json::to_string(&utxo).unwrap();
        assert_eq!(
            canonical,
            format!(
                r#"{{"txId":"{}","outputIndex":1,"script":"{}","satoshis":5000}}"#,
                TX_ID, SCRIPT_HEX
            )
        );
    }

    #[test]
    fn test_from_address() {
        let address = Address::from_string("mi31YyHhDUjNH1i7XZiNFnjgEoveZzFuvi").unwrap();
        let utxo = UnspentOutput::from_address(TX_ID, 2, &address, 10_000).unwrap();
        assert!(utxo.script.is_public_key_hash_out());
        assert_eq!(utxo.with_sequence_number(7).sequence_number, Some(7));
    }
}
