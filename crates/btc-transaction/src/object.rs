//! The plain object form of a transaction.
//!
//! Unlike the wire encoding, the object form keeps everything needed to
//! continue building: the spent outputs, multisig signature slots, the
//! change script and index, and an explicit fee.

use btc_primitives::chainhash::Hash;
use btc_primitives::ec::PublicKey;
use btc_script::Script;
use serde::{Deserialize, Serialize};

use crate::input::{Input, MultisigParams};
use crate::output::Output;
use crate::signature::TransactionSignature;
use crate::transaction::Transaction;
use crate::TransactionError;

/// Object form of a [`Transaction`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionObject {
    /// Checked against the rebuilt transaction when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<Hash>,
    pub version: u32,
    #[serde(default)]
    pub inputs: Vec<InputObject>,
    #[serde(default)]
    pub outputs: Vec<Output>,
    #[serde(rename = "nLockTime", default)]
    pub lock_time: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_script: Option<Script>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<u64>,
}

/// Object form of an [`Input`].
///
/// `publicKeys`, `threshold` and `signatures` are only present for
/// multisig inputs; `signatures` holds one slot per key in script order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputObject {
    pub prev_tx_id: Hash,
    pub output_index: u32,
    pub sequence_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<Script>,
    /// Witness stack items in hex.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub witnesses: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Output>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_keys: Option<Vec<PublicKey>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signatures: Option<Vec<Option<TransactionSignature>>>,
}

impl From<&Input> for InputObject {
    fn from(input: &Input) -> Self {
        let state = input.multisig_state();
        InputObject {
            prev_tx_id: input.prev_tx_id,
            output_index: input.output_index,
            sequence_number: input.sequence_number,
            script: Some(input.script().clone()),
            witnesses: input.witnesses().iter().map(hex::encode).collect(),
            output: input.output().cloned(),
            public_keys: state.map(|s| s.public_keys().to_vec()),
            threshold: state.map(|s| s.threshold()),
            signatures: state.map(|s| s.signatures().to_vec()),
        }
    }
}

impl TryFrom<InputObject> for Input {
    type Error = TransactionError;

    /// Rebuild and classify an input. Without an `output` the input stays
    /// generic; multisig keys are taken in the stored order. The unlocking
    /// `script` is required, though it may be empty.
    fn try_from(obj: InputObject) -> Result<Self, Self::Error> {
        let script = obj.script.ok_or(TransactionError::MissingScript)?;
        let mut input = Input::new(obj.prev_tx_id, obj.output_index, script);
        input.sequence_number = obj.sequence_number;
        let witnesses = obj
            .witnesses
            .iter()
            .map(hex::decode)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| TransactionError::InvalidArgument(format!("witness hex: {}", e)))?;
        input.set_witnesses(witnesses);

        let Some(output) = obj.output else {
            return Ok(input);
        };
        let mut input = input.with_output(output);

        match (obj.public_keys, obj.threshold) {
            (Some(public_keys), Some(threshold)) => {
                let params = MultisigParams::new(public_keys, threshold).without_sorting();
                input.classify(Some(&params))?;
                if let Some(signatures) = obj.signatures {
                    if let Some(state) = input.multisig_state_mut() {
                        state.set_signatures(signatures)?;
                    }
                    input.rebuild_unlocking();
                }
            }
            _ => input.classify(None)?,
        }
        Ok(input)
    }
}

impl From<Transaction> for TransactionObject {
    fn from(tx: Transaction) -> Self {
        tx.to_object()
    }
}

impl TryFrom<TransactionObject> for Transaction {
    type Error = TransactionError;

    fn try_from(obj: TransactionObject) -> Result<Self, Self::Error> {
        Transaction::from_object(obj)
    }
}

impl Transaction {
    pub fn to_object(&self) -> TransactionObject {
        TransactionObject {
            hash: Some(self.hash()),
            version: self.version,
            inputs: self.inputs().iter().map(InputObject::from).collect(),
            outputs: self.outputs().to_vec(),
            lock_time: self.lock_time,
            change_script: self.change_script().cloned(),
            change_index: self.change_index(),
            fee: self.explicit_fee(),
        }
    }

    /// Rebuild a transaction from its object form.
    ///
    /// # Returns
    /// `InvalidArgument` when the change index does not point at an output
    /// paying to the change script, or when `hash` does not match the
    /// rebuilt transaction. `UnsupportedScript` for an input spending an
    /// unknown script.
    pub fn from_object(obj: TransactionObject) -> Result<Self, TransactionError> {
        let inputs = obj
            .inputs
            .into_iter()
            .map(Input::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(index) = obj.change_index {
            let change_script = obj.change_script.as_ref().ok_or_else(|| {
                TransactionError::InvalidArgument("change index given without a change script".to_string())
            })?;
            let output = obj.outputs.get(index).ok_or_else(|| {
                TransactionError::InvalidArgument(format!(
                    "change index {} points past {} outputs",
                    index,
                    obj.outputs.len()
                ))
            })?;
            if &output.script != change_script {
                return Err(TransactionError::InvalidArgument(
                    "change output has an unexpected script".to_string(),
                ));
            }
        }

        let tx = Transaction::from_parts(
            obj.version,
            obj.lock_time,
            inputs,
            obj.outputs,
            obj.fee,
            obj.change_script,
            obj.change_index,
        );
        if let Some(hash) = obj.hash {
            if hash != tx.hash() {
                return Err(TransactionError::InvalidArgument(format!(
                    "hash {} in object does not match transaction hash {}",
                    hash,
                    tx.hash()
                )));
            }
        }
        Ok(tx)
    }

    pub fn to_json(&self) -> Result<String, TransactionError> {
        Ok(serde_json::to_string(&self.to_object())?)
    }

    pub fn from_json(json: &str) -> Result<Self, TransactionError> {
        let obj: TransactionObject = serde_json::from_str(json)?;
        Self::from_object(obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREV_TX_ID: &str = "a477af6b2667c29670467e4e0728b685ee07b240235771862318e29ddbe58458";

    #[test]
    fn test_input_without_output_stays_generic() {
        let json = format!(
            r#"{{"prevTxId":"{}","outputIndex":1,"sequenceNumber":4294967295,"script":"0001"}}"#,
            PREV_TX_ID
        );
        let obj: InputObject = serde_json::from_str(&json).unwrap();
        let input = Input::try_from(obj).unwrap();
        assert_eq!(input.kind(), &crate::input::InputKind::Generic);
        assert_eq!(input.script().to_bytes(), &[0x00, 0x01]);
    }

    #[test]
    fn test_input_without_script_is_rejected() {
        let json = format!(
            r#"{{"prevTxId":"{}","outputIndex":1,"sequenceNumber":4294967295}}"#,
            PREV_TX_ID
        );
        let obj: InputObject = serde_json::from_str(&json).unwrap();
        assert!(matches!(Input::try_from(obj), Err(TransactionError::MissingScript)));

        let json = format!(
            r#"{{"hash":null,"version":2,"inputs":[{{"prevTxId":"{}","outputIndex":0,"sequenceNumber":4294967295}}],"outputs":[],"nLockTime":0}}"#,
            PREV_TX_ID
        );
        assert!(matches!(Transaction::from_json(&json), Err(TransactionError::MissingScript)));
    }

    #[test]
    fn test_unknown_output_script_is_rejected() {
        let json = format!(
            r#"{{"prevTxId":"{}","outputIndex":1,"sequenceNumber":4294967295,"script":"","output":{{"satoshis":1000,"script":"51"}}}}"#,
            PREV_TX_ID
        );
        let obj: InputObject = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            Input::try_from(obj),
            Err(TransactionError::UnsupportedScript(_))
        ));
    }

    #[test]
    fn test_change_index_without_script_is_rejected() {
        let obj = TransactionObject {
            hash: None,
            version: 2,
            inputs: Vec::new(),
            outputs: vec![Output::new(1000, Script::from_hex("51").unwrap())],
            lock_time: 0,
            change_script: None,
            change_index: Some(0),
            fee: None,
        };
        assert!(matches!(
            Transaction::from_object(obj),
            Err(TransactionError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_hash_mismatch_is_rejected() {
        let mut obj = Transaction::new().to_object();
        obj.hash = Some(Hash::from_hex(PREV_TX_ID).unwrap());
        assert!(matches!(
            Transaction::from_object(obj),
            Err(TransactionError::InvalidArgument(_))
        ));
    }
}
