//! A signature bound to the input it authorizes.

use btc_primitives::chainhash::Hash;
use btc_primitives::ec::{PublicKey, Signature};
use serde::{Deserialize, Serialize};

use crate::sighash::SIGHASH_DEFAULT;
use crate::TransactionError;

/// Which signature scheme an input signs with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SigningMethod {
    #[default]
    Ecdsa,
    Schnorr,
}

/// The raw signature, ECDSA for legacy and witness v0 spends, BIP340 for taproot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignatureData {
    Ecdsa(Signature),
    Schnorr([u8; 64]),
}

impl SignatureData {
    pub fn signing_method(&self) -> SigningMethod {
        match self {
            SignatureData::Ecdsa(_) => SigningMethod::Ecdsa,
            SignatureData::Schnorr(_) => SigningMethod::Schnorr,
        }
    }

    /// DER bytes for ECDSA, the 64 raw bytes for Schnorr.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            SignatureData::Ecdsa(sig) => sig.to_der(),
            SignatureData::Schnorr(sig) => sig.to_vec(),
        }
    }

    fn from_bytes(bytes: &[u8], method: SigningMethod) -> Result<Self, TransactionError> {
        match method {
            SigningMethod::Ecdsa => Ok(SignatureData::Ecdsa(Signature::from_der(bytes)?)),
            SigningMethod::Schnorr => {
                let sig: [u8; 64] = bytes.try_into().map_err(|_| {
                    TransactionError::InvalidArgument(format!(
                        "schnorr signature must be 64 bytes, got {}",
                        bytes.len()
                    ))
                })?;
                Ok(SignatureData::Schnorr(sig))
            }
        }
    }
}

/// A signature together with the key, sighash flag and input coordinates
/// it applies to.
///
/// Serializes to
/// `{publicKey, prevTxId, outputIndex, inputIndex, signature, sigtype, signingMethod}`
/// with hex strings for the key, txid and signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SignatureObject", into = "SignatureObject")]
pub struct TransactionSignature {
    pub public_key: PublicKey,
    pub prev_tx_id: Hash,
    pub output_index: u32,
    pub input_index: usize,
    pub signature: SignatureData,
    pub sighash_type: u32,
}

impl TransactionSignature {
    /// The bytes pushed into a scriptSig or witness stack.
    ///
    /// ECDSA signatures always carry the sighash byte; Schnorr signatures
    /// omit it for `SIGHASH_DEFAULT`.
    pub fn to_script_bytes(&self) -> Vec<u8> {
        let mut bytes = self.signature.to_bytes();
        match self.signature {
            SignatureData::Ecdsa(_) => bytes.push(self.sighash_type as u8),
            SignatureData::Schnorr(_) if self.sighash_type != SIGHASH_DEFAULT => {
                bytes.push(self.sighash_type as u8)
            }
            SignatureData::Schnorr(_) => {}
        }
        bytes
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignatureObject {
    public_key: PublicKey,
    prev_tx_id: Hash,
    output_index: u32,
    input_index: usize,
    signature: String,
    sigtype: u32,
    #[serde(default)]
    signing_method: SigningMethod,
}

impl TryFrom<SignatureObject> for TransactionSignature {
    type Error = TransactionError;

    fn try_from(obj: SignatureObject) -> Result<Self, Self::Error> {
        let bytes = hex::decode(&obj.signature)
            .map_err(|e| TransactionError::InvalidArgument(format!("signature hex: {}", e)))?;
        Ok(TransactionSignature {
            public_key: obj.public_key,
            prev_tx_id: obj.prev_tx_id,
            output_index: obj.output_index,
            input_index: obj.input_index,
            signature: SignatureData::from_bytes(&bytes, obj.signing_method)?,
            sighash_type: obj.sigtype,
        })
    }
}

impl From<TransactionSignature> for SignatureObject {
    fn from(sig: TransactionSignature) -> Self {
        SignatureObject {
            public_key: sig.public_key,
            prev_tx_id: sig.prev_tx_id,
            output_index: sig.output_index,
            input_index: sig.input_index,
            signature: hex::encode(sig.signature.to_bytes()),
            sigtype: sig.sighash_type,
            signing_method: sig.signature.signing_method(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sighash::SIGHASH_ALL;

    const PUBKEY: &str = "0236c8204d62fd70e7ca206a36d39f9674fa832964d787c60d44250624242bada4";
    const PREV_TX_ID: &str = "c2ea6ba7dd7c1b46468316624426d8ff684a85a471250e4895dbaa2b9d2b7503";
    const DER: &str = "3045022100ea1508225a6d37c0545d22acaee88d29d1675696953f93d657a419613bcee9b802207b8d80ca8176586878f51e001cb9e92f7640b8c9dc530fabf9087142c752de89";

    fn ecdsa_signature() -> TransactionSignature {
        TransactionSignature {
            public_key: PublicKey::from_hex(PUBKEY).unwrap(),
            prev_tx_id: Hash::from_hex(PREV_TX_ID).unwrap(),
            output_index: 0,
            input_index: 0,
            signature: SignatureData::Ecdsa(Signature::from_der(&hex::decode(DER).unwrap()).unwrap()),
            sighash_type: SIGHASH_ALL,
        }
    }

    #[test]
    fn test_object_roundtrip() {
        let sig = ecdsa_signature();
        let json = serde_json::to_value(&sig).unwrap();
        assert_eq!(json["publicKey"], PUBKEY);
        assert_eq!(json["prevTxId"], PREV_TX_ID);
        assert_eq!(json["signature"], DER);
        assert_eq!(json["sigtype"], 1);
        assert_eq!(json["signingMethod"], "ecdsa");
        let back: TransactionSignature = serde_json::from_value(json).unwrap();
        assert_eq!(back, sig);
    }

    #[test]
    fn test_object_without_signing_method_is_ecdsa() {
        let json = format!(
            r#"{{"publicKey":"{}","prevTxId":"{}","outputIndex":0,"inputIndex":0,"signature":"{}","sigtype":1}}"#,
            PUBKEY, PREV_TX_ID, DER
        );
        let sig: TransactionSignature = serde_json::from_str(&json).unwrap();
        assert_eq!(sig, ecdsa_signature());
    }

    #[test]
    fn test_script_bytes_append_sighash_flag() {
        let sig = ecdsa_signature();
        let bytes = sig.to_script_bytes();
        assert_eq!(hex::encode(&bytes), format!("{}01", DER));

        let mut schnorr = sig.clone();
        schnorr.signature = SignatureData::Schnorr([7u8; 64]);
        schnorr.sighash_type = SIGHASH_DEFAULT;
        assert_eq!(schnorr.to_script_bytes().len(), 64);
        schnorr.sighash_type = SIGHASH_ALL;
        assert_eq!(schnorr.to_script_bytes().len(), 65);
    }

    #[test]
    fn test_rejects_short_schnorr_signature() {
        let json = format!(
            r#"{{"publicKey":"{}","prevTxId":"{}","outputIndex":0,"inputIndex":0,"signature":"abcd","sigtype":0,"signingMethod":"schnorr"}}"#,
            PUBKEY, PREV_TX_ID
        );
        assert!(serde_json::from_str::<TransactionSignature>(&json).is_err());
    }
}
