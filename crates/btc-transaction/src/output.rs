//! Transaction output with satoshi value and locking script.

use btc_primitives::util::{var_bytes_len, WireReader, WireWriter};
use btc_script::Script;
use serde::{Deserialize, Serialize};

use crate::fee::MAX_MONEY;
use crate::TransactionError;

/// A single output: an amount and the script that locks it.
///
/// # Wire format
///
/// | Field            | Size           |
/// |------------------|----------------|
/// | satoshis         | 8 bytes (LE)   |
/// | script length    | VarInt         |
/// | script           | variable       |
///
/// The object form is `{"satoshis": n, "script": "<hex>"}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub satoshis: u64,
    pub script: Script,
}

impl Output {
    pub fn new(satoshis: u64, script: Script) -> Self {
        Output { satoshis, script }
    }

    /// Deserialize an `Output` from a `WireReader`.
    ///
    /// # Returns
    /// `Ok(Output)` on success, or a `SerializationError` if the data is
    /// truncated.
    pub fn read_from(reader: &mut WireReader) -> Result<Self, TransactionError> {
        let satoshis = reader.read_u64_le().map_err(|e| {
            TransactionError::SerializationError(format!("reading satoshis: {}", e))
        })?;
        let script = reader.read_var_bytes().map_err(|e| {
            TransactionError::SerializationError(format!("reading locking script: {}", e))
        })?;
        Ok(Output {
            satoshis,
            script: Script::from(script),
        })
    }

    pub fn write_to(&self, writer: &mut WireWriter) {
        writer.write_u64_le(self.satoshis);
        writer.write_var_bytes(self.script.to_bytes());
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = WireWriter::with_capacity(self.size());
        self.write_to(&mut writer);
        writer.into_bytes()
    }

    /// Serialized size in bytes.
    pub fn size(&self) -> usize {
        8 + var_bytes_len(self.script.len())
    }

    /// True if the amount exceeds the total money supply.
    pub fn invalid_satoshis(&self) -> bool {
        self.satoshis > MAX_MONEY
    }

    /// True if this output is below `dust_amount` and is not a data carrier.
    pub fn is_dust(&self, dust_amount: u64) -> bool {
        self.satoshis < dust_amount && !self.script.is_data_out()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P2PKH_OUTPUT_HEX: &str = "50690f00000000001976a9147821c0a3768aa9d1a37e16cf76002aef5373f1a888ac";

    #[test]
    fn test_output_wire_roundtrip() {
        let bytes = hex::decode(P2PKH_OUTPUT_HEX).unwrap();
        let mut reader = WireReader::new(&bytes);
        let output = Output::read_from(&mut reader).unwrap();
        assert_eq!(output.satoshis, 1_010_000);
        assert!(output.script.is_public_key_hash_out());
        assert_eq!(output.size(), 34);
        assert_eq!(hex::encode(output.to_bytes()), P2PKH_OUTPUT_HEX);
    }

    #[test]
    fn test_truncated_output() {
        let bytes = hex::decode(&P2PKH_OUTPUT_HEX[..40]).unwrap();
        let mut reader = WireReader::new(&bytes);
        assert!(matches!(
            Output::read_from(&mut reader),
            Err(TransactionError::SerializationError(_))
        ));
    }

    #[test]
    fn test_dust_and_invalid_amounts() {
        let script = Script::from_hex("76a9147821c0a3768aa9d1a37e16cf76002aef5373f1a888ac").unwrap();
        assert!(Output::new(545, script.clone()).is_dust(546));
        assert!(!Output::new(546, script.clone()).is_dust(546));
        assert!(!Output::new(0, Script::build_data_out(b"hi").unwrap()).is_dust(546));
        assert!(Output::new(MAX_MONEY + 1, script.clone()).invalid_satoshis());
        assert!(!Output::new(MAX_MONEY, script).invalid_satoshis());
    }

    #[test]
    fn test_output_object_form() {
        let output = Output::new(1000, Script::from_hex("6a0568656c6c6f").unwrap());
        let json = serde_json::to_string(&output).unwrap();
        assert_eq!(json, r#"{"satoshis":1000,"script":"6a0568656c6c6f"}"#);
        let back: Output = serde_json::from_str(&json).unwrap();
        assert_eq!(back, output);
    }
}
