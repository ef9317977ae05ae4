//! BIP341 signature hash for taproot key-path spends.
//!
//! See <https://github.com/bitcoin/bips/blob/master/bip-0341.mediawiki#common-signature-message>

use btc_primitives::hash::{sha256, TaggedHasher};
use btc_primitives::util::WireWriter;
use log::trace;

use super::{
    SIGHASH_ALL, SIGHASH_ANYONECANPAY, SIGHASH_DEFAULT, SIGHASH_INPUT_MASK, SIGHASH_OUTPUT_MASK,
    SIGHASH_SINGLE,
};
use crate::output::Output;
use crate::transaction::Transaction;
use crate::TransactionError;

pub const TAP_SIGHASH_TAG: &str = "TapSighash";

/// True for the flags BIP341 accepts: 0x00..=0x03 and 0x81..=0x83.
pub fn is_valid_sighash_type(sighash_type: u32) -> bool {
    sighash_type <= 0x03 || (0x81..=0x83).contains(&sighash_type)
}

/// Compute the key-path signature hash for a given input.
///
/// Every input must carry the output it spends, since the digest commits
/// to all spent amounts and scripts (only the signed one under
/// ANYONECANPAY).
///
/// # Returns
/// The tagged `TapSighash` digest, `InvalidArgument` for a flag outside
/// the BIP341 set or SIGHASH_SINGLE without a matching output, and
/// `MissingPreviousOutput` when spent-output data is absent.
pub fn signature_hash(
    tx: &Transaction,
    input_index: usize,
    sighash_type: u32,
) -> Result<[u8; 32], TransactionError> {
    if !is_valid_sighash_type(sighash_type) {
        return Err(TransactionError::InvalidArgument(format!(
            "invalid taproot sighash type 0x{:02x}",
            sighash_type
        )));
    }
    let inputs = tx.inputs();
    let outputs = tx.outputs();
    let input = inputs.get(input_index).ok_or(TransactionError::InvalidIndex {
        index: input_index,
        len: inputs.len(),
    })?;

    let output_type = if sighash_type == SIGHASH_DEFAULT {
        SIGHASH_ALL
    } else {
        sighash_type & SIGHASH_OUTPUT_MASK
    };
    let anyone_can_pay = sighash_type & SIGHASH_INPUT_MASK == SIGHASH_ANYONECANPAY;

    let mut hasher = TaggedHasher::new(TAP_SIGHASH_TAG);
    // epoch
    hasher.update(&[0x00]);
    hasher.update(&[sighash_type as u8]);
    hasher.update(&tx.version.to_le_bytes());
    hasher.update(&tx.lock_time.to_le_bytes());

    if !anyone_can_pay {
        let spent = spent_outputs(tx)?;
        let mut prevouts = WireWriter::with_capacity(inputs.len() * 36);
        let mut amounts = WireWriter::with_capacity(inputs.len() * 8);
        let mut scripts = WireWriter::new();
        let mut sequences = WireWriter::with_capacity(inputs.len() * 4);
        for (input, output) in inputs.iter().zip(spent) {
            prevouts.write_bytes(input.prev_tx_id.as_bytes());
            prevouts.write_u32_le(input.output_index);
            amounts.write_u64_le(output.satoshis);
            scripts.write_var_bytes(output.script.to_bytes());
            sequences.write_u32_le(input.sequence_number);
        }
        hasher.update(&sha256(prevouts.as_bytes()));
        hasher.update(&sha256(amounts.as_bytes()));
        hasher.update(&sha256(scripts.as_bytes()));
        hasher.update(&sha256(sequences.as_bytes()));
    }

    if output_type == SIGHASH_ALL {
        let mut all = WireWriter::new();
        for output in outputs {
            output.write_to(&mut all);
        }
        hasher.update(&sha256(all.as_bytes()));
    }

    // spend_type: key path, no annex
    hasher.update(&[0x00]);

    if anyone_can_pay {
        let spent = input
            .output()
            .ok_or(TransactionError::MissingPreviousOutput { index: input_index })?;
        let mut own = WireWriter::new();
        own.write_bytes(input.prev_tx_id.as_bytes());
        own.write_u32_le(input.output_index);
        spent.write_to(&mut own);
        own.write_u32_le(input.sequence_number);
        hasher.update(own.as_bytes());
    } else {
        hasher.update(&(input_index as u32).to_le_bytes());
    }

    if output_type == SIGHASH_SINGLE {
        let output = outputs.get(input_index).ok_or_else(|| {
            TransactionError::InvalidArgument(format!(
                "SIGHASH_SINGLE for input {} without a matching output",
                input_index
            ))
        })?;
        hasher.update(&sha256(&output.to_bytes()));
    }

    let digest = hasher.finalize();
    trace!(
        "taproot sighash input={} type=0x{:02x} digest={}",
        input_index,
        sighash_type,
        hex::encode(digest)
    );
    Ok(digest)
}

fn spent_outputs(tx: &Transaction) -> Result<Vec<&Output>, TransactionError> {
    tx.inputs()
        .iter()
        .enumerate()
        .map(|(index, input)| {
            input
                .output()
                .ok_or(TransactionError::MissingPreviousOutput { index })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use btc_script::Script;

    use crate::unspent_output::UnspentOutput;

    const UTXO_TX_ID: &str = "a477af6b2667c29670467e4e0728b685ee07b240235771862318e29ddbe58458";
    const OTHER_TX_ID: &str = "1d732950d99f821b8a8d11972ea56000b0666e4d31fa71861ffd80a83797dc61";

    /// Version 2, lock time 650000, three P2TR inputs with mixed
    /// sequences and two outputs.
    const TAPROOT_TX: &str = "02000000035884e5db9de218238671572340b207ee85b628074e7e467096c267266baf77a40000000000ffffffff61dc9737a880fd1f8671fa314d6e66b00060a52e97118d8a1b829fd95029731d0100000000fdffffff5884e5db9de218238671572340b207ee85b628074e7e467096c267266baf77a40300000000000000000280841e0000000000225120cafd90c7026f0b6ab98df89490d02732881f2f4b5900856358dddff4679c2ffb20d61300000000001976a9147821c0a3768aa9d1a37e16cf76002aef5373f1a888ac10eb0900";

    fn taproot_tx() -> Transaction {
        let utxo = |tx_id: &str, index: u32, script: &str, satoshis: u64| {
            UnspentOutput::new(tx_id, index, Script::from_hex(script).unwrap(), satoshis).unwrap()
        };
        let mut tx = Transaction::from_hex(TAPROOT_TX).unwrap();
        let matched = tx
            .associate_inputs(
                &[
                    utxo(
                        UTXO_TX_ID,
                        0,
                        "5120a60869f0dbcf1dc659c9cecbaf8050135ea9e8cdc487053f1dc6880949dc684c",
                        100_000,
                    ),
                    utxo(
                        OTHER_TX_ID,
                        1,
                        "5120cafd90c7026f0b6ab98df89490d02732881f2f4b5900856358dddff4679c2ffb",
                        250_000,
                    ),
                    utxo(
                        UTXO_TX_ID,
                        3,
                        "5120418c46636d9e1a683f58e35b42336e776fdcc3b2d4e39e7a0bf1ab0716e3c5fa",
                        3_000_000,
                    ),
                ],
                None,
            )
            .unwrap();
        assert_eq!(matched, vec![Some(0), Some(1), Some(2)]);
        tx
    }

    fn digest(tx: &Transaction, index: usize, sighash_type: u32) -> String {
        hex::encode(signature_hash(tx, index, sighash_type).unwrap())
    }

    #[test]
    fn test_key_path_digests() {
        let tx = taproot_tx();
        let cases: [(usize, u32, &str); 19] = [
            (0, 0x00, "87cab2a67a6a5ffcbf904ff3dedfdabe5c9f11e782151d48aeb2d3aec7cae03f"),
            (0, 0x01, "aa304c2f204044569507db1aa7805702fe46df943b25cfcf35d4c7eef132e4fc"),
            (0, 0x02, "3d1bf75096c32c5e948ef2cca7ab5f1ab07cdde35b9758741824a8b31445f279"),
            (0, 0x03, "094bc56e1a1a881a056019a5c5840457ab13f667996a2ebb224b08bad22544b7"),
            (0, 0x81, "321fedbf533e1c73ca3fe6fbb24456731f76ec9ba42745e26e53f0d38d4c8ef4"),
            (0, 0x82, "21002fe804e5c435a21f15bd9a7e3eb3686ed39bd7b8b6ae03fc7cd663d279d6"),
            (0, 0x83, "3feacc4363bebc3c4f8752168089d0968bb2348f529e946666708072d0f2912d"),
            (1, 0x00, "bf6c9de5166cb69bc5a253b803a538a90cb3f4492c610f2c93e955c6855439d9"),
            (1, 0x01, "5f749613b157dbc65611ff83c5553c6b1a7a53df14690c114d9301c9cfcf060b"),
            (1, 0x02, "fdf19fab87bf295cc9a3812ac2c06c4049fea6d7a5597ed295278f8242da15bf"),
            (1, 0x03, "52fefc5890d0b38929df6a929afce19a544515433ad75d530ef633284c5e26d1"),
            (1, 0x81, "3fa77e451bd052f08e2ec6145b75e4f76914e9b6223ce352b14c2fb82944f8fd"),
            (1, 0x82, "7ebe83d0a43354489f21754b40f563429a23927fee677ddbc51ce8009e9edbdf"),
            (1, 0x83, "257bc4cea4ef796c307c6548f34652535fa99b2ae96adc79271bfca2a221bdfc"),
            (2, 0x00, "e4e4cdff27cdf8cabe2e0c01cd6ba421594f3b01841430fad0296c1ee2bc590e"),
            (2, 0x01, "3bb2177c4cb96264d0acfffbb7c2da9b0b7fa3706db3195ab0b71e0ead1d4773"),
            (2, 0x02, "e3252567cf47051663ebea1ec010aff3021a63c798a5133811c8eab62a582c11"),
            (2, 0x81, "8940811fc6b0b1c39f666d07d411b6069af0c8f6c1ed46479615af69e450d9a1"),
            (2, 0x82, "4fb1b1ca9bd09f44df2ef8ebf44f8854d8615aab9bd6d51b828498b48e615acc"),
        ];
        for (index, sighash_type, expected) in cases {
            assert_eq!(
                digest(&tx, index, sighash_type),
                expected,
                "input {} type 0x{:02x}",
                index,
                sighash_type
            );
        }
    }

    #[test]
    fn test_single_without_matching_output() {
        let tx = taproot_tx();
        for sighash_type in [0x03, 0x83] {
            assert!(matches!(
                signature_hash(&tx, 2, sighash_type),
                Err(TransactionError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn test_missing_spent_outputs() {
        let tx = Transaction::from_hex(TAPROOT_TX).unwrap();
        assert!(matches!(
            signature_hash(&tx, 0, 0x00),
            Err(TransactionError::MissingPreviousOutput { index: 0 })
        ));
        assert!(matches!(
            signature_hash(&tx, 3, 0x00),
            Err(TransactionError::InvalidIndex { index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_valid_sighash_types() {
        for t in [0x00, 0x01, 0x02, 0x03, 0x81, 0x82, 0x83] {
            assert!(is_valid_sighash_type(t));
        }
        for t in [0x04, 0x80, 0x84, 0x41, 0xff] {
            assert!(!is_valid_sighash_type(t));
        }
    }
}
