//! The transaction being built, balanced and signed.
//!
//! A `Transaction` owns its inputs and outputs together with the fee and
//! change configuration. Once a change script is set, every mutation that
//! can move the fee reruns the change fixpoint, which also drops any
//! signatures already collected.

use std::cell::Cell;
use std::collections::HashSet;
use std::fmt;

use btc_primitives::chainhash::{double_hash_h, Hash};
use btc_primitives::ec::PrivateKey;
use btc_primitives::util::{VarInt, WireReader, WireWriter};
use btc_script::{Address, Script};
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::FeeErrorKind;
use crate::fee::{FeeConfig, FeeRate, MAX_MONEY};
use crate::input::{Input, InputKind, MultisigParams};
use crate::lock_time::{
    LockTime, DEFAULT_LOCKTIME_SEQNUMBER, DEFAULT_RBF_SEQNUMBER, DEFAULT_SEQNUMBER,
    NLOCKTIME_BLOCKHEIGHT_LIMIT, NLOCKTIME_MAX_VALUE,
};
use crate::object::TransactionObject;
use crate::output::Output;
use crate::signature::{SigningMethod, TransactionSignature};
use crate::unspent_output::UnspentOutput;
use crate::TransactionError;

/// Version given to new transactions.
pub const CURRENT_VERSION: u32 = 2;

/// Largest serialized transaction `verify` accepts.
pub const MAX_BLOCK_SIZE: usize = 1_000_000;

/// Switches for [`Transaction::get_serialization_error`]. All checks run by default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SerializeOptions {
    pub disable_all: bool,
    pub disable_small_fees: bool,
    pub disable_large_fees: bool,
    pub disable_is_fully_signed: bool,
    pub disable_dust_outputs: bool,
    pub disable_more_output_than_input: bool,
}

/// A transaction under construction.
///
/// # Wire format
///
/// | Field          | Size                         |
/// |----------------|------------------------------|
/// | version        | 4 bytes (LE)                 |
/// | marker, flag   | `00 01`, only with witnesses |
/// | input count    | VarInt                       |
/// | inputs         | variable (per input)         |
/// | output count   | VarInt                       |
/// | outputs        | variable (per output)        |
/// | witnesses      | one stack per input, only with witnesses |
/// | lock_time      | 4 bytes (LE)                 |
///
/// Serde uses the object form, see [`TransactionObject`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "TransactionObject", into = "TransactionObject")]
pub struct Transaction {
    pub version: u32,

    /// Raw nLockTime; see [`Transaction::get_lock_time`].
    pub lock_time: u32,

    inputs: Vec<Input>,
    outputs: Vec<Output>,

    /// Explicit fee, overriding the size-based estimate.
    fee: Option<u64>,
    fee_per_kb: Option<u64>,
    fee_per_byte: Option<u64>,
    change_script: Option<Script>,
    change_index: Option<usize>,
    fee_config: FeeConfig,

    input_amount: Cell<Option<u64>>,
    output_amount: Cell<Option<u64>>,
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Transaction {
    /// Create an empty transaction with version 2 and lock time 0.
    pub fn new() -> Self {
        Transaction {
            version: CURRENT_VERSION,
            lock_time: 0,
            inputs: Vec::new(),
            outputs: Vec::new(),
            fee: None,
            fee_per_kb: None,
            fee_per_byte: None,
            change_script: None,
            change_index: None,
            fee_config: FeeConfig::default(),
            input_amount: Cell::new(None),
            output_amount: Cell::new(None),
        }
    }

    /// Assemble a transaction from stored state without rerunning the
    /// change fixpoint, so collected signatures survive.
    pub(crate) fn from_parts(
        version: u32,
        lock_time: u32,
        inputs: Vec<Input>,
        outputs: Vec<Output>,
        fee: Option<u64>,
        change_script: Option<Script>,
        change_index: Option<usize>,
    ) -> Self {
        Transaction {
            version,
            lock_time,
            inputs,
            outputs,
            fee,
            change_script,
            change_index,
            ..Transaction::new()
        }
    }

    /// The explicit fee, if one was set.
    pub fn explicit_fee(&self) -> Option<u64> {
        self.fee
    }

    /// Replace the fee and dust policy.
    pub fn with_fee_config(mut self, config: FeeConfig) -> Self {
        self.fee_config = config;
        self.update_change_output();
        self
    }

    pub fn fee_config(&self) -> &FeeConfig {
        &self.fee_config
    }

    // -----------------------------------------------------------------
    // Deserialization
    // -----------------------------------------------------------------

    /// Parse a transaction from a hex-encoded string.
    pub fn from_hex(hex_str: &str) -> Result<Self, TransactionError> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| TransactionError::SerializationError(format!("invalid hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Parse a transaction from raw bytes with no trailing data.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransactionError> {
        let mut reader = WireReader::new(bytes);
        let tx = Self::read_from(&mut reader)?;
        if reader.remaining() != 0 {
            return Err(TransactionError::SerializationError(format!(
                "trailing {} bytes after transaction",
                reader.remaining()
            )));
        }
        Ok(tx)
    }

    /// Deserialize a transaction from a `WireReader`.
    ///
    /// A zero input count followed by a non-zero byte is read as the segwit
    /// marker and flag. This makes a genuine zero-input transaction with
    /// outputs unreadable; the ambiguity is inherent to the format.
    ///
    /// Inputs come back unclassified; see [`Transaction::associate_inputs`].
    pub fn read_from(reader: &mut WireReader) -> Result<Self, TransactionError> {
        let version = reader.read_u32_le().map_err(|e| {
            TransactionError::SerializationError(format!("reading version: {}", e))
        })?;

        let mut input_count = reader.read_varint().map_err(|e| {
            TransactionError::SerializationError(format!("reading input count: {}", e))
        })?;
        let mut has_witnesses = false;
        if input_count.value() == 0 && matches!(reader.peek_u8(), Ok(flag) if flag != 0) {
            reader.read_u8().map_err(|e| {
                TransactionError::SerializationError(format!("reading segwit flag: {}", e))
            })?;
            has_witnesses = true;
            input_count = reader.read_varint().map_err(|e| {
                TransactionError::SerializationError(format!("reading input count: {}", e))
            })?;
        }

        let mut inputs = Vec::new();
        for _ in 0..input_count.value() {
            inputs.push(Input::read_from(reader)?);
        }

        let output_count = reader.read_varint().map_err(|e| {
            TransactionError::SerializationError(format!("reading output count: {}", e))
        })?;
        let mut outputs = Vec::new();
        for _ in 0..output_count.value() {
            outputs.push(Output::read_from(reader)?);
        }

        if has_witnesses {
            for input in inputs.iter_mut() {
                input.read_witnesses(reader)?;
            }
        }

        let lock_time = reader.read_u32_le().map_err(|e| {
            TransactionError::SerializationError(format!("reading lock time: {}", e))
        })?;

        let mut tx = Transaction::new();
        tx.version = version;
        tx.lock_time = lock_time;
        tx.inputs = inputs;
        tx.outputs = outputs;
        Ok(tx)
    }

    // -----------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------

    /// True if any input carries a non-empty witness stack.
    pub fn has_witnesses(&self) -> bool {
        self.inputs.iter().any(Input::has_witnesses)
    }

    fn write_to(&self, writer: &mut WireWriter, include_witness: bool) {
        let with_witness = include_witness && self.has_witnesses();
        writer.write_u32_le(self.version);
        if with_witness {
            writer.write_bytes(&[0x00, 0x01]);
        }
        writer.write_varint(VarInt::from(self.inputs.len()));
        for input in &self.inputs {
            input.write_to(writer);
        }
        writer.write_varint(VarInt::from(self.outputs.len()));
        for output in &self.outputs {
            output.write_to(writer);
        }
        if with_witness {
            for input in &self.inputs {
                input.write_witnesses(writer);
            }
        }
        writer.write_u32_le(self.lock_time);
    }

    /// The full wire encoding, witnesses included when present.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = WireWriter::new();
        self.write_to(&mut writer, true);
        writer.into_bytes()
    }

    /// The wire encoding without marker, flag or witnesses.
    pub fn to_bytes_no_witness(&self) -> Vec<u8> {
        let mut writer = WireWriter::new();
        self.write_to(&mut writer, false);
        writer.into_bytes()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Serialize without any of the checks of [`checked_serialize`](Self::checked_serialize).
    pub fn unchecked_serialize(&self) -> String {
        self.to_hex()
    }

    /// Serialize after running every check in `opts`.
    ///
    /// # Returns
    /// The hex encoding, or the first error found by
    /// [`get_serialization_error`](Self::get_serialization_error).
    pub fn checked_serialize(&self, opts: &SerializeOptions) -> Result<String, TransactionError> {
        if let Some(err) = self.get_serialization_error(opts) {
            debug!("checked serialization of {} failed: {}", self.hash(), err);
            return Err(err);
        }
        Ok(self.unchecked_serialize())
    }

    /// `checked_serialize` with default options, or `unchecked_serialize`
    /// when `unchecked` is set.
    pub fn serialize(&self, unchecked: bool) -> Result<String, TransactionError> {
        if unchecked {
            Ok(self.unchecked_serialize())
        } else {
            self.checked_serialize(&SerializeOptions::default())
        }
    }

    /// The first reason this transaction should not be broadcast, if any.
    ///
    /// Checks run in order: output amounts, outputs exceeding inputs, fee
    /// bounds, dust outputs, missing signatures.
    pub fn get_serialization_error(&self, opts: &SerializeOptions) -> Option<TransactionError> {
        if opts.disable_all {
            return None;
        }

        if let Some((index, output)) = self.outputs.iter().enumerate().find(|(_, o)| o.invalid_satoshis()) {
            return Some(TransactionError::InvalidSatoshis {
                index,
                satoshis: output.satoshis,
            });
        }

        let unspent = match self.get_unspent_value() {
            Ok(unspent) => unspent,
            Err(e) => return Some(e),
        };
        if unspent < 0 {
            if !opts.disable_more_output_than_input {
                return Some(self.output_sum_error());
            }
        } else if let Some(err) = self.fee_error(opts, unspent as u64) {
            return Some(err);
        }

        if !opts.disable_dust_outputs {
            let dust_amount = self.fee_config.dust_amount;
            if let Some((index, output)) =
                self.outputs.iter().enumerate().find(|(_, o)| o.is_dust(dust_amount))
            {
                return Some(TransactionError::DustOutputs {
                    index,
                    satoshis: output.satoshis,
                });
            }
        }

        if !opts.disable_is_fully_signed {
            match self.is_fully_signed() {
                Ok(true) => {}
                Ok(false) => return Some(TransactionError::MissingSignatures),
                Err(e) => return Some(e),
            }
        }
        None
    }

    fn fee_error(&self, opts: &SerializeOptions, unspent: u64) -> Option<TransactionError> {
        if let Some(fee) = self.fee {
            if fee != unspent {
                return Some(TransactionError::FeeError {
                    kind: FeeErrorKind::Different,
                    message: format!("unspent value is {} but specified fee is {}", unspent, fee),
                });
            }
        }

        let estimate = match self.estimate_fee() {
            Ok(estimate) => estimate,
            Err(e) => return Some(e),
        };
        let margin = self.fee_config.fee_security_margin;

        if !opts.disable_large_fees {
            let maximum = margin.saturating_mul(estimate);
            if unspent > maximum {
                if self.change_script.is_none() {
                    return Some(TransactionError::ChangeAddressMissing { unspent, maximum });
                }
                return Some(TransactionError::FeeError {
                    kind: FeeErrorKind::TooLarge,
                    message: format!("expected less than {} but got {}", maximum, unspent),
                });
            }
        }

        if !opts.disable_small_fees {
            let minimum = estimate.div_ceil(margin.max(1));
            if unspent < minimum {
                return Some(TransactionError::FeeError {
                    kind: FeeErrorKind::TooSmall,
                    message: format!("expected more than {} but got {}", minimum, unspent),
                });
            }
        }
        None
    }

    // -----------------------------------------------------------------
    // Identity and size
    // -----------------------------------------------------------------

    /// Double SHA-256 of the witness-free encoding.
    pub fn hash(&self) -> Hash {
        double_hash_h(&self.to_bytes_no_witness())
    }

    /// The transaction ID in display hex.
    pub fn id(&self) -> String {
        self.hash().to_string()
    }

    /// Double SHA-256 of the full encoding.
    pub fn witness_hash(&self) -> Hash {
        double_hash_h(&self.to_bytes())
    }

    pub fn size(&self) -> usize {
        self.to_bytes().len()
    }

    pub fn base_size(&self) -> usize {
        self.to_bytes_no_witness().len()
    }

    pub fn weight(&self) -> usize {
        self.base_size() * 3 + self.size()
    }

    pub fn vsize(&self) -> usize {
        self.weight().div_ceil(4)
    }

    /// Expected weight once every input is fully signed.
    pub fn estimate_weight(&self) -> usize {
        let base = 4
            + VarInt::from(self.inputs.len()).length()
            + VarInt::from(self.outputs.len()).length()
            + self.outputs.iter().map(Output::size).sum::<usize>()
            + 4;
        let marker = if self.inputs.iter().any(Input::uses_witness) {
            2
        } else {
            0
        };
        4 * base + marker + self.inputs.iter().map(Input::estimate_weight).sum::<usize>()
    }

    /// Expected virtual size once every input is fully signed.
    pub fn estimate_size(&self) -> usize {
        self.estimate_weight().div_ceil(4)
    }

    // -----------------------------------------------------------------
    // Inputs
    // -----------------------------------------------------------------

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    /// Mutable access to one input, for sequence or script edits.
    pub fn input_mut(&mut self, index: usize) -> Option<&mut Input> {
        self.inputs.get_mut(index)
    }

    /// Add inputs spending `utxos`, skipping any outpoint already spent here.
    ///
    /// # Arguments
    /// * `utxos`    - The outputs to spend.
    /// * `multisig` - Keys and threshold when the outputs are multisig conditions.
    pub fn from(
        &mut self,
        utxos: &[UnspentOutput],
        multisig: Option<&MultisigParams>,
    ) -> Result<(), TransactionError> {
        for utxo in utxos {
            if self.spends(&utxo.tx_id, utxo.output_index).is_some() {
                continue;
            }
            let input = Input::from_unspent(utxo, multisig)?;
            self.push_input(input);
        }
        Ok(())
    }

    /// Add an input that knows the output it spends.
    ///
    /// # Returns
    /// `NeedMoreInfo` if the input has no previous output attached.
    pub fn add_input(&mut self, input: Input) -> Result<(), TransactionError> {
        if input.output().is_none() {
            return Err(TransactionError::NeedMoreInfo(
                "need information about the UTXO script and satoshis".to_string(),
            ));
        }
        self.push_input(input);
        Ok(())
    }

    /// Add an input without requiring previous output information.
    pub fn unchecked_add_input(&mut self, input: Input) {
        self.push_input(input);
    }

    fn push_input(&mut self, input: Input) {
        self.inputs.push(input);
        self.input_amount.set(None);
        self.update_change_output();
    }

    pub fn remove_input(&mut self, index: usize) -> Result<(), TransactionError> {
        if index >= self.inputs.len() {
            return Err(TransactionError::InvalidIndex {
                index,
                len: self.inputs.len(),
            });
        }
        self.inputs.remove(index);
        self.input_amount.set(None);
        self.update_change_output();
        Ok(())
    }

    /// Remove the input spending `tx_id:output_index`.
    ///
    /// # Returns
    /// `InvalidIndex` with `index == len` when no input spends that outpoint.
    pub fn remove_input_by_outpoint(
        &mut self,
        tx_id: &Hash,
        output_index: u32,
    ) -> Result<(), TransactionError> {
        let index = self.spends(tx_id, output_index).unwrap_or(self.inputs.len());
        self.remove_input(index)
    }

    /// Attach UTXO information to inputs read from the wire.
    ///
    /// Each matching input is rebuilt from its UTXO and reclassified; its
    /// sequence number is kept.
    ///
    /// # Returns
    /// For each UTXO, the index of the input it matched.
    pub fn associate_inputs(
        &mut self,
        utxos: &[UnspentOutput],
        multisig: Option<&MultisigParams>,
    ) -> Result<Vec<Option<usize>>, TransactionError> {
        let mut indexes = Vec::with_capacity(utxos.len());
        for utxo in utxos {
            let index = self.spends(&utxo.tx_id, utxo.output_index);
            if let Some(index) = index {
                let sequence_number = self.inputs[index].sequence_number;
                let mut input = Input::from_unspent(utxo, multisig)?;
                input.sequence_number = sequence_number;
                self.inputs[index] = input;
                self.input_amount.set(None);
            }
            indexes.push(index);
        }
        Ok(indexes)
    }

    fn spends(&self, tx_id: &Hash, output_index: u32) -> Option<usize> {
        self.inputs
            .iter()
            .position(|i| &i.prev_tx_id == tx_id && i.output_index == output_index)
    }

    /// True when every input knows the output it spends.
    pub fn has_all_utxo_info(&self) -> bool {
        self.inputs.iter().all(|i| i.output().is_some())
    }

    // -----------------------------------------------------------------
    // Outputs
    // -----------------------------------------------------------------

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    pub fn add_output(&mut self, output: Output) {
        self.push_output(output);
        self.update_change_output();
    }

    /// Pay `satoshis` to a base58 or bech32 address.
    pub fn to(&mut self, address: &str, satoshis: u64) -> Result<(), TransactionError> {
        let address = Address::from_string(address)?;
        self.to_address(&address, satoshis);
        Ok(())
    }

    pub fn to_address(&mut self, address: &Address, satoshis: u64) {
        self.add_output(Output::new(satoshis, address.to_script()));
    }

    /// Add a zero-value `OP_RETURN` output carrying `data`.
    pub fn add_data(&mut self, data: &[u8]) -> Result<(), TransactionError> {
        let script = Script::build_data_out(data)?;
        self.add_output(Output::new(0, script));
        Ok(())
    }

    /// Remove an output, shifting the change index past it.
    pub fn remove_output(&mut self, index: usize) -> Result<(), TransactionError> {
        if index >= self.outputs.len() {
            return Err(TransactionError::InvalidIndex {
                index,
                len: self.outputs.len(),
            });
        }
        self.remove_output_at(index);
        self.update_change_output();
        Ok(())
    }

    pub fn clear_outputs(&mut self) {
        self.outputs.clear();
        self.output_amount.set(None);
        self.change_index = None;
        self.clear_signatures();
        self.update_change_output();
    }

    fn push_output(&mut self, output: Output) {
        self.outputs.push(output);
        self.output_amount.set(None);
    }

    fn remove_output_at(&mut self, index: usize) {
        self.outputs.remove(index);
        self.output_amount.set(None);
        self.change_index = match self.change_index {
            Some(change) if change == index => None,
            Some(change) if change > index => Some(change - 1),
            other => other,
        };
    }

    // -----------------------------------------------------------------
    // Fee and change
    // -----------------------------------------------------------------

    /// Set an explicit fee, overriding the estimate.
    pub fn fee(&mut self, amount: u64) {
        self.fee = Some(amount);
        self.update_change_output();
    }

    /// Set the fee rate in satoshis per 1000 bytes.
    pub fn fee_per_kb(&mut self, amount: u64) {
        self.fee_per_kb = Some(amount);
        self.update_change_output();
    }

    /// Set the fee rate in satoshis per byte; takes priority over `fee_per_kb`.
    pub fn fee_per_byte(&mut self, amount: u64) {
        self.fee_per_byte = Some(amount);
        self.update_change_output();
    }

    /// Send change to a base58 or bech32 address.
    pub fn change(&mut self, address: &str) -> Result<(), TransactionError> {
        let address = Address::from_string(address)?;
        self.set_change_script(address.to_script());
        Ok(())
    }

    pub fn set_change_script(&mut self, script: Script) {
        self.change_script = Some(script);
        self.update_change_output();
    }

    pub fn change_script(&self) -> Option<&Script> {
        self.change_script.as_ref()
    }

    pub fn change_index(&self) -> Option<usize> {
        self.change_index
    }

    pub fn get_change_output(&self) -> Option<&Output> {
        self.change_index.and_then(|index| self.outputs.get(index))
    }

    /// Sum of the spent outputs.
    ///
    /// # Returns
    /// `MissingPreviousOutput` naming the first input without one.
    pub fn input_amount(&self) -> Result<u64, TransactionError> {
        if let Some(amount) = self.input_amount.get() {
            return Ok(amount);
        }
        let mut total = 0u64;
        for (index, input) in self.inputs.iter().enumerate() {
            let output = input
                .output()
                .ok_or(TransactionError::MissingPreviousOutput { index })?;
            total = total.saturating_add(output.satoshis);
        }
        self.input_amount.set(Some(total));
        Ok(total)
    }

    pub fn output_amount(&self) -> u64 {
        if let Some(amount) = self.output_amount.get() {
            return amount;
        }
        let total = self
            .outputs
            .iter()
            .fold(0u64, |sum, o| sum.saturating_add(o.satoshis));
        self.output_amount.set(Some(total));
        total
    }

    /// Inputs minus outputs; negative when outputs exceed inputs.
    pub fn get_unspent_value(&self) -> Result<i64, TransactionError> {
        let diff = self.input_amount()? as i128 - self.output_amount() as i128;
        Ok(diff.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }

    fn output_sum_error(&self) -> TransactionError {
        TransactionError::InvalidOutputAmountSum {
            input: self.input_amount().unwrap_or(0),
            output: self.output_amount(),
        }
    }

    /// The fee this transaction pays.
    ///
    /// Zero for a coinbase, the explicit fee when set, the size-based
    /// estimate while a change output exists, and otherwise everything
    /// left unspent.
    pub fn get_fee(&self) -> Result<u64, TransactionError> {
        if self.is_coinbase() {
            return Ok(0);
        }
        if let Some(fee) = self.fee {
            return Ok(fee);
        }
        if self.change_script.is_some() && self.change_index.is_some() {
            return self.estimate_fee();
        }
        let unspent = self.get_unspent_value()?;
        u64::try_from(unspent).map_err(|_| self.output_sum_error())
    }

    fn fee_rate(&self) -> FeeRate {
        match self.fee_per_byte {
            Some(rate) => FeeRate::PerByte(rate),
            None => FeeRate::PerKb(self.fee_per_kb.unwrap_or(self.fee_config.fee_per_kb)),
        }
    }

    /// Serialized size of an output paying to the change script.
    fn change_output_size(&self) -> u64 {
        match &self.change_script {
            Some(script) => Output::new(0, script.clone()).size() as u64,
            None => 0,
        }
    }

    /// The fee for the estimated size, including room for a change output
    /// when the unspent value can pay for one.
    pub fn estimate_fee(&self) -> Result<u64, TransactionError> {
        let size = self.estimate_size() as u64;
        let available = self.get_unspent_value()?;
        let rate = self.fee_rate();
        let fee = rate.fee_for(size);
        let fee_with_change = rate.fee_for(size + self.change_output_size());
        if self.change_script.is_none() || available <= fee_with_change as i64 {
            Ok(fee)
        } else {
            Ok(fee_with_change)
        }
    }

    /// Recompute the change output.
    ///
    /// Signatures are cleared and any change output removed. A new one is
    /// added when the unspent value minus the fee reaches the dust amount;
    /// otherwise the remainder goes to the fee. Running this twice in a row
    /// gives the same outputs.
    fn update_change_output(&mut self) {
        let Some(change_script) = self.change_script.clone() else {
            return;
        };
        self.clear_signatures();
        if let Some(index) = self.change_index {
            self.remove_output_at(index);
        }
        self.change_index = None;

        let available = match self.get_unspent_value() {
            Ok(available) => available,
            Err(e) => {
                debug!("skipping change output: {}", e);
                return;
            }
        };
        let fee = match self.fee {
            Some(fee) => fee,
            None => match self.estimate_fee() {
                Ok(fee) => fee,
                Err(e) => {
                    debug!("skipping change output: {}", e);
                    return;
                }
            },
        };
        let change = available.saturating_sub(fee.min(i64::MAX as u64) as i64);
        debug!(
            "change output recomputed: available={} fee={} change={}",
            available, fee, change
        );
        if change >= 0 && change as u64 >= self.fee_config.dust_amount {
            self.change_index = Some(self.outputs.len());
            self.push_output(Output::new(change as u64, change_script));
        }
    }

    // -----------------------------------------------------------------
    // Ordering
    // -----------------------------------------------------------------

    /// BIP69: inputs by previous txid then index, outputs by amount then
    /// script bytes. Ties keep their current order.
    pub fn sort(&mut self) {
        let inputs = &self.inputs;
        let mut input_order: Vec<usize> = (0..inputs.len()).collect();
        input_order.sort_by(|&a, &b| {
            inputs[a]
                .prev_tx_id
                .cmp_display(&inputs[b].prev_tx_id)
                .then(inputs[a].output_index.cmp(&inputs[b].output_index))
        });

        let outputs = &self.outputs;
        let mut output_order: Vec<usize> = (0..outputs.len()).collect();
        output_order.sort_by(|&a, &b| {
            outputs[a]
                .satoshis
                .cmp(&outputs[b].satoshis)
                .then_with(|| outputs[a].script.to_bytes().cmp(outputs[b].script.to_bytes()))
        });

        self.reorder_inputs(&input_order);
        self.reorder_outputs(&output_order);
    }

    /// Reorder inputs by a permutation: `order[i]` is the current index of
    /// the input that moves to position `i`.
    ///
    /// # Returns
    /// `InvalidSorting` if `order` is not a permutation of the inputs.
    pub fn sort_inputs<F>(&mut self, sorting: F) -> Result<(), TransactionError>
    where
        F: FnOnce(&[Input]) -> Vec<usize>,
    {
        let order = sorting(&self.inputs);
        check_permutation(&order, self.inputs.len())?;
        self.reorder_inputs(&order);
        Ok(())
    }

    /// Reorder outputs by a permutation, keeping track of the change output.
    pub fn sort_outputs<F>(&mut self, sorting: F) -> Result<(), TransactionError>
    where
        F: FnOnce(&[Output]) -> Vec<usize>,
    {
        let order = sorting(&self.outputs);
        check_permutation(&order, self.outputs.len())?;
        self.reorder_outputs(&order);
        Ok(())
    }

    pub fn shuffle_outputs<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut order: Vec<usize> = (0..self.outputs.len()).collect();
        order.shuffle(rng);
        self.reorder_outputs(&order);
    }

    fn reorder_inputs(&mut self, order: &[usize]) {
        let mut slots: Vec<Option<Input>> = self.inputs.drain(..).map(Some).collect();
        self.inputs = order.iter().filter_map(|&i| slots[i].take()).collect();
        self.clear_signatures();
    }

    fn reorder_outputs(&mut self, order: &[usize]) {
        let mut slots: Vec<Option<Output>> = self.outputs.drain(..).map(Some).collect();
        self.outputs = order.iter().filter_map(|&i| slots[i].take()).collect();
        if let Some(change) = self.change_index {
            self.change_index = order.iter().position(|&i| i == change);
        }
        self.clear_signatures();
    }

    // -----------------------------------------------------------------
    // Signing
    // -----------------------------------------------------------------

    /// Sign every input each key can sign and apply the signatures.
    ///
    /// # Arguments
    /// * `keys`         - Signing keys; each signs every input it belongs to.
    /// * `sighash_type` - `None` for the default of each input kind.
    /// * `method`       - Signature scheme for non-taproot inputs.
    pub fn sign(
        &mut self,
        keys: &[PrivateKey],
        sighash_type: Option<u32>,
        method: SigningMethod,
    ) -> Result<(), TransactionError> {
        if !self.has_all_utxo_info() {
            return Err(TransactionError::NeedMoreInfo(
                "not all utxo information is available to sign the transaction".to_string(),
            ));
        }
        for key in keys {
            for signature in self.get_signatures(key, sighash_type, method)? {
                self.apply_signature(signature)?;
            }
        }
        Ok(())
    }

    /// Signatures `key` can produce for this transaction, without applying them.
    pub fn get_signatures(
        &self,
        key: &PrivateKey,
        sighash_type: Option<u32>,
        method: SigningMethod,
    ) -> Result<Vec<TransactionSignature>, TransactionError> {
        let mut signatures = Vec::new();
        for (index, input) in self.inputs.iter().enumerate() {
            signatures.extend(input.get_signatures(self, key, index, sighash_type, method)?);
        }
        Ok(signatures)
    }

    /// Validate a signature, possibly produced elsewhere, and add it to its input.
    pub fn apply_signature(&mut self, signature: TransactionSignature) -> Result<(), TransactionError> {
        let index = signature.input_index;
        let input = self.inputs.get(index).ok_or(TransactionError::InvalidIndex {
            index,
            len: self.inputs.len(),
        })?;
        input.check_can_add(self, &signature)?;
        self.inputs[index].insert_signature(signature)
    }

    /// # Returns
    /// `UnableToVerifySignature` if the target input is unclassified.
    pub fn is_valid_signature(&self, signature: &TransactionSignature) -> Result<bool, TransactionError> {
        let index = signature.input_index;
        let input = self.inputs.get(index).ok_or(TransactionError::InvalidIndex {
            index,
            len: self.inputs.len(),
        })?;
        if matches!(input.kind(), InputKind::Generic) {
            return Err(unresolved_input(index));
        }
        input.is_valid_signature(self, signature)
    }

    /// # Returns
    /// `UnableToVerifySignature` if any input is unclassified.
    pub fn is_fully_signed(&self) -> Result<bool, TransactionError> {
        if let Some(index) = self
            .inputs
            .iter()
            .position(|i| matches!(i.kind(), InputKind::Generic))
        {
            return Err(unresolved_input(index));
        }
        for input in &self.inputs {
            if !input.is_fully_signed()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn clear_signatures(&mut self) {
        for input in self.inputs.iter_mut() {
            input.clear_signatures();
        }
    }

    // -----------------------------------------------------------------
    // Lock time and RBF
    // -----------------------------------------------------------------

    /// Lock until a unix timestamp.
    ///
    /// Existing signatures are kept but no longer valid: every digest
    /// commits to the lock time and sequence numbers.
    ///
    /// # Returns
    /// `LockTimeTooEarly` below the block-height limit, `NLockTimeOutOfRange`
    /// above `u32::MAX`.
    pub fn lock_until_date(&mut self, timestamp: u64) -> Result<(), TransactionError> {
        if timestamp < NLOCKTIME_BLOCKHEIGHT_LIMIT as u64 {
            return Err(TransactionError::LockTimeTooEarly(timestamp));
        }
        if timestamp > NLOCKTIME_MAX_VALUE {
            return Err(TransactionError::NLockTimeOutOfRange(timestamp));
        }
        self.enable_lock_time_sequences();
        self.lock_time = timestamp as u32;
        Ok(())
    }

    /// Lock until a block height. Like [`Transaction::lock_until_date`], this
    /// leaves earlier signatures in place but invalid.
    pub fn lock_until_block_height(&mut self, height: u64) -> Result<(), TransactionError> {
        if height >= NLOCKTIME_BLOCKHEIGHT_LIMIT as u64 {
            return Err(TransactionError::BlockHeightTooHigh(height));
        }
        self.enable_lock_time_sequences();
        self.lock_time = height as u32;
        Ok(())
    }

    /// Final sequence numbers would disable nLockTime.
    fn enable_lock_time_sequences(&mut self) {
        for input in self.inputs.iter_mut() {
            if input.sequence_number == DEFAULT_SEQNUMBER {
                input.sequence_number = DEFAULT_LOCKTIME_SEQNUMBER;
            }
        }
    }

    pub fn get_lock_time(&self) -> Option<LockTime> {
        LockTime::from_raw(self.lock_time)
    }

    /// Signal replaceability on every input not already signalling it.
    ///
    /// Signatures made before this call stay attached but no longer verify,
    /// since the sequence numbers are part of every digest.
    pub fn enable_rbf(&mut self) {
        for input in self.inputs.iter_mut() {
            if input.sequence_number >= DEFAULT_LOCKTIME_SEQNUMBER {
                input.sequence_number = DEFAULT_RBF_SEQNUMBER;
            }
        }
    }

    pub fn is_rbf(&self) -> bool {
        self.inputs
            .iter()
            .any(|i| i.sequence_number < DEFAULT_LOCKTIME_SEQNUMBER)
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].is_null()
    }

    // -----------------------------------------------------------------
    // Verification
    // -----------------------------------------------------------------

    /// Context-free sanity checks.
    ///
    /// # Returns
    /// `Verify` with the reason for the first failing check.
    pub fn verify(&self) -> Result<(), TransactionError> {
        if self.inputs.is_empty() {
            return Err(TransactionError::Verify("transaction txins empty".to_string()));
        }
        if self.outputs.is_empty() {
            return Err(TransactionError::Verify("transaction txouts empty".to_string()));
        }

        let mut total = 0u64;
        for (i, output) in self.outputs.iter().enumerate() {
            if output.invalid_satoshis() {
                return Err(TransactionError::Verify(format!(
                    "transaction txout {} greater than MAX_MONEY",
                    i
                )));
            }
            total = total.saturating_add(output.satoshis);
            if total > MAX_MONEY {
                return Err(TransactionError::Verify(format!(
                    "transaction txout {} total output greater than MAX_MONEY",
                    i
                )));
            }
        }

        if self.size() > MAX_BLOCK_SIZE {
            return Err(TransactionError::Verify(
                "transaction over the maximum block size".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(self.inputs.len());
        for (i, input) in self.inputs.iter().enumerate() {
            if !seen.insert((input.prev_tx_id, input.output_index)) {
                return Err(TransactionError::Verify(format!(
                    "transaction input {} duplicate input",
                    i
                )));
            }
        }

        if self.is_coinbase() {
            let len = self.inputs[0].script().len();
            if !(2..=100).contains(&len) {
                return Err(TransactionError::Verify(
                    "coinbase transaction script size invalid".to_string(),
                ));
            }
        } else if let Some(i) = self.inputs.iter().position(Input::is_null) {
            return Err(TransactionError::Verify(format!(
                "transaction input {} has null input",
                i
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

fn unresolved_input(index: usize) -> TransactionError {
    TransactionError::UnableToVerifySignature(format!(
        "input {} has an unrecognized script kind; attach its previous output first",
        index
    ))
}

fn check_permutation(order: &[usize], len: usize) -> Result<(), TransactionError> {
    if order.len() != len {
        return Err(TransactionError::InvalidSorting(format!(
            "expected {} positions, got {}",
            len,
            order.len()
        )));
    }
    let mut seen = vec![false; len];
    for &i in order {
        if i >= len || seen[i] {
            return Err(TransactionError::InvalidSorting(format!(
                "{} is not a permutation of 0..{}",
                format_order(order),
                len
            )));
        }
        seen[i] = true;
    }
    Ok(())
}

fn format_order(order: &[usize]) -> String {
    let items: Vec<String> = order.iter().map(|i| i.to_string()).collect();
    format!("[{}]", items.join(", "))
}
