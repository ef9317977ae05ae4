/// Address handling.
///
/// Supports base58check P2PKH / P2SH addresses and bech32 / bech32m
/// segwit addresses (P2WPKH, P2WSH, P2TR), and conversion between an
/// address and the locking script it pays to.

use std::fmt;
use std::str::FromStr;

use bech32::{Fe32, Hrp};
use btc_primitives::base58;
use btc_primitives::ec::PublicKey;
use btc_primitives::Network;

use crate::{Script, ScriptError};

/// The output template an address pays to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressType {
    /// Base58 P2PKH (`1...`, `m...`, `n...`).
    PayToPublicKeyHash,
    /// Base58 P2SH (`3...`, `2...`).
    PayToScriptHash,
    /// Bech32 witness v0 key hash.
    PayToWitnessPublicKeyHash,
    /// Bech32 witness v0 script hash.
    PayToWitnessScriptHash,
    /// Bech32m witness v1 output key.
    PayToTaproot,
}

/// A parsed or constructed address.
///
/// Holds the rendered string next to the decoded parts so that display
/// never has to re-encode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Address {
    address_string: String,
    network: Network,
    kind: AddressType,
    hash: Vec<u8>,
}

impl Address {
    /// Parse a base58check or bech32 address for any known network.
    ///
    /// Base58 testnet prefixes are shared with regtest and resolve to
    /// `Network::Testnet`.
    pub fn from_string(addr: &str) -> Result<Self, ScriptError> {
        if let Ok((hrp, version, program)) = bech32::segwit::decode(addr) {
            return Self::from_witness_parts(addr, &hrp, version, program);
        }
        Self::from_base58(addr)
    }

    /// Parse an address and require it to belong to `network`.
    ///
    /// Testnet and regtest share base58 prefixes, so either is accepted
    /// for the other on base58 addresses.
    pub fn from_string_for_network(addr: &str, network: Network) -> Result<Self, ScriptError> {
        let mut parsed = Self::from_string(addr)?;
        let base58 = matches!(
            parsed.kind,
            AddressType::PayToPublicKeyHash | AddressType::PayToScriptHash
        );
        let same = parsed.network == network
            || (base58 && network == Network::Regtest && parsed.network == Network::Testnet);
        if !same {
            return Err(ScriptError::WrongNetwork {
                address: addr.to_string(),
                expected: network,
            });
        }
        parsed.network = network;
        Ok(parsed)
    }

    fn from_base58(addr: &str) -> Result<Self, ScriptError> {
        let payload = base58::check_decode(addr)
            .map_err(|e| ScriptError::InvalidAddress(format!("{}: {}", addr, e)))?;
        if payload.len() != 21 {
            return Err(ScriptError::InvalidAddress(format!(
                "{}: invalid payload length {}",
                addr,
                payload.len()
            )));
        }
        let (network, kind) = if let Some(n) = Network::from_p2pkh_prefix(payload[0]) {
            (n, AddressType::PayToPublicKeyHash)
        } else if let Some(n) = Network::from_p2sh_prefix(payload[0]) {
            (n, AddressType::PayToScriptHash)
        } else {
            return Err(ScriptError::InvalidAddress(format!(
                "{}: unknown version byte 0x{:02x}",
                addr, payload[0]
            )));
        };
        Ok(Address {
            address_string: addr.to_string(),
            network,
            kind,
            hash: payload[1..].to_vec(),
        })
    }

    fn from_witness_parts(
        addr: &str,
        hrp: &Hrp,
        version: Fe32,
        program: Vec<u8>,
    ) -> Result<Self, ScriptError> {
        let network = Network::from_bech32_hrp(&hrp.to_lowercase()).ok_or_else(|| {
            ScriptError::InvalidAddress(format!("{}: unknown prefix {}", addr, hrp))
        })?;
        let kind = match (version.to_u8(), program.len()) {
            (0, 20) => AddressType::PayToWitnessPublicKeyHash,
            (0, 32) => AddressType::PayToWitnessScriptHash,
            (1, 32) => AddressType::PayToTaproot,
            (v, len) => {
                return Err(ScriptError::InvalidAddress(format!(
                    "{}: unsupported witness version {} with {} byte program",
                    addr, v, len
                )));
            }
        };
        Ok(Address {
            address_string: addr.to_lowercase(),
            network,
            kind,
            hash: program,
        })
    }

    /// Build an address from its parts.
    ///
    /// # Returns
    /// The address, or `InvalidAddress` if `hash` has the wrong length for `kind`.
    pub fn new(kind: AddressType, hash: &[u8], network: Network) -> Result<Self, ScriptError> {
        let expected = match kind {
            AddressType::PayToPublicKeyHash
            | AddressType::PayToScriptHash
            | AddressType::PayToWitnessPublicKeyHash => 20,
            AddressType::PayToWitnessScriptHash | AddressType::PayToTaproot => 32,
        };
        if hash.len() != expected {
            return Err(ScriptError::InvalidAddress(format!(
                "{:?} needs a {} byte hash, got {}",
                kind,
                expected,
                hash.len()
            )));
        }
        let address_string = match kind {
            AddressType::PayToPublicKeyHash => base58_string(network.p2pkh_prefix(), hash),
            AddressType::PayToScriptHash => base58_string(network.p2sh_prefix(), hash),
            AddressType::PayToWitnessPublicKeyHash | AddressType::PayToWitnessScriptHash => {
                bech32_string(network, 0, hash)?
            }
            AddressType::PayToTaproot => bech32_string(network, 1, hash)?,
        };
        Ok(Address {
            address_string,
            network,
            kind,
            hash: hash.to_vec(),
        })
    }

    /// P2PKH address for a 20-byte public key hash.
    pub fn from_public_key_hash(hash: &[u8; 20], network: Network) -> Self {
        Address {
            address_string: base58_string(network.p2pkh_prefix(), hash),
            network,
            kind: AddressType::PayToPublicKeyHash,
            hash: hash.to_vec(),
        }
    }

    /// Address paying to `key` using the key-based template `kind`.
    ///
    /// # Returns
    /// `InvalidAddress` for the script-hash kinds, which need a script.
    pub fn from_public_key(
        key: &PublicKey,
        network: Network,
        kind: AddressType,
    ) -> Result<Self, ScriptError> {
        match kind {
            AddressType::PayToPublicKeyHash | AddressType::PayToWitnessPublicKeyHash => {
                Self::new(kind, &key.hash160(), network)
            }
            AddressType::PayToTaproot => {
                let script = Script::build_taproot_out(key)?;
                Self::new(kind, &script.to_bytes()[2..], network)
            }
            _ => Err(ScriptError::InvalidAddress(format!(
                "{:?} cannot be derived from a public key",
                kind
            ))),
        }
    }

    /// Derive the address a standard locking script pays to.
    ///
    /// # Returns
    /// `UnsupportedScript` for scripts that have no address form.
    pub fn from_script(script: &Script, network: Network) -> Result<Self, ScriptError> {
        let b = script.to_bytes();
        if script.is_public_key_hash_out() {
            Self::new(AddressType::PayToPublicKeyHash, &b[3..23], network)
        } else if script.is_script_hash_out() {
            Self::new(AddressType::PayToScriptHash, &b[2..22], network)
        } else if script.is_witness_public_key_hash_out() {
            Self::new(AddressType::PayToWitnessPublicKeyHash, &b[2..], network)
        } else if script.is_witness_script_hash_out() {
            Self::new(AddressType::PayToWitnessScriptHash, &b[2..], network)
        } else if script.is_taproot_out() {
            Self::new(AddressType::PayToTaproot, &b[2..], network)
        } else {
            Err(ScriptError::UnsupportedScript(format!(
                "no address form for script {}",
                script
            )))
        }
    }

    /// The locking script paying to this address.
    pub fn to_script(&self) -> Script {
        let mut hash20 = [0u8; 20];
        match self.kind {
            AddressType::PayToPublicKeyHash => {
                hash20.copy_from_slice(&self.hash);
                Script::build_public_key_hash_out(&hash20)
            }
            AddressType::PayToScriptHash => {
                hash20.copy_from_slice(&self.hash);
                Script::build_script_hash_out_from_hash(&hash20)
            }
            AddressType::PayToWitnessPublicKeyHash | AddressType::PayToWitnessScriptHash => {
                witness_script(0, &self.hash)
            }
            AddressType::PayToTaproot => witness_script(1, &self.hash),
        }
    }

    /// The network this address belongs to.
    pub fn network(&self) -> Network {
        self.network
    }

    /// The template this address pays to.
    pub fn kind(&self) -> AddressType {
        self.kind
    }

    /// The hash or witness program the address commits to.
    pub fn hash(&self) -> &[u8] {
        &self.hash
    }
}

fn base58_string(version: u8, hash: &[u8]) -> String {
    let mut payload = Vec::with_capacity(1 + hash.len());
    payload.push(version);
    payload.extend_from_slice(hash);
    base58::check_encode(&payload)
}

fn bech32_string(network: Network, version: u8, program: &[u8]) -> Result<String, ScriptError> {
    let hrp = Hrp::parse(network.bech32_hrp())
        .map_err(|e| ScriptError::InvalidAddress(e.to_string()))?;
    let version =
        Fe32::try_from(version).map_err(|e| ScriptError::InvalidAddress(e.to_string()))?;
    bech32::segwit::encode(hrp, version, program)
        .map_err(|e| ScriptError::InvalidAddress(e.to_string()))
}

// Only called with programs whose length was checked on construction.
fn witness_script(version: u8, program: &[u8]) -> Script {
    let mut b = Vec::with_capacity(program.len() + 2);
    b.push(if version == 0 { crate::opcodes::OP_0 } else { crate::opcodes::OP_1 + version - 1 });
    b.push(program.len() as u8);
    b.extend_from_slice(program);
    Script::from(b)
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address_string)
    }
}

impl FromStr for Address {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::from_string(s)
    }
}

impl serde::Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.address_string)
    }
}

impl<'de> serde::Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_string(&s).map_err(serde::de::Error::custom)
    }
}
