//! Network parameters for key and address encodings.

use serde::{Deserialize, Serialize};

/// The network an address or WIF key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Main network.
    #[default]
    Mainnet,
    /// Public test network.
    Testnet,
    /// Local regression-test network.
    Regtest,
}

impl Network {
    /// Version byte of base58 P2PKH addresses.
    pub fn p2pkh_prefix(&self) -> u8 {
        match self {
            Network::Mainnet => 0x00,
            Network::Testnet | Network::Regtest => 0x6f,
        }
    }

    /// Version byte of base58 P2SH addresses.
    pub fn p2sh_prefix(&self) -> u8 {
        match self {
            Network::Mainnet => 0x05,
            Network::Testnet | Network::Regtest => 0xc4,
        }
    }

    /// Version byte of WIF private keys.
    pub fn wif_prefix(&self) -> u8 {
        match self {
            Network::Mainnet => 0x80,
            Network::Testnet | Network::Regtest => 0xef,
        }
    }

    /// Human-readable part of bech32 segwit addresses.
    pub fn bech32_hrp(&self) -> &'static str {
        match self {
            Network::Mainnet => "bc",
            Network::Testnet => "tb",
            Network::Regtest => "bcrt",
        }
    }

    /// Resolve a base58 P2PKH version byte. Testnet wins over regtest
    /// since they share prefixes.
    pub fn from_p2pkh_prefix(prefix: u8) -> Option<Network> {
        [Network::Mainnet, Network::Testnet]
            .into_iter()
            .find(|n| n.p2pkh_prefix() == prefix)
    }

    /// Resolve a base58 P2SH version byte.
    pub fn from_p2sh_prefix(prefix: u8) -> Option<Network> {
        [Network::Mainnet, Network::Testnet]
            .into_iter()
            .find(|n| n.p2sh_prefix() == prefix)
    }

    /// Resolve a WIF version byte.
    pub fn from_wif_prefix(prefix: u8) -> Option<Network> {
        [Network::Mainnet, Network::Testnet]
            .into_iter()
            .find(|n| n.wif_prefix() == prefix)
    }

    /// Resolve a bech32 human-readable part (case-insensitive).
    pub fn from_bech32_hrp(hrp: &str) -> Option<Network> {
        [Network::Mainnet, Network::Testnet, Network::Regtest]
            .into_iter()
            .find(|n| n.bech32_hrp().eq_ignore_ascii_case(hrp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_lookup() {
        assert_eq!(Network::from_p2pkh_prefix(0x00), Some(Network::Mainnet));
        assert_eq!(Network::from_p2sh_prefix(0xc4), Some(Network::Testnet));
        assert_eq!(Network::from_wif_prefix(0xef), Some(Network::Testnet));
        assert_eq!(Network::from_wif_prefix(0x01), None);
    }

    #[test]
    fn test_hrp_lookup() {
        assert_eq!(Network::from_bech32_hrp("BC"), Some(Network::Mainnet));
        assert_eq!(Network::from_bech32_hrp("bcrt"), Some(Network::Regtest));
        assert_eq!(Network::from_bech32_hrp("ltc"), None);
    }
}
