//! Chain hash type for transaction identification.
//!
//! A `Hash` holds 32 bytes in wire (internal) order and renders as
//! byte-reversed hex, the convention used for transaction ids.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use crate::hash::sha256d;
use crate::PrimitivesError;

/// Size of a Hash in bytes.
pub const HASH_SIZE: usize = 32;

/// A 32-byte hash stored in wire order and displayed reversed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    /// Wrap 32 bytes given in wire order.
    pub const fn new(bytes: [u8; HASH_SIZE]) -> Self {
        Hash(bytes)
    }

    /// Create a Hash from a wire-order byte slice.
    ///
    /// # Returns
    /// `Ok(Hash)` if the slice is exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() != HASH_SIZE {
            return Err(PrimitivesError::InvalidHash(format!(
                "invalid hash length of {}, want {}",
                bytes.len(),
                HASH_SIZE
            )));
        }
        let mut arr = [0u8; HASH_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Hash(arr))
    }

    /// Parse a 64-character display-order hex string.
    ///
    /// Unlike block-explorer helpers this does not zero-pad short input;
    /// transaction ids are always full length.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        if hex_str.len() != HASH_SIZE * 2 {
            return Err(PrimitivesError::InvalidHash(format!(
                "expected {} hex characters, got {}",
                HASH_SIZE * 2,
                hex_str.len()
            )));
        }
        let mut bytes = hex::decode(hex_str)?;
        bytes.reverse();
        Hash::from_slice(&bytes)
    }

    /// Wire-order bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// Display-order (reversed) bytes.
    pub fn to_display_bytes(&self) -> [u8; HASH_SIZE] {
        let mut reversed = self.0;
        reversed.reverse();
        reversed
    }

    /// True for the all-zero hash used by coinbase inputs.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Compare two hashes in display order, as BIP69 requires.
    pub fn cmp_display(&self, other: &Hash) -> Ordering {
        self.to_display_bytes().cmp(&other.to_display_bytes())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.to_display_bytes()))
    }
}

impl FromStr for Hash {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hash::from_hex(s)
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Double SHA-256 of `data` as a Hash.
pub fn double_hash_h(data: &[u8]) -> Hash {
    Hash(sha256d(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TXID: &str = "779a3e5b3c2c452c85333d8521f804c1a52800e60f4b7c3bbe36f4bab350b72c";

    #[test]
    fn test_hex_is_display_order() {
        let hash = Hash::from_hex(TXID).unwrap();
        assert_eq!(hash.as_bytes()[0], 0x2c);
        assert_eq!(hash.as_bytes()[31], 0x77);
        assert_eq!(hash.to_string(), TXID);
        assert_eq!(hash.to_display_bytes()[0], 0x77);
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        assert!(Hash::from_hex("abcd").is_err());
        assert!(Hash::from_hex(&"zz".repeat(32)).is_err());
        assert!(Hash::from_slice(&[0u8; 31]).is_err());
    }

    #[test]
    fn test_cmp_display_uses_reversed_bytes() {
        // Wire order: a < b at byte 0, but display order compares byte 31 first.
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        a[0] = 0x01;
        a[31] = 0x02;
        b[0] = 0x02;
        b[31] = 0x01;
        assert_eq!(Hash::new(a).cmp_display(&Hash::new(b)), Ordering::Greater);
    }

    #[test]
    fn test_json_roundtrip() {
        let hash = Hash::from_hex(TXID).unwrap();
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", TXID));
        let back: Hash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }

    #[test]
    fn test_zero_hash() {
        assert!(Hash::default().is_zero());
        assert!(!Hash::from_hex(TXID).unwrap().is_zero());
    }
}
