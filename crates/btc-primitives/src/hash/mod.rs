//! Hash function primitives.
//!
//! Provides SHA-256, double SHA-256, RIPEMD-160, Hash160 and the BIP340
//! tagged hash used by taproot signature hashing and key tweaking.

use sha2::{Digest, Sha256};
use ripemd::Ripemd160;

/// Compute SHA-256 hash of the input data.
///
/// # Arguments
/// * `data` - Byte slice to hash.
///
/// # Returns
/// A 32-byte SHA-256 digest.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute double SHA-256 (SHA-256d) hash of the input data.
///
/// This is the hash used for transaction IDs and legacy / witness v0
/// signature digests. Computes SHA-256(SHA-256(data)).
///
/// # Arguments
/// * `data` - Byte slice to hash.
///
/// # Returns
/// A 32-byte double-SHA-256 digest.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// Compute RIPEMD-160 hash of the input data.
pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 20];
    output.copy_from_slice(&result);
    output
}

/// Compute Hash160: RIPEMD-160(SHA-256(data)).
///
/// Used for public-key-hash and script-hash locking scripts.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    ripemd160(&sha256(data))
}

/// Compute a BIP340 tagged hash: `SHA256(SHA256(tag) || SHA256(tag) || data)`.
///
/// # Arguments
/// * `tag` - The ASCII tag, e.g. `"TapSighash"`.
/// * `data` - The message bytes.
///
/// # Returns
/// A 32-byte digest.
pub fn tagged_hash(tag: &str, data: &[u8]) -> [u8; 32] {
    let mut hasher = TaggedHasher::new(tag);
    hasher.update(data);
    hasher.finalize()
}

/// Incremental BIP340 tagged hasher.
///
/// The tag prefix is absorbed at construction so callers can stream the
/// message in pieces, which is how the taproot sighash preimage is built.
#[derive(Clone)]
pub struct TaggedHasher {
    inner: Sha256,
}

impl TaggedHasher {
    /// Start a new tagged hash for `tag`.
    pub fn new(tag: &str) -> Self {
        let tag_hash = sha256(tag.as_bytes());
        let mut inner = Sha256::new();
        inner.update(tag_hash);
        inner.update(tag_hash);
        TaggedHasher { inner }
    }

    /// Absorb more message bytes.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Finish and return the 32-byte digest.
    pub fn finalize(self) -> [u8; 32] {
        self.inner.finalize().into()
    }
}
