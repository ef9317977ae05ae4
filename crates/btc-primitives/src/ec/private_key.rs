//! secp256k1 private key.
//!
//! Wraps a k256 signing key and adds WIF encoding, ECDSA signing and
//! BIP340 Schnorr signing with the BIP341 key-path tweak.

use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;

use crate::base58;
use crate::ec::public_key::PublicKey;
use crate::ec::signature::Signature;
use crate::network::Network;
use crate::schnorr;
use crate::PrimitivesError;

/// Length of a serialized private key in bytes.
const PRIVATE_KEY_BYTES_LEN: usize = 32;

/// Compression flag byte appended to WIF for compressed public keys.
const COMPRESS_MAGIC: u8 = 0x01;

/// A secp256k1 private key.
///
/// Carries the network and public-key compression flag it was imported
/// with so that WIF export and address derivation round-trip.
#[derive(Clone)]
pub struct PrivateKey {
    inner: SigningKey,
    compressed: bool,
    network: Network,
}

impl PrivateKey {
    /// Generate a new random mainnet key with a compressed public key.
    pub fn new() -> Self {
        PrivateKey {
            inner: SigningKey::random(&mut OsRng),
            compressed: true,
            network: Network::Mainnet,
        }
    }

    /// Create a key from a raw 32-byte scalar.
    ///
    /// # Returns
    /// `Ok(PrivateKey)` for a scalar in `[1, n)`, or `InvalidPrivateKey`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() != PRIVATE_KEY_BYTES_LEN {
            return Err(PrimitivesError::InvalidKeyLength {
                expected: PRIVATE_KEY_BYTES_LEN,
                got: bytes.len(),
            });
        }
        let inner = SigningKey::from_slice(bytes)
            .map_err(|e| PrimitivesError::InvalidPrivateKey(e.to_string()))?;
        Ok(PrivateKey {
            inner,
            compressed: true,
            network: Network::Mainnet,
        })
    }

    /// Create a key from a 64-character hex string.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        let bytes = hex::decode(hex_str)?;
        Self::from_bytes(&bytes)
    }

    /// Decode a WIF string (compressed or uncompressed, any known network).
    ///
    /// # Returns
    /// `Ok(PrivateKey)` on success; `ChecksumMismatch` for a bad checksum
    /// and `InvalidWif` for an unknown prefix, bad length or bad flag.
    pub fn from_wif(wif: &str) -> Result<Self, PrimitivesError> {
        let payload = base58::check_decode(wif)?;
        let compressed = match payload.len() {
            34 => {
                if payload[33] != COMPRESS_MAGIC {
                    return Err(PrimitivesError::InvalidWif(
                        "invalid compression flag".to_string(),
                    ));
                }
                true
            }
            33 => false,
            n => {
                return Err(PrimitivesError::InvalidWif(format!("invalid length {}", n)));
            }
        };
        let network = Network::from_wif_prefix(payload[0]).ok_or_else(|| {
            PrimitivesError::InvalidWif(format!("unknown prefix 0x{:02x}", payload[0]))
        })?;

        let mut key = Self::from_bytes(&payload[1..1 + PRIVATE_KEY_BYTES_LEN])?;
        key.compressed = compressed;
        key.network = network;
        Ok(key)
    }

    /// Encode as WIF for the key's own network.
    pub fn to_wif(&self) -> String {
        let mut payload = Vec::with_capacity(1 + PRIVATE_KEY_BYTES_LEN + 1);
        payload.push(self.network.wif_prefix());
        payload.extend_from_slice(&self.to_bytes());
        if self.compressed {
            payload.push(COMPRESS_MAGIC);
        }
        base58::check_encode(&payload)
    }

    /// Return a copy bound to a different network.
    pub fn with_network(mut self, network: Network) -> Self {
        self.network = network;
        self
    }

    /// The network this key was imported for.
    pub fn network(&self) -> Network {
        self.network
    }

    /// The 32-byte big-endian scalar.
    pub fn to_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&self.inner.to_bytes());
        out
    }

    /// Hex of the scalar.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// The matching public key, honouring the compression flag.
    pub fn pub_key(&self) -> PublicKey {
        PublicKey::from_verifying_key(self.inner.verifying_key().clone(), self.compressed)
    }

    /// ECDSA-sign a 32-byte digest with RFC6979 nonces.
    pub fn sign(&self, digest: &[u8]) -> Result<Signature, PrimitivesError> {
        Signature::sign(digest, self)
    }

    /// BIP340-sign a 32-byte message with the untweaked key.
    pub fn sign_schnorr(&self, msg: &[u8; 32]) -> Result<[u8; 64], PrimitivesError> {
        schnorr::sign(&self.to_bytes(), msg)
    }

    /// BIP340-sign with the BIP341 key-path tweak applied (no script tree).
    pub fn sign_schnorr_tweaked(&self, msg: &[u8; 32]) -> Result<[u8; 64], PrimitivesError> {
        let tweaked = schnorr::tweak_private_key(&self.to_bytes(), None)?;
        schnorr::sign(&tweaked, msg)
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.inner
    }
}

impl Default for PrivateKey {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("network", &self.network)
            .field("compressed", &self.compressed)
            .finish_non_exhaustive()
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        let mut bytes = self.inner.to_bytes();
        bytes.zeroize();
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
            && self.compressed == other.compressed
            && self.network == other.network
    }
}

impl Eq for PrivateKey {}
