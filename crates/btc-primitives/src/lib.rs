/// Cryptographic primitives, hashing and wire-encoding utilities.
///
/// This crate provides the foundational building blocks used by the
/// script and transaction crates:
/// - Hash functions (SHA-256, SHA-256d, RIPEMD-160, Hash160, BIP340 tagged hash)
/// - Chain hash type for transaction identification
/// - Compact-size integers and the wire reader / writer
/// - Base58Check encoding
/// - secp256k1 keys, DER ECDSA signatures and BIP340 Schnorr signatures
/// - Network parameters for key and address encodings

pub mod hash;
pub mod chainhash;
pub mod util;
pub mod base58;
pub mod ec;
pub mod schnorr;
pub mod network;

mod error;
pub use error::PrimitivesError;
pub use network::Network;
