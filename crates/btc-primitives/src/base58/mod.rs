//! Base58 and Base58Check encoding.
//!
//! Used by WIF private keys and legacy (P2PKH / P2SH) addresses.

use crate::PrimitivesError;
use crate::hash::sha256d;

/// Encode bytes with the Bitcoin Base58 alphabet.
pub fn encode(data: &[u8]) -> String {
    bs58::encode(data).with_alphabet(bs58::Alphabet::BITCOIN).into_string()
}

/// Decode a Base58 string.
pub fn decode(s: &str) -> Result<Vec<u8>, PrimitivesError> {
    bs58::decode(s)
        .with_alphabet(bs58::Alphabet::BITCOIN)
        .into_vec()
        .map_err(|e| PrimitivesError::InvalidBase58(e.to_string()))
}

/// Encode `data` followed by the first 4 bytes of `sha256d(data)`.
pub fn check_encode(data: &[u8]) -> String {
    let checksum = sha256d(data);
    let mut payload = Vec::with_capacity(data.len() + 4);
    payload.extend_from_slice(data);
    payload.extend_from_slice(&checksum[..4]);
    encode(&payload)
}

/// Decode a Base58Check string and verify its 4-byte checksum.
///
/// # Returns
/// The payload without checksum, `ChecksumMismatch` if the checksum is
/// wrong, or `InvalidBase58` for malformed input.
pub fn check_decode(s: &str) -> Result<Vec<u8>, PrimitivesError> {
    let decoded = decode(s)?;
    if decoded.len() < 4 {
        return Err(PrimitivesError::InvalidBase58(
            "data too short for checksum".to_string(),
        ));
    }
    let (payload, checksum) = decoded.split_at(decoded.len() - 4);
    if checksum != &sha256d(payload)[..4] {
        return Err(PrimitivesError::ChecksumMismatch);
    }
    Ok(payload.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS_PAYLOAD: &str = "00010966776006953d5567439e5e39f86a0d273bee";
    const ADDRESS: &str = "16UwLL9Risc3QfPqBUvKofHmBQ7wMtjvM";

    #[test]
    fn test_leading_zero_bytes_become_ones() {
        assert_eq!(encode(&[0, 0, 1]), "112");
        assert_eq!(decode("112").unwrap(), vec![0, 0, 1]);
    }

    #[test]
    fn test_check_encode_address_payload() {
        let payload = hex::decode(ADDRESS_PAYLOAD).unwrap();
        assert_eq!(check_encode(&payload), ADDRESS);
        assert_eq!(check_decode(ADDRESS).unwrap(), payload);
    }

    #[test]
    fn test_check_decode_rejects_bad_checksum() {
        // Last character altered.
        let result = check_decode("16UwLL9Risc3QfPqBUvKofHmBQ7wMtjvN");
        assert!(matches!(result, Err(PrimitivesError::ChecksumMismatch)));
    }

    #[test]
    fn test_decode_rejects_invalid_characters() {
        assert!(decode("0OIl").is_err());
        assert!(check_decode("1").is_err());
    }
}
