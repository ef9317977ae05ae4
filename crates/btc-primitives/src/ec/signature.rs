//! ECDSA signature with DER serialization and RFC6979 deterministic nonces.
//!
//! Signatures are always produced and encoded with a low S value, and a
//! high-S signature is normalised before verification so that any valid
//! DER signature found on the wire can be checked.

use k256::ecdsa;
use k256::ecdsa::signature::hazmat::PrehashVerifier;

use crate::ec::private_key::PrivateKey;
use crate::ec::public_key::PublicKey;
use crate::PrimitivesError;

/// The secp256k1 curve order N.
const CURVE_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFE, 0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36,
    0x41, 0x41,
];

/// N/2, the largest S value considered canonical.
const HALF_ORDER: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B,
    0x20, 0xA0,
];

/// An ECDSA signature with big-endian R and S components.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    r: [u8; 32],
    s: [u8; 32],
}

impl Signature {
    /// Create a signature from raw R and S values.
    pub fn new(r: [u8; 32], s: [u8; 32]) -> Self {
        Signature { r, s }
    }

    /// The R component.
    pub fn r(&self) -> &[u8; 32] {
        &self.r
    }

    /// The S component.
    pub fn s(&self) -> &[u8; 32] {
        &self.s
    }

    /// Parse a DER-encoded ECDSA signature.
    ///
    /// Expected format: `0x30 <len> 0x02 <r_len> <r> 0x02 <s_len> <s>`.
    /// Trailing bytes after the encoded sequence are rejected.
    ///
    /// # Returns
    /// `Ok(Signature)` on success, or `InvalidSignature` describing the defect.
    pub fn from_der(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        let malformed = |why: &str| PrimitivesError::InvalidSignature(format!("malformed signature: {}", why));

        if bytes.len() < 8 {
            return Err(malformed("too short"));
        }
        if bytes[0] != 0x30 {
            return Err(malformed("no header magic"));
        }
        let seq_len = bytes[1] as usize;
        if seq_len + 2 != bytes.len() {
            return Err(malformed("bad length"));
        }

        let (r_bytes, rest) = read_der_int(&bytes[2..]).ok_or_else(|| malformed("bogus R"))?;
        let (s_bytes, rest) = read_der_int(rest).ok_or_else(|| malformed("bogus S"))?;
        if !rest.is_empty() {
            return Err(malformed("trailing bytes"));
        }

        let r = to_32_bytes(r_bytes)?;
        let s = to_32_bytes(s_bytes)?;
        if is_zero(&r) || is_zero(&s) {
            return Err(PrimitivesError::InvalidSignature("signature R or S is zero".to_string()));
        }
        if r >= CURVE_ORDER || s >= CURVE_ORDER {
            return Err(PrimitivesError::InvalidSignature("signature R or S is >= curve.N".to_string()));
        }
        Ok(Signature { r, s })
    }

    /// Serialize in DER format with low-S normalization.
    pub fn to_der(&self) -> Vec<u8> {
        let s = low_s(&self.s);
        let rb = canonicalize_int(&self.r);
        let sb = canonicalize_int(&s);

        let total_len = 6 + rb.len() + sb.len();
        let mut out = Vec::with_capacity(total_len);
        out.push(0x30);
        out.push((total_len - 2) as u8);
        out.push(0x02);
        out.push(rb.len() as u8);
        out.extend_from_slice(&rb);
        out.push(0x02);
        out.push(sb.len() as u8);
        out.extend_from_slice(&sb);
        out
    }

    /// Sign a 32-byte digest using RFC6979 deterministic nonces.
    ///
    /// # Returns
    /// A low-S signature, or `InvalidSignature` if the digest is not 32 bytes.
    pub fn sign(digest: &[u8], priv_key: &PrivateKey) -> Result<Self, PrimitivesError> {
        if digest.len() != 32 {
            return Err(PrimitivesError::InvalidSignature(format!(
                "digest must be 32 bytes, got {}",
                digest.len()
            )));
        }
        let (k256_sig, _recovery_id) = priv_key
            .signing_key()
            .sign_prehash_recoverable(digest)
            .map_err(|e| PrimitivesError::InvalidSignature(e.to_string()))?;

        let (r_bytes, s_bytes) = k256_sig.split_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&r_bytes);
        s.copy_from_slice(&s_bytes);
        Ok(Signature { r, s: low_s(&s) })
    }

    /// Verify this signature against a 32-byte digest and public key.
    pub fn verify(&self, digest: &[u8], pub_key: &PublicKey) -> bool {
        if digest.len() != 32 {
            return false;
        }
        let k256_sig = match ecdsa::Signature::from_scalars(
            k256::FieldBytes::from(self.r),
            k256::FieldBytes::from(low_s(&self.s)),
        ) {
            Ok(sig) => sig,
            Err(_) => return false,
        };
        pub_key.verifying_key().verify_prehash(digest, &k256_sig).is_ok()
    }

    /// True if S is already in the lower half of the curve order.
    pub fn is_low_s(&self) -> bool {
        self.s <= HALF_ORDER
    }
}

/// Read one DER INTEGER, returning its content bytes and the remainder.
fn read_der_int(data: &[u8]) -> Option<(&[u8], &[u8])> {
    if data.len() < 2 || data[0] != 0x02 {
        return None;
    }
    let len = data[1] as usize;
    if len == 0 || data.len() < 2 + len {
        return None;
    }
    Some((&data[2..2 + len], &data[2 + len..]))
}

/// Strip leading zeros from a big-endian integer and add a 0x00 pad byte
/// when the high bit is set.
fn canonicalize_int(val: &[u8; 32]) -> Vec<u8> {
    let start = val.iter().position(|b| *b != 0).unwrap_or(31);
    let trimmed = &val[start..];
    if trimmed[0] & 0x80 != 0 {
        let mut out = Vec::with_capacity(trimmed.len() + 1);
        out.push(0x00);
        out.extend_from_slice(trimmed);
        out
    } else {
        trimmed.to_vec()
    }
}

/// Left-pad a big-endian integer to 32 bytes.
fn to_32_bytes(bytes: &[u8]) -> Result<[u8; 32], PrimitivesError> {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    let trimmed = &bytes[start..];
    if trimmed.len() > 32 {
        return Err(PrimitivesError::InvalidSignature(
            "integer value too large for 32 bytes".to_string(),
        ));
    }
    let mut out = [0u8; 32];
    out[32 - trimmed.len()..].copy_from_slice(trimmed);
    Ok(out)
}

fn is_zero(val: &[u8; 32]) -> bool {
    val.iter().all(|&b| b == 0)
}

/// Map S to N - S when S > N/2.
fn low_s(s: &[u8; 32]) -> [u8; 32] {
    if *s > HALF_ORDER {
        subtract_from_order(s)
    } else {
        *s
    }
}

/// Compute N - val.
fn subtract_from_order(val: &[u8; 32]) -> [u8; 32] {
    let mut result = [0u8; 32];
    let mut borrow: i32 = 0;
    for i in (0..32).rev() {
        let mut diff = CURVE_ORDER[i] as i32 - val[i] as i32 - borrow;
        if diff < 0 {
            diff += 256;
            borrow = 1;
        } else {
            borrow = 0;
        }
        result[i] = diff as u8;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const DER_SIG: &str = "3045022100ea1508225a6d37c0545d22acaee88d29d1675696953f93d657a419613bcee9b802207b8d80ca8176586878f51e001cb9e92f7640b8c9dc530fabf9087142c752de89";

    #[test]
    fn test_der_roundtrip_preserves_bytes() {
        let bytes = hex::decode(DER_SIG).unwrap();
        let sig = Signature::from_der(&bytes).unwrap();
        assert!(sig.is_low_s());
        assert_eq!(hex::encode(sig.to_der()), DER_SIG);
    }

    #[test]
    fn test_der_rejects_malformed() {
        let bytes = hex::decode(DER_SIG).unwrap();
        // Wrong header.
        let mut bad = bytes.clone();
        bad[0] = 0x31;
        assert!(Signature::from_der(&bad).is_err());
        // Trailing garbage.
        let mut bad = bytes.clone();
        bad.push(0x01);
        assert!(Signature::from_der(&bad).is_err());
        // Truncated.
        assert!(Signature::from_der(&bytes[..20]).is_err());
    }

    #[test]
    fn test_high_s_is_normalised_on_encode() {
        let mut s = HALF_ORDER;
        s[31] += 1;
        let sig = Signature::new([0x11; 32], s);
        assert!(!sig.is_low_s());
        let reparsed = Signature::from_der(&sig.to_der()).unwrap();
        assert!(reparsed.is_low_s());
        assert_eq!(reparsed.s(), &subtract_from_order(&s));
    }

    #[test]
    fn test_sign_and_verify() {
        let key = PrivateKey::from_bytes(&[0x42; 32]).unwrap();
        let digest = crate::hash::sha256(b"digest");
        let sig = key.sign(&digest).unwrap();
        assert!(sig.is_low_s());
        assert!(sig.verify(&digest, &key.pub_key()));

        let other = crate::hash::sha256(b"other");
        assert!(!sig.verify(&other, &key.pub_key()));
        assert!(Signature::sign(&digest[..31], &key).is_err());
    }

    #[test]
    fn test_verify_accepts_high_s_form() {
        let key = PrivateKey::from_bytes(&[0x07; 32]).unwrap();
        let digest = crate::hash::sha256(b"malleable");
        let sig = key.sign(&digest).unwrap();
        let high = Signature::new(*sig.r(), subtract_from_order(sig.s()));
        assert!(!high.is_low_s());
        assert!(high.verify(&digest, &key.pub_key()));
    }
}
