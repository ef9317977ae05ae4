//! BIP340 Schnorr signatures and the BIP341 taproot key tweak.
//!
//! Keys are handled as raw 32-byte values here: secret scalars for
//! signing and x-only public keys for verification.

use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::elliptic_curve::PrimeField;
use k256::{FieldBytes, ProjectivePoint, Scalar};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::ec::private_key::PrivateKey;
use crate::ec::public_key::PublicKey;
use crate::hash::TaggedHasher;
use crate::PrimitivesError;

/// Tag of the BIP341 key tweak hash.
pub const TAP_TWEAK_TAG: &str = "TapTweak";

/// Sign a 32-byte message with a secret scalar, using fresh auxiliary
/// randomness.
pub fn sign(secret: &[u8; 32], msg: &[u8; 32]) -> Result<[u8; 64], PrimitivesError> {
    let signing_key = k256::schnorr::SigningKey::from_bytes(secret)
        .map_err(|e| PrimitivesError::InvalidPrivateKey(e.to_string()))?;
    let mut aux_rand = [0u8; 32];
    OsRng.fill_bytes(&mut aux_rand);
    let sig = signing_key
        .sign_raw(msg, &aux_rand)
        .map_err(|e| PrimitivesError::InvalidSignature(e.to_string()))?;
    Ok(sig.to_bytes())
}

/// Verify a 64-byte BIP340 signature against an x-only public key.
pub fn verify(x_only: &[u8; 32], msg: &[u8; 32], sig: &[u8; 64]) -> bool {
    let verifying_key = match k256::schnorr::VerifyingKey::from_bytes(x_only) {
        Ok(key) => key,
        Err(_) => return false,
    };
    let sig = match k256::schnorr::Signature::try_from(&sig[..]) {
        Ok(sig) => sig,
        Err(_) => return false,
    };
    verifying_key.verify_raw(msg, &sig).is_ok()
}

/// Compute the tweak scalar `t = H_TapTweak(x(P) || merkle_root)`.
fn tap_tweak(x_only: &[u8; 32], merkle_root: Option<&[u8; 32]>) -> Result<Scalar, PrimitivesError> {
    let mut hasher = TaggedHasher::new(TAP_TWEAK_TAG);
    hasher.update(x_only);
    if let Some(root) = merkle_root {
        hasher.update(root);
    }
    let digest = hasher.finalize();
    Option::<Scalar>::from(Scalar::from_repr(FieldBytes::from(digest)))
        .ok_or_else(|| PrimitivesError::Other("tap tweak exceeds curve order".to_string()))
}

/// Derive the taproot output key `Q = lift_x(P) + tG` as x-only bytes.
///
/// # Arguments
/// * `internal_key` - The internal key; only its x coordinate is used.
/// * `merkle_root` - Script tree root, or `None` for key-path-only outputs.
pub fn tweak_public_key(
    internal_key: &PublicKey,
    merkle_root: Option<&[u8; 32]>,
) -> Result<[u8; 32], PrimitivesError> {
    let x_only = internal_key.x_only();
    let mut even = [0u8; 33];
    even[0] = 0x02;
    even[1..].copy_from_slice(&x_only);
    let lifted = PublicKey::from_bytes(&even)?.to_projective_point();

    let tweak = tap_tweak(&x_only, merkle_root)?;
    let output = lifted + ProjectivePoint::GENERATOR * tweak;
    let encoded = output.to_affine().to_encoded_point(true);
    let bytes = encoded.as_bytes();
    if bytes.len() != 33 {
        return Err(PrimitivesError::PointNotOnCurve);
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes[1..]);
    Ok(out)
}

/// Tweak a secret scalar so it signs for the output key produced by
/// [`tweak_public_key`].
///
/// The secret is negated first when its public point has an odd y.
pub fn tweak_private_key(
    secret: &[u8; 32],
    merkle_root: Option<&[u8; 32]>,
) -> Result<[u8; 32], PrimitivesError> {
    let key = PrivateKey::from_bytes(secret)?;
    let pub_key = key.pub_key();
    let scalar = Option::<Scalar>::from(Scalar::from_repr(FieldBytes::from(*secret)))
        .ok_or_else(|| PrimitivesError::InvalidPrivateKey("scalar out of range".to_string()))?;
    let scalar = if pub_key.has_even_y() { scalar } else { -scalar };

    let tweaked = scalar + tap_tweak(&pub_key.x_only(), merkle_root)?;
    if tweaked == Scalar::ZERO {
        return Err(PrimitivesError::InvalidPrivateKey("tweaked key is zero".to_string()));
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&tweaked.to_repr());
    Ok(out)
}
