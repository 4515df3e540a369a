//! Ed25519 verification of interaction webhooks.
//!
//! The platform signs `timestamp || raw_body` with the application's Ed25519
//! key. The body must be the byte-exact request body: any re-encoding (JSON
//! round-trip, whitespace normalisation, charset conversion) breaks the
//! signature.
//!
//! Everything here is pure and total. Malformed key or signature bytes yield
//! `false`, never a panic.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};

use crate::constants::{PUBLIC_KEY_LEN, SIGNATURE_LEN};

/// Verify an Ed25519 `signature` over `message` with a raw 32-byte `public_key`.
///
/// Returns `false` for keys that are not 32 bytes or not a valid curve point,
/// and for signatures that are not 64 bytes.
pub fn verify(signature: &[u8], message: &[u8], public_key: &[u8]) -> bool {
    let Ok(key_bytes) = <[u8; PUBLIC_KEY_LEN]>::try_from(public_key) else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&key_bytes) else {
        return false;
    };
    let Ok(signature) = <[u8; SIGNATURE_LEN]>::try_from(signature) else {
        return false;
    };
    verifying_key.verify(message, &Signature::from_bytes(&signature)).is_ok()
}

/// Build the signed message: the timestamp header's bytes followed by the raw body.
pub fn signed_message(timestamp: &str, body: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(timestamp.len() + body.len());
    message.extend_from_slice(timestamp.as_bytes());
    message.extend_from_slice(body);
    message
}

/// Decode a configured hex public key into raw key bytes.
///
/// Returns `None` unless the input is hex for exactly 32 bytes that form a
/// valid Ed25519 point, so a bad key is caught as configuration, not blamed
/// on the request.
pub fn decode_public_key(public_key_hex: &str) -> Option<[u8; PUBLIC_KEY_LEN]> {
    let bytes = hex::decode(public_key_hex.trim()).ok()?;
    let key_bytes = <[u8; PUBLIC_KEY_LEN]>::try_from(bytes.as_slice()).ok()?;
    VerifyingKey::from_bytes(&key_bytes).ok()?;
    Some(key_bytes)
}
