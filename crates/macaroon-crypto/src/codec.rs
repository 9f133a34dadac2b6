//! Caveat sealing using `XChaCha20-Poly1305`
//!
//! All functions are pure - the nonce must be provided by the caller, who
//! MUST draw it fresh from a cryptographically secure RNG for every call.
//!
//! Sealed layout: `[nonce:24][ciphertext][tag:16]`

use chacha20poly1305::{
    XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit},
};
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::{derivation::KEY_SIZE, error::CryptoError};

/// Size of the `XChaCha20` nonce prepended to every sealed value (24 bytes)
pub const NONCE_SIZE: usize = 24;

/// Poly1305 tag size (16 bytes)
pub const TAG_SIZE: usize = 16;

/// Label used to expand caller keys into AEAD keys
const SEAL_KEY_LABEL: &[u8] = b"macaroonCaveatSealV1";

/// Seal `plaintext` under `key`.
///
/// Returns `nonce ‖ ciphertext ‖ tag`.
///
/// # Security
///
/// - The AEAD key is HKDF-expanded from `key`, never `key` itself
/// - Reusing a nonce under the same key breaks confidentiality; callers pass
///   fresh random bytes every time
pub fn seal(key: &[u8; KEY_SIZE], plaintext: &[u8], nonce: [u8; NONCE_SIZE]) -> Vec<u8> {
    let mut sealing_key = expand_key(key);
    let cipher = XChaCha20Poly1305::new((&sealing_key).into());
    sealing_key.zeroize();

    let Ok(ciphertext) = cipher.encrypt(XNonce::from_slice(&nonce), plaintext) else {
        unreachable!("XChaCha20-Poly1305 encryption cannot fail with valid inputs");
    };

    let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    sealed
}

/// Open a value produced by [`seal`].
///
/// # Errors
///
/// - `DecryptionFailed`: input too short to hold a nonce and tag, or the
///   authentication tag does not verify (wrong key, tampered nonce or
///   ciphertext)
pub fn open(key: &[u8; KEY_SIZE], sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if sealed.len() < NONCE_SIZE + TAG_SIZE {
        return Err(CryptoError::DecryptionFailed {
            reason: format!(
                "sealed value is {} bytes, minimum is {}",
                sealed.len(),
                NONCE_SIZE + TAG_SIZE
            ),
        });
    }

    let (nonce, ciphertext) = sealed.split_at(NONCE_SIZE);

    let mut sealing_key = expand_key(key);
    let cipher = XChaCha20Poly1305::new((&sealing_key).into());
    sealing_key.zeroize();

    cipher.decrypt(XNonce::from_slice(nonce), ciphertext).map_err(|_| {
        CryptoError::DecryptionFailed { reason: "authentication failed".to_string() }
    })
}

/// Expand a caller key into a dedicated AEAD key.
fn expand_key(key: &[u8; KEY_SIZE]) -> [u8; KEY_SIZE] {
    let hkdf = Hkdf::<Sha256>::new(None, key);

    let mut out = [0u8; KEY_SIZE];
    let Ok(()) = hkdf.expand(SEAL_KEY_LABEL, &mut out) else {
        unreachable!("32 bytes is a valid HKDF-SHA256 output length");
    };
    out
}
