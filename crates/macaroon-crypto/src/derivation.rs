//! Root key derivation using HMAC-SHA256

use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::error::CryptoError;

type HmacSha256 = Hmac<Sha256>;

/// Size of root keys, signatures and discharge keys (32 bytes)
pub const KEY_SIZE: usize = 32;

/// Per-macaroon root key.
///
/// Never stored: it is re-derived from the master secret and the macaroon
/// identifier whenever the chain has to be recomputed.
#[derive(Clone)]
pub struct RootKey {
    key: [u8; KEY_SIZE],
}

impl RootKey {
    /// 32-byte key that seeds the signature chain.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }
}

impl std::fmt::Debug for RootKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RootKey(..)")
    }
}

impl Drop for RootKey {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

/// Derive the root key for a macaroon identifier.
///
/// `key = HMAC-SHA256(master_secret, identifier)`
///
/// # Security
///
/// - Deterministic: the same identifier always re-derives the same key, so
///   per-macaroon keys never need to be persisted
/// - Different identifiers produce unrelated keys under the same secret
///
/// # Errors
///
/// - `KeyDerivation`: the master secret is empty
pub fn derive_root_key(master_secret: &[u8], identifier: &[u8]) -> Result<RootKey, CryptoError> {
    if master_secret.is_empty() {
        return Err(CryptoError::KeyDerivation { reason: "master secret is empty".to_string() });
    }

    let Ok(mut mac) = HmacSha256::new_from_slice(master_secret) else {
        unreachable!("HMAC-SHA256 accepts any key size");
    };
    mac.update(identifier);

    let mut key = [0u8; KEY_SIZE];
    key.copy_from_slice(&mac.finalize().into_bytes());
    Ok(RootKey { key })
}
