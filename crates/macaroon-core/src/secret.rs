//! Master secret injection.
//!
//! The core never owns a process-wide secret. Every operation that derives a
//! root key takes a [`SecretProvider`] supplied by the caller's key
//! management.

use zeroize::Zeroize;

/// Source of the master secret used for root key derivation.
///
/// Implementations decide where the secret lives (KMS, sealed file, HSM
/// handle). Rotation and storage are the implementor's concern.
pub trait SecretProvider {
    /// Current master secret bytes.
    fn master_secret(&self) -> &[u8];
}

impl<T: SecretProvider + ?Sized> SecretProvider for &T {
    fn master_secret(&self) -> &[u8] {
        (**self).master_secret()
    }
}

/// In-memory master secret, zeroized on drop.
#[derive(Clone)]
pub struct MasterSecret {
    bytes: Vec<u8>,
}

impl MasterSecret {
    /// Wrap secret bytes handed over by key management.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self { bytes: bytes.into() }
    }
}

impl SecretProvider for MasterSecret {
    fn master_secret(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for MasterSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MasterSecret({} bytes)", self.bytes.len())
    }
}

impl Drop for MasterSecret {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}
