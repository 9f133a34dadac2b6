//! Error types for macaroon cryptographic operations

use thiserror::Error;

/// Errors from key derivation and caveat sealing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Inputs to root key derivation were unusable
    #[error("key derivation failed: {reason}")]
    KeyDerivation {
        /// Why derivation was refused
        reason: String,
    },

    /// Sealed data could not be opened (bad tag, wrong key, malformed input)
    #[error("decryption failed: {reason}")]
    DecryptionFailed {
        /// Reason for decryption failure
        reason: String,
    },

    /// Invalid key material length
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected key length
        expected: usize,
        /// Actual key length
        actual: usize,
    },
}

impl CryptoError {
    /// Returns true if this error points at caller misconfiguration rather
    /// than at untrusted input.
    ///
    /// Decryption failures come from data a holder presented and must be
    /// treated as a rejected credential. The others indicate a bug or a
    /// broken key-management setup.
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::KeyDerivation { .. } | Self::InvalidKeyLength { .. } => true,
            Self::DecryptionFailed { .. } => false,
        }
    }
}
