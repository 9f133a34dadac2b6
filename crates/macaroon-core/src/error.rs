//! Error types for macaroon operations.
//!
//! [`MacaroonError`] covers minting, attenuation and verification.
//! [`WireError`] covers the serialization adapter. The variants are for logs
//! and debugging; untrusted principals only ever see
//! [`MacaroonError::public_message`].

use macaroon_crypto::CryptoError;
use thiserror::Error;

/// Errors from minting, attenuating or verifying a macaroon.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MacaroonError {
    /// Attenuation or verification beyond the caveat ceiling
    #[error("caveat limit exceeded: at most {limit} caveats allowed")]
    CaveatLimitExceeded {
        /// Limit that was hit
        limit: usize,
    },

    /// Minting or attenuation would produce a macaroon the wire decoders
    /// refuse
    #[error("macaroon too large: {size} encoded bytes (max {max})")]
    EncodedSizeExceeded {
        /// Encoded size the operation would have produced
        size: usize,
        /// Maximum encoded size
        max: usize,
    },

    /// Recomputed chain does not match the stored signature
    #[error("invalid macaroon signature")]
    InvalidSignature,

    /// A third-party caveat could not be opened, or its sealed key does not
    /// match the caveat
    #[error("decryption failure: {reason}")]
    DecryptionFailure {
        /// Reason for decryption failure
        reason: String,
    },

    /// Root key derivation refused its inputs
    #[error("key derivation failure: {reason}")]
    KeyDerivationFailure {
        /// Why derivation failed
        reason: String,
    },

    /// Discharge key material of the wrong size
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected key length
        expected: usize,
        /// Actual key length
        actual: usize,
    },

    /// The policy evaluator rejected a first-party caveat
    #[error("caveat {index} not satisfied: {key}")]
    CaveatUnsatisfied {
        /// Position of the caveat in the chain
        index: usize,
        /// Caveat key
        key: String,
    },

    /// The discharge verifier rejected a third-party caveat
    #[error("discharge rejected for caveat {index} at {location}")]
    DischargeRejected {
        /// Position of the caveat in the chain
        index: usize,
        /// Location of the discharging authority
        location: String,
    },
}

impl MacaroonError {
    /// Message safe to show an untrusted principal.
    ///
    /// Every failure collapses to the same string so the distinct kinds
    /// cannot be used as an oracle.
    pub const PUBLIC_MESSAGE: &'static str = "invalid credential";

    /// Returns true if the caller can reasonably recover.
    ///
    /// Only a caveat limit or size limit hit is recoverable (drop or shorten
    /// the caveat, or reject the macaroon). Everything else means the
    /// credential is rejected or key management is misconfigured.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::CaveatLimitExceeded { .. } | Self::EncodedSizeExceeded { .. })
    }

    /// Returns true if this error indicates a configuration or programming
    /// error rather than a bad credential.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::KeyDerivationFailure { .. } | Self::InvalidKeyLength { .. })
    }

    /// Message to surface outside the trust boundary.
    pub fn public_message(&self) -> &'static str {
        Self::PUBLIC_MESSAGE
    }
}

impl From<CryptoError> for MacaroonError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::KeyDerivation { reason } => Self::KeyDerivationFailure { reason },
            CryptoError::DecryptionFailed { reason } => Self::DecryptionFailure { reason },
            CryptoError::InvalidKeyLength { expected, actual } => {
                Self::InvalidKeyLength { expected, actual }
            },
        }
    }
}

/// Errors from the serialization adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// Input exceeds the accepted encoded size
    #[error("encoded macaroon too large: {size} bytes (max {max})")]
    TooLarge {
        /// Input size in bytes
        size: usize,
        /// Maximum accepted size
        max: usize,
    },

    /// Serialization failed
    #[error("encode failed: {0}")]
    Encode(String),

    /// Deserialization failed (malformed input, wrong field types or lengths)
    #[error("decode failed: {0}")]
    Decode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_limit_hits_are_recoverable() {
        assert!(MacaroonError::CaveatLimitExceeded { limit: 10 }.is_recoverable());
        let too_big = MacaroonError::EncodedSizeExceeded { size: 70_000, max: 65_536 };
        assert!(too_big.is_recoverable());
        assert!(!MacaroonError::InvalidSignature.is_recoverable());
        assert!(!MacaroonError::DecryptionFailure { reason: "tag".to_string() }.is_recoverable());
        assert!(
            !MacaroonError::KeyDerivationFailure { reason: "empty".to_string() }.is_recoverable()
        );
    }

    #[test]
    fn public_message_hides_kind() {
        let errors = [
            MacaroonError::InvalidSignature,
            MacaroonError::DecryptionFailure { reason: "authentication failed".to_string() },
            MacaroonError::CaveatUnsatisfied { index: 0, key: "expires".to_string() },
        ];

        for err in &errors {
            assert_eq!(err.public_message(), "invalid credential");
        }
    }

    #[test]
    fn crypto_errors_map_to_kinds() {
        let err: MacaroonError =
            CryptoError::DecryptionFailed { reason: "authentication failed".to_string() }.into();
        assert!(matches!(err, MacaroonError::DecryptionFailure { .. }));

        let err: MacaroonError = CryptoError::KeyDerivation { reason: "empty".to_string() }.into();
        assert!(err.is_configuration());
    }

    #[test]
    fn error_display() {
        let err = MacaroonError::CaveatLimitExceeded { limit: 10 };
        assert_eq!(err.to_string(), "caveat limit exceeded: at most 10 caveats allowed");

        let err = WireError::TooLarge { size: 70_000, max: 65_536 };
        assert_eq!(err.to_string(), "encoded macaroon too large: 70000 bytes (max 65536)");
    }
}
