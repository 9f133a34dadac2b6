//! HMAC signature chain
//!
//! # Security Properties
//!
//! - Order Sensitivity: each step is keyed by the previous output, so the
//!   fold is not commutative
//! - Domain Separation: every input starts with a [`ChainTag`] byte and the
//!   fields are length-framed
//! - Constant-Time Comparison: [`Signature`] equality never short-circuits

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{derivation::RootKey, framing::write_fields};

type HmacSha256 = Hmac<Sha256>;

/// Size of a chain signature (32 bytes)
pub const SIGNATURE_SIZE: usize = 32;

/// Tag byte that starts every chain input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ChainTag {
    /// Binds the macaroon location into the first step
    Location = 0x00,
    /// First-party caveat: `key`, `constraint`
    FirstParty = 0x01,
    /// Third-party caveat: `verification_id`, `location`, `key`,
    /// `encrypted_constraint`
    ThirdParty = 0x02,
}

/// A 32-byte chain output.
///
/// Both the final tag stored in a macaroon and every intermediate value of
/// the fold are `Signature`s. Intermediate values also act as sealing keys
/// for third-party verification ids.
#[derive(Clone)]
pub struct Signature {
    bytes: [u8; SIGNATURE_SIZE],
}

impl Signature {
    /// Wrap raw signature bytes.
    pub const fn from_bytes(bytes: [u8; SIGNATURE_SIZE]) -> Self {
        Self { bytes }
    }

    /// Raw signature bytes.
    pub const fn as_bytes(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.bytes
    }

    /// Constant-time equality check.
    pub fn constant_time_eq(&self, other: &Self) -> bool {
        constant_time_eq(&self.bytes, &other.bytes)
    }
}

/// Compare two byte strings without short-circuiting on the first mismatch.
///
/// Lengths are treated as public: unequal lengths return false at once.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.constant_time_eq(other)
    }
}

impl Eq for Signature {}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({:02x}{:02x}..)", self.bytes[0], self.bytes[1])
    }
}

/// First chain step: bind the macaroon location to its root key.
///
/// `signature₀ = HMAC(root, Location ‖ frame(location))`
pub fn bind_location(root: &RootKey, location: &str) -> Signature {
    step(root.as_bytes(), ChainTag::Location, &[location.as_bytes()])
}

/// Extend the chain by one caveat.
///
/// `signatureₙ₊₁ = HMAC(signatureₙ, tag ‖ frame(fields))`
pub fn extend(signature: &Signature, tag: ChainTag, fields: &[&[u8]]) -> Signature {
    step(signature.as_bytes(), tag, fields)
}

fn step(key: &[u8; SIGNATURE_SIZE], tag: ChainTag, fields: &[&[u8]]) -> Signature {
    let mut input = vec![tag as u8];
    write_fields(&mut input, fields);

    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        unreachable!("HMAC-SHA256 accepts any key size");
    };
    mac.update(&input);

    let mut bytes = [0u8; SIGNATURE_SIZE];
    bytes.copy_from_slice(&mac.finalize().into_bytes());
    Signature { bytes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derivation::derive_root_key;

    fn test_root() -> RootKey {
        derive_root_key(b"test-master-secret", b"acct-42").unwrap()
    }

    #[test]
    fn known_answer_chain() {
        let sig0 = bind_location(&test_root(), "issuer.example");
        assert_eq!(
            hex::encode(sig0.as_bytes()),
            "e58623aa336474eae5b3a2593ffce8e1e735f1fa67cfe802e6808e36f637e850"
        );

        let sig1 = extend(&sig0, ChainTag::FirstParty, &[b"expires", b"2030-01-01"]);
        assert_eq!(
            hex::encode(sig1.as_bytes()),
            "eedc3b3bf5bec143e6a3c68d5056004c56d3055415655fba394bc9357388c9dd"
        );
    }

    #[test]
    fn location_is_bound() {
        let root = test_root();
        assert_ne!(bind_location(&root, "issuer.example"), bind_location(&root, "other.example"));
    }

    #[test]
    fn chain_is_order_sensitive() {
        let sig0 = bind_location(&test_root(), "loc");

        let a_then_b = extend(
            &extend(&sig0, ChainTag::FirstParty, &[b"user", b"alice"]),
            ChainTag::FirstParty,
            &[b"op", b"read"],
        );
        let b_then_a = extend(
            &extend(&sig0, ChainTag::FirstParty, &[b"op", b"read"]),
            ChainTag::FirstParty,
            &[b"user", b"alice"],
        );

        assert_ne!(a_then_b, b_then_a);
    }

    #[test]
    fn field_split_is_unambiguous() {
        let sig0 = bind_location(&test_root(), "loc");

        let left = extend(&sig0, ChainTag::FirstParty, &[b"ab", b"c"]);
        let right = extend(&sig0, ChainTag::FirstParty, &[b"a", b"bc"]);

        assert_ne!(left, right);
    }

    #[test]
    fn tag_separates_caveat_kinds() {
        let sig0 = bind_location(&test_root(), "loc");

        let first = extend(&sig0, ChainTag::FirstParty, &[b"k", b"v"]);
        let third = extend(&sig0, ChainTag::ThirdParty, &[b"k", b"v"]);

        assert_ne!(first, third);
    }

    #[test]
    fn constant_time_eq_detects_single_bit() {
        let a = Signature::from_bytes([0x11; SIGNATURE_SIZE]);
        let mut flipped = [0x11; SIGNATURE_SIZE];
        flipped[SIGNATURE_SIZE - 1] ^= 0x01;
        let b = Signature::from_bytes(flipped);

        assert!(a.constant_time_eq(&a.clone()));
        assert!(!a.constant_time_eq(&b));
    }

    #[test]
    fn byte_comparison_checks_length_and_content() {
        assert!(constant_time_eq(b"", b""));
        assert!(constant_time_eq(b"discharge", b"discharge"));
        assert!(!constant_time_eq(b"discharge", b"dischargf"));
        assert!(!constant_time_eq(b"discharge", b"discharg"));
    }
}
