//! Third-party discharge keys and the discharge verification hook.
//!
//! When a third-party caveat is appended, a 32-byte discharge key is shared
//! out of band with the authority at the caveat's location. The key is sealed
//! into the macaroon twice: once under the running signature (the
//! verification id) and once as the key protecting the constraint.
//!
//! Opening both seals only proves the verifier recomputed the chain
//! correctly. Proof that the authority approved the condition has to come
//! from a discharge credential, which is what [`DischargeVerifier`] is for.

use macaroon_crypto::{KEY_SIZE, constant_time_eq};
use zeroize::Zeroize;

use crate::{env::Environment, error::MacaroonError};

/// Key shared with a third-party authority.
#[derive(Clone)]
pub struct DischargeKey {
    bytes: [u8; KEY_SIZE],
}

impl DischargeKey {
    /// Draw a fresh key from the environment's RNG.
    pub fn generate<E: Environment>(env: &E) -> Self {
        Self { bytes: env.random_array() }
    }

    /// Wrap caller-supplied key bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl TryFrom<&[u8]> for DischargeKey {
    type Error = MacaroonError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| {
            MacaroonError::InvalidKeyLength { expected: KEY_SIZE, actual: bytes.len() }
        })?;
        Ok(Self { bytes })
    }
}

impl PartialEq for DischargeKey {
    fn eq(&self, other: &Self) -> bool {
        constant_time_eq(&self.bytes, &other.bytes)
    }
}

impl Eq for DischargeKey {}

impl std::fmt::Debug for DischargeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DischargeKey(..)")
    }
}

impl Drop for DischargeKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

/// A third-party caveat after both seals opened.
#[derive(Debug)]
pub struct DischargeRequest<'a> {
    /// Position of the caveat in the chain
    pub index: usize,
    /// Location of the discharging authority
    pub location: &'a str,
    /// Verification id as stored in the macaroon
    pub verification_id: &'a [u8],
    /// Caveat key
    pub key: &'a str,
    /// Decrypted constraint
    pub constraint: &'a str,
    /// Recovered discharge key
    pub discharge_key: &'a DischargeKey,
}

/// Decides whether a third-party caveat has been discharged.
///
/// A complete deployment looks up the discharge credential the holder
/// presented for `request.location`, checks it is bound to
/// `request.discharge_key`, and verifies it recursively.
pub trait DischargeVerifier {
    /// Returns true if the caveat is discharged.
    fn verify_discharge(&self, request: &DischargeRequest<'_>) -> bool;
}

impl<F> DischargeVerifier for F
where
    F: Fn(&DischargeRequest<'_>) -> bool,
{
    fn verify_discharge(&self, request: &DischargeRequest<'_>) -> bool {
        self(request)
    }
}

/// Accepts any third-party caveat whose seals opened and whose key matched.
///
/// This proves the verifier holds the correct chain state, not that the
/// authority approved the condition. Use a real [`DischargeVerifier`] when
/// third-party caveats carry authority.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalDecryption;

impl DischargeVerifier for LocalDecryption {
    fn verify_discharge(&self, _request: &DischargeRequest<'_>) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::SystemEnv;

    #[test]
    fn generated_keys_differ() {
        let env = SystemEnv::new();
        assert_ne!(DischargeKey::generate(&env), DischargeKey::generate(&env));
    }

    #[test]
    fn try_from_rejects_wrong_length() {
        let result = DischargeKey::try_from(&b"caveat-root-key!"[..]);

        assert_eq!(result.unwrap_err(), MacaroonError::InvalidKeyLength { expected: 32, actual: 16 });
    }

    #[test]
    fn try_from_accepts_32_bytes() {
        let key = DischargeKey::try_from(&[7u8; KEY_SIZE][..]).unwrap();
        assert_eq!(key.as_bytes(), &[7u8; KEY_SIZE]);
    }

    #[test]
    fn equality_sees_last_byte() {
        let mut bytes = [9u8; KEY_SIZE];
        let a = DischargeKey::from_bytes(bytes);
        bytes[KEY_SIZE - 1] = 8;

        assert_eq!(a, DischargeKey::from_bytes([9u8; KEY_SIZE]));
        assert_ne!(a, DischargeKey::from_bytes(bytes));
    }

    #[test]
    fn debug_does_not_leak_key() {
        let key = DischargeKey::from_bytes([0xAA; KEY_SIZE]);
        assert_eq!(format!("{key:?}"), "DischargeKey(..)");
    }

    #[test]
    fn closures_are_discharge_verifiers() {
        let key = DischargeKey::from_bytes([1; KEY_SIZE]);
        let request = DischargeRequest {
            index: 0,
            location: "auth.example",
            verification_id: &[],
            key: "authenticated",
            constraint: "true",
            discharge_key: &key,
        };

        let only_auth = |req: &DischargeRequest<'_>| req.location == "auth.example";
        assert!(only_auth.verify_discharge(&request));
        assert!(LocalDecryption.verify_discharge(&request));
    }
}
