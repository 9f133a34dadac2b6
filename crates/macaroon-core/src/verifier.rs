//! Macaroon verification.
//!
//! Recomputes the signature chain from the master secret and checks every
//! caveat on the way. This is a single linear fold with no retries:
//!
//! ```text
//! limit check ─▶ root signature ─▶ fold caveats ─▶ compare signature ─▶ Ok
//!      │                                │                 │
//!      ▼                                ▼                 ▼
//! CaveatLimitExceeded          DecryptionFailure   InvalidSignature
//! ```
//!
//! # Failure Ordering
//!
//! Chain and decryption failures stop the fold immediately. A policy or
//! discharge rejection does not: the fold continues so the chain stays
//! consistent, and the rejection is reported only once the signature has
//! matched. A forged macaroon therefore never learns anything about the
//! verifier's policy.

use macaroon_crypto::{Signature, decode_fields, open};
use zeroize::Zeroizing;

use crate::{
    caveat::{Caveat, ThirdPartyCaveat},
    discharge::{DischargeKey, DischargeRequest, DischargeVerifier, LocalDecryption},
    error::MacaroonError,
    macaroon::{MAX_CAVEATS, Macaroon, root_signature},
    policy::CaveatPolicy,
    secret::SecretProvider,
};

/// Verifier configuration
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Maximum caveats accepted. Values above [`MAX_CAVEATS`] are clamped.
    pub max_caveats: usize,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self { max_caveats: MAX_CAVEATS }
    }
}

/// Checks macaroons against a master secret, a first-party policy and a
/// discharge verifier.
///
/// Verification never mutates the macaroon, so one verifier can check the
/// same value from many threads at once.
#[derive(Debug, Clone)]
pub struct Verifier<P, D = LocalDecryption> {
    config: VerifierConfig,
    policy: P,
    discharge: D,
}

impl<P: CaveatPolicy> Verifier<P> {
    /// Verifier with default configuration and [`LocalDecryption`] for
    /// third-party caveats.
    pub fn new(policy: P) -> Self {
        Self { config: VerifierConfig::default(), policy, discharge: LocalDecryption }
    }
}

impl<P: CaveatPolicy, D: DischargeVerifier> Verifier<P, D> {
    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, mut config: VerifierConfig) -> Self {
        if config.max_caveats > MAX_CAVEATS {
            tracing::warn!(
                requested = config.max_caveats,
                limit = MAX_CAVEATS,
                "max_caveats above attenuation limit, clamping"
            );
            config.max_caveats = MAX_CAVEATS;
        }
        self.config = config;
        self
    }

    /// Replace the discharge verifier.
    pub fn with_discharge<D2: DischargeVerifier>(self, discharge: D2) -> Verifier<P, D2> {
        Verifier { config: self.config, policy: self.policy, discharge }
    }

    /// Active configuration.
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Verify a macaroon.
    ///
    /// # Errors
    ///
    /// - `CaveatLimitExceeded`: more caveats than the configured maximum
    /// - `KeyDerivationFailure`: the provider's master secret is unusable
    /// - `DecryptionFailure`: a third-party caveat did not open under the
    ///   recomputed chain, or its sealed key does not match
    /// - `InvalidSignature`: the recomputed chain does not match
    /// - `CaveatUnsatisfied`: the policy rejected a first-party caveat
    /// - `DischargeRejected`: the discharge verifier rejected a third-party
    ///   caveat
    pub fn verify<S>(&self, macaroon: &Macaroon, secrets: &S) -> Result<(), MacaroonError>
    where
        S: SecretProvider + ?Sized,
    {
        let count = macaroon.caveats().len();
        if count > self.config.max_caveats {
            tracing::debug!(
                identifier = macaroon.identifier(),
                caveats = count,
                limit = self.config.max_caveats,
                "verification failed: caveat limit exceeded"
            );
            return Err(MacaroonError::CaveatLimitExceeded { limit: self.config.max_caveats });
        }

        let mut signature = root_signature(secrets, macaroon.identifier(), macaroon.location())?;
        let mut rejection = None;

        for (index, caveat) in macaroon.caveats().iter().enumerate() {
            match caveat {
                Caveat::FirstParty(inner) => {
                    if rejection.is_none() && !self.policy.evaluate(&inner.key, &inner.constraint)
                    {
                        rejection =
                            Some(MacaroonError::CaveatUnsatisfied { index, key: inner.key.clone() });
                    }
                },
                Caveat::ThirdParty(inner) => {
                    let discharged = self
                        .check_third_party(index, inner, &signature)
                        .inspect_err(|err| {
                            tracing::debug!(
                                identifier = macaroon.identifier(),
                                index,
                                error = %err,
                                "verification failed: third-party caveat"
                            );
                        })?;
                    if rejection.is_none() && !discharged {
                        rejection = Some(MacaroonError::DischargeRejected {
                            index,
                            location: inner.location.clone(),
                        });
                    }
                },
            }

            signature = caveat.extend_chain(&signature);
        }

        if !signature.constant_time_eq(macaroon.signature()) {
            tracing::debug!(
                identifier = macaroon.identifier(),
                "verification failed: signature mismatch"
            );
            return Err(MacaroonError::InvalidSignature);
        }

        if let Some(err) = rejection {
            tracing::debug!(
                identifier = macaroon.identifier(),
                error = %err,
                "verification failed: caveat rejected"
            );
            return Err(err);
        }

        Ok(())
    }

    /// Open both seals of a third-party caveat and ask the discharge
    /// verifier about it.
    fn check_third_party(
        &self,
        index: usize,
        caveat: &ThirdPartyCaveat,
        running: &Signature,
    ) -> Result<bool, MacaroonError> {
        let key_bytes = Zeroizing::new(open(running.as_bytes(), &caveat.verification_id)?);
        let discharge_key = DischargeKey::try_from(key_bytes.as_slice()).map_err(|_| {
            MacaroonError::DecryptionFailure {
                reason: format!("caveat {index}: verification id holds a malformed key"),
            }
        })?;

        let plaintext =
            Zeroizing::new(open(discharge_key.as_bytes(), &caveat.encrypted_constraint)?);
        let malformed = || MacaroonError::DecryptionFailure {
            reason: format!("caveat {index}: malformed constraint payload"),
        };
        let fields = decode_fields(&plaintext).ok_or_else(malformed)?;
        let [key, constraint] = fields.as_slice() else {
            return Err(malformed());
        };

        if *key != caveat.key.as_bytes() {
            return Err(MacaroonError::DecryptionFailure {
                reason: format!("caveat {index}: sealed key does not match caveat key"),
            });
        }
        let constraint = std::str::from_utf8(constraint).map_err(|_| malformed())?;

        Ok(self.discharge.verify_discharge(&DischargeRequest {
            index,
            location: &caveat.location,
            verification_id: &caveat.verification_id,
            key: &caveat.key,
            constraint,
            discharge_key: &discharge_key,
        }))
    }
}
