//! Macaroon value type, minting and attenuation.
//!
//! A [`Macaroon`] is an immutable snapshot. Attenuation borrows the current
//! value and returns a new one with the caveat appended and the signature
//! extended in the same step; on failure the original is untouched, so no
//! holder ever observes a half-applied caveat.
//!
//! # Invariants
//!
//! - `signature == fold(bind_location(derive_root_key(identifier), location), caveats)`
//!   for every macaroon produced by [`Macaroon::mint`] and the `add_*`
//!   methods
//! - Attenuation never produces more than [`MAX_CAVEATS`] caveats
//! - Minting and attenuation never produce a macaroon whose encoding exceeds
//!   [`MAX_ENCODED_SIZE`], so everything they return survives the wire
//! - Caveats are only ever appended

use macaroon_crypto::{NONCE_SIZE, Signature, bind_location, derive_root_key, encode_fields, seal};
use serde::{Deserialize, Serialize};

use crate::{
    caveat::{Caveat, FirstPartyCaveat, ThirdPartyCaveat},
    discharge::DischargeKey,
    env::Environment,
    error::MacaroonError,
    secret::SecretProvider,
    wire::{MAX_ENCODED_SIZE, encoded_len},
};

/// Maximum number of caveats a macaroon may carry.
pub const MAX_CAVEATS: usize = 10;

/// A bearer credential: identifier, location, ordered caveats and a chained
/// signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Macaroon {
    #[serde(rename = "id")]
    identifier: String,
    location: String,
    caveats: Vec<Caveat>,
    #[serde(with = "crate::wire::signature")]
    signature: Signature,
}

impl Macaroon {
    /// Mint a macaroon with no caveats.
    ///
    /// `signature₀ = HMAC(derive_root_key(secret, identifier), location)`.
    /// The location is bound into the chain, so a macaroon minted for one
    /// location does not verify under another.
    ///
    /// # Errors
    ///
    /// - `KeyDerivationFailure` if the provider's master secret is empty
    /// - `EncodedSizeExceeded` if identifier and location alone do not fit
    ///   in [`MAX_ENCODED_SIZE`]
    pub fn mint<S>(
        secrets: &S,
        identifier: impl Into<String>,
        location: impl Into<String>,
    ) -> Result<Self, MacaroonError>
    where
        S: SecretProvider + ?Sized,
    {
        let identifier = identifier.into();
        let location = location.into();
        let signature = root_signature(secrets, &identifier, &location)?;

        let minted = Self { identifier, location, caveats: Vec::new(), signature }.fits_wire()?;

        tracing::trace!(
            identifier = %minted.identifier,
            location = %minted.location,
            "minted macaroon"
        );

        Ok(minted)
    }

    /// Reassemble a macaroon from untrusted parts.
    ///
    /// Nothing is checked here; the result is only meaningful after
    /// [`crate::Verifier::verify`].
    pub fn from_parts(
        identifier: impl Into<String>,
        location: impl Into<String>,
        caveats: Vec<Caveat>,
        signature: Signature,
    ) -> Self {
        Self { identifier: identifier.into(), location: location.into(), caveats, signature }
    }

    /// Issuer-chosen identifier.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Location hint of the issuer.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Caveats in chain order.
    pub fn caveats(&self) -> &[Caveat] {
        &self.caveats
    }

    /// Final chain signature.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// First-party caveats in chain order.
    pub fn first_party_caveats(&self) -> impl Iterator<Item = &FirstPartyCaveat> {
        self.caveats.iter().filter_map(|caveat| match caveat {
            Caveat::FirstParty(inner) => Some(inner),
            Caveat::ThirdParty(_) => None,
        })
    }

    /// Third-party caveats in chain order.
    ///
    /// Holders walk these to find which authorities must discharge the
    /// macaroon.
    pub fn third_party_caveats(&self) -> impl Iterator<Item = &ThirdPartyCaveat> {
        self.caveats.iter().filter_map(|caveat| match caveat {
            Caveat::ThirdParty(inner) => Some(inner),
            Caveat::FirstParty(_) => None,
        })
    }

    /// Return a copy narrowed by a first-party caveat.
    ///
    /// # Errors
    ///
    /// - `CaveatLimitExceeded` if the macaroon already holds
    ///   [`MAX_CAVEATS`] caveats
    /// - `EncodedSizeExceeded` if the result would not fit in
    ///   [`MAX_ENCODED_SIZE`]
    pub fn add_first_party_caveat(
        &self,
        key: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Result<Self, MacaroonError> {
        self.check_capacity()?;
        self.append(Caveat::FirstParty(FirstPartyCaveat::new(key, constraint)))
    }

    /// Return a copy narrowed by a third-party caveat.
    ///
    /// The discharge key is sealed under the current signature (the
    /// verification id), and `(key, constraint)` is sealed under the
    /// discharge key. Both seals draw a fresh nonce from `env`.
    ///
    /// # Errors
    ///
    /// - `CaveatLimitExceeded` if the macaroon already holds
    ///   [`MAX_CAVEATS`] caveats
    /// - `EncodedSizeExceeded` if the result would not fit in
    ///   [`MAX_ENCODED_SIZE`]
    pub fn add_third_party_caveat<E: Environment>(
        &self,
        env: &E,
        discharge_key: &DischargeKey,
        location: impl Into<String>,
        key: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Result<Self, MacaroonError> {
        self.check_capacity()?;

        let key = key.into();
        let constraint = constraint.into();

        let verification_id = seal(
            self.signature.as_bytes(),
            discharge_key.as_bytes(),
            env.random_array::<NONCE_SIZE>(),
        );
        let encrypted_constraint = seal(
            discharge_key.as_bytes(),
            &encode_fields(&[key.as_bytes(), constraint.as_bytes()]),
            env.random_array::<NONCE_SIZE>(),
        );

        self.append(Caveat::ThirdParty(ThirdPartyCaveat {
            verification_id,
            location: location.into(),
            key,
            encrypted_constraint,
        }))
    }

    fn check_capacity(&self) -> Result<(), MacaroonError> {
        if self.caveats.len() >= MAX_CAVEATS {
            tracing::debug!(
                identifier = %self.identifier,
                caveats = self.caveats.len(),
                "caveat limit reached, attenuation refused"
            );
            return Err(MacaroonError::CaveatLimitExceeded { limit: MAX_CAVEATS });
        }
        Ok(())
    }

    fn append(&self, caveat: Caveat) -> Result<Self, MacaroonError> {
        let signature = caveat.extend_chain(&self.signature);
        let key = caveat.key().to_string();
        let third_party = caveat.is_third_party();

        let mut caveats = Vec::with_capacity(self.caveats.len() + 1);
        caveats.extend_from_slice(&self.caveats);
        caveats.push(caveat);

        let attenuated = Self {
            identifier: self.identifier.clone(),
            location: self.location.clone(),
            caveats,
            signature,
        }
        .fits_wire()?;

        tracing::trace!(
            identifier = %self.identifier,
            key = %key,
            third_party,
            index = self.caveats.len(),
            "attenuated macaroon"
        );

        Ok(attenuated)
    }

    fn fits_wire(self) -> Result<Self, MacaroonError> {
        let size = encoded_len(&self);
        if size > MAX_ENCODED_SIZE {
            tracing::debug!(
                identifier = %self.identifier,
                size,
                max = MAX_ENCODED_SIZE,
                "encoded size limit reached, refusing macaroon"
            );
            return Err(MacaroonError::EncodedSizeExceeded { size, max: MAX_ENCODED_SIZE });
        }
        Ok(self)
    }
}

/// First chain value for a macaroon: root key derivation plus location
/// binding.
pub(crate) fn root_signature<S>(
    secrets: &S,
    identifier: &str,
    location: &str,
) -> Result<Signature, MacaroonError>
where
    S: SecretProvider + ?Sized,
{
    let root = derive_root_key(secrets.master_secret(), identifier.as_bytes())?;
    Ok(bind_location(&root, location))
}
