//! Caveat types.
//!
//! A macaroon's caveat list is heterogeneous: each entry is either a
//! predicate the verifier evaluates itself, or a condition only a separate
//! authority can discharge. Both fold into the signature chain the same way,
//! under different [`ChainTag`]s.

use macaroon_crypto::{ChainTag, Signature, extend};
use serde::{Deserialize, Serialize};

/// A restriction attached to a macaroon.
///
/// Serialized with an explicit variant tag (`first_party` / `third_party`)
/// rather than inferring the kind from which fields are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Caveat {
    /// Predicate checked by the verifier's own policy
    FirstParty(FirstPartyCaveat),
    /// Condition discharged by the authority at `location`
    ThirdParty(ThirdPartyCaveat),
}

impl Caveat {
    /// Caveat key (the predicate name).
    pub fn key(&self) -> &str {
        match self {
            Self::FirstParty(caveat) => &caveat.key,
            Self::ThirdParty(caveat) => &caveat.key,
        }
    }

    /// True for third-party caveats.
    pub fn is_third_party(&self) -> bool {
        matches!(self, Self::ThirdParty(_))
    }

    /// Fold this caveat into a running signature.
    pub(crate) fn extend_chain(&self, signature: &Signature) -> Signature {
        match self {
            Self::FirstParty(caveat) => extend(
                signature,
                ChainTag::FirstParty,
                &[caveat.key.as_bytes(), caveat.constraint.as_bytes()],
            ),
            Self::ThirdParty(caveat) => extend(
                signature,
                ChainTag::ThirdParty,
                &[
                    caveat.verification_id.as_slice(),
                    caveat.location.as_bytes(),
                    caveat.key.as_bytes(),
                    caveat.encrypted_constraint.as_slice(),
                ],
            ),
        }
    }
}

/// Predicate the holder's own verifier evaluates (e.g. `expires`).
///
/// The core carries `key` and `constraint` as opaque strings; their meaning
/// belongs to the policy evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirstPartyCaveat {
    /// Predicate name
    pub key: String,
    /// Predicate argument
    pub constraint: String,
}

impl FirstPartyCaveat {
    /// Create a first-party caveat.
    pub fn new(key: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self { key: key.into(), constraint: constraint.into() }
    }
}

/// Condition only the authority at `location` can check.
///
/// # Invariants
///
/// - `verification_id` is the discharge key sealed under the running
///   signature at the point this caveat was appended
/// - `encrypted_constraint` is `frame(key, constraint)` sealed under the
///   discharge key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThirdPartyCaveat {
    /// Sealed discharge key (`nonce ‖ ciphertext ‖ tag`)
    #[serde(with = "crate::wire::bytes")]
    pub verification_id: Vec<u8>,
    /// Location of the discharging authority
    pub location: String,
    /// Caveat key, in clear so holders know what to ask for
    pub key: String,
    /// Sealed `key` and constraint
    #[serde(rename = "constraint", with = "crate::wire::bytes")]
    pub encrypted_constraint: Vec<u8>,
}
