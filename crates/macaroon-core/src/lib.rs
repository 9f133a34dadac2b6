//! Macaroon Core
//!
//! Bearer credentials that holders can narrow but never widen. A macaroon is
//! minted by an issuer holding a master secret, attenuated by anyone holding
//! it, and verified by recomputing its signature chain.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   mint    ┌──────────┐  add_*_caveat  ┌──────────┐
//! │SecretProvider│ ────────▶ │ Macaroon │ ─────────────▶ │ Macaroon │
//! └──────────────┘           └──────────┘                └────┬─────┘
//!                                                             │ to_json / to_cbor
//!                                                             ▼
//!                                       ┌──────────────────────────────────┐
//!                                       │ Verifier<CaveatPolicy,           │
//!                                       │          DischargeVerifier>      │
//!                                       └──────────────────────────────────┘
//! ```
//!
//! Collaborators are traits so deployments supply their own key management,
//! predicate evaluation and discharge checks:
//!
//! - [`SecretProvider`]: the issuer's master secret
//! - [`Environment`]: randomness for nonces and discharge keys
//! - [`CaveatPolicy`]: first-party predicate evaluation
//! - [`DischargeVerifier`]: third-party discharge checks
//!
//! # Example
//!
//! ```
//! use macaroon_core::{ExactMatch, Macaroon, MasterSecret, Verifier};
//!
//! let secret = MasterSecret::new(b"issuer-master-secret".to_vec());
//! let macaroon = Macaroon::mint(&secret, "acct-42", "issuer.example")?
//!     .add_first_party_caveat("user", "admin")?;
//!
//! let verifier = Verifier::new(ExactMatch::new().with("user", "admin"));
//! assert!(verifier.verify(&macaroon, &secret).is_ok());
//! # Ok::<(), macaroon_core::MacaroonError>(())
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod caveat;
pub mod discharge;
pub mod env;
pub mod error;
pub mod macaroon;
pub mod policy;
pub mod secret;
pub mod verifier;
pub mod wire;

pub use caveat::{Caveat, FirstPartyCaveat, ThirdPartyCaveat};
pub use discharge::{DischargeKey, DischargeRequest, DischargeVerifier, LocalDecryption};
pub use env::{Environment, SystemEnv};
pub use error::{MacaroonError, WireError};
pub use macaroon::{MAX_CAVEATS, Macaroon};
pub use macaroon_crypto::{SIGNATURE_SIZE, Signature};
pub use policy::{CaveatPolicy, ExactMatch};
pub use secret::{MasterSecret, SecretProvider};
pub use verifier::{Verifier, VerifierConfig};
pub use wire::MAX_ENCODED_SIZE;
