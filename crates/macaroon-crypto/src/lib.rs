//! Macaroon Cryptographic Primitives
//!
//! Cryptographic building blocks for macaroons. Pure functions with
//! deterministic outputs. Callers provide random bytes (nonces, generated
//! discharge keys) so every operation can be replayed in tests.
//!
//! # Key Lifecycle
//!
//! A master secret held by key management is turned into a per-macaroon root
//! key, which seeds a left fold of HMAC steps. Every caveat extends the fold,
//! and the last step is the macaroon's signature.
//!
//! ```text
//! Master Secret
//!        │
//!        ▼
//! HMAC(master, identifier) → Root Key
//!        │
//!        ▼
//! HMAC(root, location) → Signature₀
//!        │
//!        ▼
//! HMAC(sigₙ, caveatₙ) → Signatureₙ₊₁
//! ```
//!
//! Third-party caveats additionally seal a discharge key under the running
//! signature, and the caveat body under the discharge key:
//!
//! ```text
//! seal(sigₙ, discharge_key)          → verification id
//! seal(discharge_key, key‖constraint) → encrypted constraint
//! ```
//!
//! # Security
//!
//! Integrity:
//! - Each chain step is keyed by the previous output, so inserting, removing,
//!   reordering or editing a caveat changes every later signature
//! - Chain inputs are tagged and length-framed: no two distinct caveats share
//!   an input
//! - Signatures compare in constant time
//!
//! Confidentiality:
//! - XChaCha20-Poly1305 AEAD with a fresh 24-byte nonce per seal
//! - Sealing keys are HKDF-expanded from the input key, so a running
//!   signature is never used directly as an AEAD key
//! - Failed authentication tag -> reject, never return plaintext
//!
//! Hygiene:
//! - Root keys and derived sealing keys are zeroized when dropped

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod chain;
pub mod codec;
pub mod derivation;
pub mod error;
pub mod framing;

pub use chain::{ChainTag, SIGNATURE_SIZE, Signature, bind_location, constant_time_eq, extend};
pub use codec::{NONCE_SIZE, TAG_SIZE, open, seal};
pub use derivation::{KEY_SIZE, RootKey, derive_root_key};
pub use error::CryptoError;
pub use framing::{decode_fields, encode_fields};
