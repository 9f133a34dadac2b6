//! Fuzz target for macaroon decoding and verification
//!
//! Feeds attacker-controlled bytes through both wire decoders and, when they
//! parse, through the verifier.
//!
//! # Strategy
//!
//! - Raw bytes as CBOR
//! - Raw bytes as JSON (when valid UTF-8)
//! - Honest macaroons with a single mutated byte in the CBOR encoding
//!
//! # Invariants
//!
//! - Decoding never panics
//! - Verification of anything decoded never panics
//! - A mutated encoding never verifies unless it decodes to the original

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use macaroon_core::{DischargeKey, Environment, Macaroon, MasterSecret, Verifier};

#[derive(Clone)]
struct FuzzEnv {
    byte: u8,
}

impl Environment for FuzzEnv {
    fn random_bytes(&self, buffer: &mut [u8]) {
        buffer.fill(self.byte);
    }
}

#[derive(Debug, Arbitrary)]
enum Input {
    Cbor(Vec<u8>),
    Json(String),
    Mutated { caveats: Vec<(bool, String, String)>, position: u16, mask: u8, seed: u8 },
}

fn accept_all(_: &str, _: &str) -> bool {
    true
}

fuzz_target!(|input: Input| {
    let secret = MasterSecret::new(b"fuzz-master-secret".to_vec());
    let verifier = Verifier::new(accept_all);

    match input {
        Input::Cbor(bytes) => {
            if let Ok(m) = Macaroon::from_cbor(&bytes) {
                let _ = verifier.verify(&m, &secret);
            }
        },
        Input::Json(text) => {
            if let Ok(m) = Macaroon::from_json(&text) {
                let _ = verifier.verify(&m, &secret);
            }
        },
        Input::Mutated { caveats, position, mask, seed } => {
            let env = FuzzEnv { byte: seed };
            let Ok(mut m) = Macaroon::mint(&secret, "fuzz", "issuer.example") else {
                return;
            };
            for (third_party, key, constraint) in caveats.into_iter().take(10) {
                let next = if third_party {
                    let discharge = DischargeKey::generate(&env);
                    m.add_third_party_caveat(&env, &discharge, "auth.example", key, constraint)
                } else {
                    m.add_first_party_caveat(key, constraint)
                };
                let Ok(next) = next else { return };
                m = next;
            }

            let Ok(mut encoded) = m.to_cbor() else { return };
            if encoded.is_empty() || mask == 0 {
                return;
            }
            let index = usize::from(position) % encoded.len();
            encoded[index] ^= mask;

            if let Ok(decoded) = Macaroon::from_cbor(&encoded) {
                if verifier.verify(&decoded, &secret).is_ok() {
                    assert_eq!(decoded, m, "mutated encoding verified as a different macaroon");
                }
            }
        },
    }
});
