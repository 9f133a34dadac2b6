//! Fuzz target for the caveat codec and field framing
//!
//! # Strategy
//!
//! - Arbitrary keys, nonces and plaintexts through seal/open
//! - Arbitrary bytes straight into open and decode_fields
//!
//! # Invariants
//!
//! - open(seal(m)) == m
//! - open under a different key fails
//! - open and decode_fields never panic on garbage
//! - decode_fields(encode_fields(f)) == f

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use macaroon_crypto::{KEY_SIZE, NONCE_SIZE, decode_fields, encode_fields, open, seal};

#[derive(Debug, Arbitrary)]
struct Scenario {
    key: [u8; KEY_SIZE],
    other_key: [u8; KEY_SIZE],
    nonce: [u8; NONCE_SIZE],
    plaintext: Vec<u8>,
    fields: Vec<Vec<u8>>,
    garbage: Vec<u8>,
}

fuzz_target!(|s: Scenario| {
    let sealed = seal(&s.key, &s.plaintext, s.nonce);
    assert_eq!(open(&s.key, &sealed).ok().as_deref(), Some(s.plaintext.as_slice()));

    if s.other_key != s.key {
        assert!(open(&s.other_key, &sealed).is_err(), "opened under wrong key");
    }

    let _ = open(&s.key, &s.garbage);
    let _ = decode_fields(&s.garbage);

    let borrowed: Vec<&[u8]> = s.fields.iter().map(Vec::as_slice).collect();
    let framed = encode_fields(&borrowed);
    assert_eq!(decode_fields(&framed), Some(borrowed));
});
