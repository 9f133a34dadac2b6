//! Wire encodings for macaroons.
//!
//! Two self-describing formats share one serde model:
//!
//! - JSON for text transports (headers, cookies). Byte fields are standard
//!   base64 strings.
//! - CBOR for compact binary transports. Byte fields are native CBOR byte
//!   strings.
//!
//! Decoding never trusts the result: a decoded macaroon must still pass
//! [`crate::Verifier::verify`]. Inputs larger than [`MAX_ENCODED_SIZE`] are
//! rejected before any parsing happens.

use crate::{error::WireError, macaroon::Macaroon};

/// Maximum encoded size accepted by the decoders (64 KiB).
pub const MAX_ENCODED_SIZE: usize = 64 * 1024;

fn check_size(size: usize) -> Result<(), WireError> {
    if size > MAX_ENCODED_SIZE {
        tracing::debug!(size, max = MAX_ENCODED_SIZE, "rejecting oversized macaroon encoding");
        return Err(WireError::TooLarge { size, max: MAX_ENCODED_SIZE });
    }
    Ok(())
}

/// Length of the larger of the two encodings.
///
/// JSON is normally the larger one (base64 byte fields), but both are
/// measured so the bound holds for either transport.
pub(crate) fn encoded_len(macaroon: &Macaroon) -> usize {
    let Ok(json) = serde_json::to_vec(macaroon) else {
        unreachable!("macaroon fields always serialize to JSON");
    };
    let mut cbor = Vec::new();
    let Ok(()) = ciborium::ser::into_writer(macaroon, &mut cbor) else {
        unreachable!("CBOR encoding into a Vec cannot fail");
    };
    json.len().max(cbor.len())
}

impl Macaroon {
    /// Encode as JSON.
    ///
    /// Every macaroon built by [`Macaroon::mint`] and the `add_*` methods
    /// fits; only a value assembled with [`Macaroon::from_parts`] can be
    /// refused with `TooLarge`.
    pub fn to_json(&self) -> Result<String, WireError> {
        let encoded =
            serde_json::to_string(self).map_err(|e| WireError::Encode(e.to_string()))?;
        check_size(encoded.len())?;
        Ok(encoded)
    }

    /// Decode from JSON.
    pub fn from_json(input: &str) -> Result<Self, WireError> {
        check_size(input.len())?;
        serde_json::from_str(input).map_err(|e| WireError::Decode(e.to_string()))
    }

    /// Encode as CBOR.
    ///
    /// Size behaves as for [`Macaroon::to_json`].
    pub fn to_cbor(&self) -> Result<Vec<u8>, WireError> {
        let mut encoded = Vec::new();
        ciborium::ser::into_writer(self, &mut encoded)
            .map_err(|e| WireError::Encode(e.to_string()))?;
        check_size(encoded.len())?;
        Ok(encoded)
    }

    /// Decode from CBOR.
    pub fn from_cbor(input: &[u8]) -> Result<Self, WireError> {
        check_size(input.len())?;
        ciborium::de::from_reader(input).map_err(|e| WireError::Decode(e.to_string()))
    }
}

/// Byte fields: base64 in human-readable formats, raw bytes otherwise.
pub(crate) mod bytes {
    use std::fmt;

    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use serde::{
        Deserializer, Serializer,
        de::{self, SeqAccess, Visitor},
    };

    pub(crate) fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: AsRef<[u8]> + ?Sized,
        S: Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&STANDARD.encode(value.as_ref()))
        } else {
            serializer.serialize_bytes(value.as_ref())
        }
    }

    pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            deserializer.deserialize_str(BytesVisitor)
        } else {
            deserializer.deserialize_byte_buf(BytesVisitor)
        }
    }

    struct BytesVisitor;

    impl<'de> Visitor<'de> for BytesVisitor {
        type Value = Vec<u8>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a base64 string or a byte string")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            STANDARD.decode(value).map_err(|e| E::custom(format!("invalid base64: {e}")))
        }

        fn visit_bytes<E: de::Error>(self, value: &[u8]) -> Result<Self::Value, E> {
            Ok(value.to_vec())
        }

        fn visit_byte_buf<E: de::Error>(self, value: Vec<u8>) -> Result<Self::Value, E> {
            Ok(value)
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let capacity = seq.size_hint().unwrap_or(0).min(super::MAX_ENCODED_SIZE);
            let mut out = Vec::with_capacity(capacity);
            while let Some(byte) = seq.next_element::<u8>()? {
                out.push(byte);
            }
            Ok(out)
        }
    }
}

/// Fixed-size signature field.
pub(crate) mod signature {
    use macaroon_crypto::{SIGNATURE_SIZE, Signature};
    use serde::{Deserializer, Serializer, de::Error as _};

    pub(crate) fn serialize<S: Serializer>(
        signature: &Signature,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        super::bytes::serialize(signature.as_bytes(), serializer)
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Signature, D::Error> {
        let bytes = super::bytes::deserialize(deserializer)?;
        let array: [u8; SIGNATURE_SIZE] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| D::Error::invalid_length(bytes.len(), &"32 signature bytes"))?;
        Ok(Signature::from_bytes(array))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::{
        discharge::DischargeKey, env::SystemEnv, secret::MasterSecret, verifier::Verifier,
    };

    fn secret() -> MasterSecret {
        MasterSecret::new(b"test-master-secret".to_vec())
    }

    fn attenuated() -> Macaroon {
        let env = SystemEnv::new();
        let key = DischargeKey::generate(&env);
        Macaroon::mint(&secret(), "acct-42", "issuer.example")
            .unwrap()
            .add_first_party_caveat("expires", "2030-01-01")
            .unwrap()
            .add_third_party_caveat(&env, &key, "auth.example", "authenticated", "true")
            .unwrap()
    }

    #[test]
    fn json_shape_uses_explicit_tags() {
        let json: Value = serde_json::from_str(&attenuated().to_json().unwrap()).unwrap();

        assert_eq!(json["id"], "acct-42");
        assert_eq!(json["location"], "issuer.example");
        assert_eq!(json["caveats"][0]["first_party"]["key"], "expires");
        assert_eq!(json["caveats"][0]["first_party"]["constraint"], "2030-01-01");
        assert_eq!(json["caveats"][1]["third_party"]["location"], "auth.example");
        assert!(json["caveats"][1]["third_party"]["verification_id"].is_string());
        assert!(json["caveats"][1]["third_party"]["constraint"].is_string());
        // 32 bytes in base64 is 44 chars
        assert_eq!(json["signature"].as_str().unwrap().len(), 44);
    }

    #[test]
    fn json_roundtrip_still_verifies() {
        let original = attenuated();
        let decoded = Macaroon::from_json(&original.to_json().unwrap()).unwrap();

        assert_eq!(decoded, original);
        assert_eq!(Verifier::new(|_: &str, _: &str| true).verify(&decoded, &secret()), Ok(()));
    }

    #[test]
    fn cbor_roundtrip_still_verifies() {
        let original = attenuated();
        let decoded = Macaroon::from_cbor(&original.to_cbor().unwrap()).unwrap();

        assert_eq!(decoded, original);
        assert_eq!(Verifier::new(|_: &str, _: &str| true).verify(&decoded, &secret()), Ok(()));
    }

    #[test]
    fn cbor_is_smaller_than_json() {
        let m = attenuated();
        assert!(m.to_cbor().unwrap().len() < m.to_json().unwrap().len());
    }

    #[test]
    fn oversized_input_rejected_before_parsing() {
        let junk = "x".repeat(MAX_ENCODED_SIZE + 1);
        assert_eq!(
            Macaroon::from_json(&junk),
            Err(WireError::TooLarge { size: MAX_ENCODED_SIZE + 1, max: MAX_ENCODED_SIZE })
        );

        let junk = vec![0u8; MAX_ENCODED_SIZE + 1];
        assert!(matches!(Macaroon::from_cbor(&junk), Err(WireError::TooLarge { .. })));
    }

    #[test]
    fn largest_attenuable_macaroon_roundtrips() {
        let m = Macaroon::mint(&secret(), "acct-42", "issuer.example").unwrap();
        let mut constraint = "x".repeat(MAX_ENCODED_SIZE);
        let big = loop {
            match m.add_first_party_caveat("policy", constraint.clone()) {
                Ok(big) => break big,
                Err(_) => constraint.truncate(constraint.len() - 1024),
            }
        };

        let json = big.to_json().unwrap();
        let cbor = big.to_cbor().unwrap();
        assert!(json.len() <= MAX_ENCODED_SIZE);
        assert_eq!(Macaroon::from_json(&json).unwrap(), big);
        assert_eq!(Macaroon::from_cbor(&cbor).unwrap(), big);
    }

    #[test]
    fn short_signature_is_decode_error() {
        let json = r#"{"id":"a","location":"b","caveats":[],"signature":"AAAA"}"#;
        assert!(matches!(Macaroon::from_json(json), Err(WireError::Decode(_))));
    }

    #[test]
    fn invalid_base64_is_decode_error() {
        let json = r#"{"id":"a","location":"b","caveats":[],"signature":"!!!"}"#;
        assert!(matches!(Macaroon::from_json(json), Err(WireError::Decode(_))));
    }

    #[test]
    fn unknown_caveat_kind_is_decode_error() {
        let json = r#"{"id":"a","location":"b","caveats":[{"second_party":{}}],
            "signature":"AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA="}"#;
        assert!(matches!(Macaroon::from_json(json), Err(WireError::Decode(_))));
    }

    #[test]
    fn truncated_cbor_is_decode_error() {
        let encoded = attenuated().to_cbor().unwrap();
        let truncated = &encoded[..encoded.len() / 2];

        assert!(matches!(Macaroon::from_cbor(truncated), Err(WireError::Decode(_))));
    }
}
