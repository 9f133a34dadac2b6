//! Length-prefixed field framing.
//!
//! Every field is written as an 8-byte big-endian length followed by its raw
//! bytes. Plain concatenation would let `("ab", "c")` and `("a", "bc")` hash
//! to the same input; framing makes the split explicit.

/// Size of the length prefix in front of each field
const LENGTH_PREFIX_SIZE: usize = 8;

/// Frame a sequence of fields.
pub fn encode_fields(fields: &[&[u8]]) -> Vec<u8> {
    let capacity = fields.iter().map(|f| LENGTH_PREFIX_SIZE + f.len()).sum();
    let mut out = Vec::with_capacity(capacity);
    write_fields(&mut out, fields);
    out
}

/// Append framed fields to an existing buffer.
pub(crate) fn write_fields(out: &mut Vec<u8>, fields: &[&[u8]]) {
    for field in fields {
        out.extend_from_slice(&(field.len() as u64).to_be_bytes());
        out.extend_from_slice(field);
    }
}

/// Split framed bytes back into their fields.
///
/// Returns `None` if a length prefix is truncated or claims more bytes than
/// remain.
pub fn decode_fields(mut bytes: &[u8]) -> Option<Vec<&[u8]>> {
    let mut fields = Vec::new();

    while !bytes.is_empty() {
        let (prefix, rest) = bytes.split_at_checked(LENGTH_PREFIX_SIZE)?;
        let mut len_bytes = [0u8; LENGTH_PREFIX_SIZE];
        len_bytes.copy_from_slice(prefix);
        let len = usize::try_from(u64::from_be_bytes(len_bytes)).ok()?;

        let (field, rest) = rest.split_at_checked(len)?;
        fields.push(field);
        bytes = rest;
    }

    Some(fields)
}
