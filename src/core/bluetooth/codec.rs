//! Byte/text codec for characteristic payloads
//! The peripheral's characteristic value is an opaque byte sequence that the
//! session layer treats as UTF-8 text. Malformed sequences decode with the
//! standard replacement character rather than failing.

/// Decodes a raw characteristic payload to text.
pub fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Encodes text to the byte representation the peripheral expects.
pub fn encode(text: &str) -> Vec<u8> {
    text.as_bytes().to_vec()
}
