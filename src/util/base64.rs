use ::base64::engine::general_purpose::STANDARD;
use ::base64::engine::Engine as _;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeBase64Error;

impl fmt::Display for DecodeBase64Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to decode base64 string")
    }
}

impl std::error::Error for DecodeBase64Error {}

/// Encode bytes with the standard alphabet and `=` padding, as browser-side `atob` expects.
pub fn base64_encode_bytes(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode standard base64 into raw bytes.
pub fn base64_decode_bytes(input: &str) -> Result<Vec<u8>, DecodeBase64Error> {
    let mut normalized = input.trim().to_owned();
    // Restore padding that was stripped in transit.
    let remainder = normalized.len() % 4;
    if remainder != 0 {
        normalized.extend("====".chars().take(4 - remainder));
    }
    STANDARD
        .decode(normalized.as_bytes())
        .map_err(|_err| DecodeBase64Error)
}
