//! Reversible scrambling of transaction names embedded in served pages.
//!
//! This only keeps names from being read casually in page source. The browser-side decoder
//! cycles over the first 13 key bytes, so the same modulus must be used here.

use crate::api::constants::OBFUSCATION_KEY_LENGTH;
use crate::api::error::{deobfuscation_error, InstrumentationResult};
use crate::util::{base64_decode_bytes, base64_encode_bytes};

/// XORs the UTF-8 bytes of `text` with `key` and base64-encodes the result.
///
/// Byte `i` is combined with `key[i % 13]`. A key shorter than 13 bytes wraps around its own
/// length within each 13-byte cycle; an empty key leaves the bytes unchanged.
pub fn obfuscate(text: &str, key: &str) -> String {
    base64_encode_bytes(&xor_with_key(text.as_bytes(), key.as_bytes()))
}

/// Reverses [`obfuscate`] for the same key.
pub fn deobfuscate(encoded: &str, key: &str) -> InstrumentationResult<String> {
    let bytes = base64_decode_bytes(encoded)
        .map_err(|err| deobfuscation_error(format!("Obfuscated name is not base64: {err}")))?;
    String::from_utf8(xor_with_key(&bytes, key.as_bytes()))
        .map_err(|_| deobfuscation_error("Deobfuscated name is not valid UTF-8"))
}

fn xor_with_key(bytes: &[u8], key: &[u8]) -> Vec<u8> {
    let key = &key[..key.len().min(OBFUSCATION_KEY_LENGTH)];
    if key.is_empty() {
        return bytes.to_vec();
    }
    bytes
        .iter()
        .enumerate()
        .map(|(index, byte)| byte ^ key[(index % OBFUSCATION_KEY_LENGTH) % key.len()])
        .collect()
}
