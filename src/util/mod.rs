pub mod base64;
pub mod json;

pub use self::base64::{base64_decode_bytes, base64_encode_bytes, DecodeBase64Error};
pub use self::json::{stringify, stringify_pretty};
