use serde::Serialize;

/// Compact JSON, no whitespace between tokens.
pub fn stringify<T: ?Sized + Serialize>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string(value)
}

/// Pretty JSON with two-space indentation.
pub fn stringify_pretty<T: ?Sized + Serialize>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}
