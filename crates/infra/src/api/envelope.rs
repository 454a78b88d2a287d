//! Response envelope handling
//!
//! The backend wraps payloads as `{ "data": T, "status": "success" }`. Callers
//! only ever see `T`.

use serde_json::Value;

const DATA_FIELD: &str = "data";

/// Strip the response envelope
///
/// A JSON object carrying a `data` field yields that field's value; anything
/// else is returned unchanged.
pub fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key(DATA_FIELD) => {
            map.remove(DATA_FIELD).unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Parse a raw response body and strip the envelope
///
/// Empty bodies (204, 205, or a bare 200) parse as `null`.
///
/// # Errors
/// Returns the JSON error if a non-empty body is not valid JSON
pub fn parse_body(bytes: &[u8]) -> Result<Value, serde_json::Error> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes).map(unwrap_envelope)
}
