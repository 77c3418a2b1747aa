//! Typed access to decoded JSON request bodies.

use serde_json::{Map, Value};

use crate::error::GateError;

/// Generic key/value mapping decoded from a request body.
pub type Fields = Map<String, Value>;

/// Reject any key not in `allowed`.
pub fn only(fields: &Fields, allowed: &[&str]) -> Result<(), GateError> {
    let mut unknown: Vec<&str> = fields
        .keys()
        .map(String::as_str)
        .filter(|k| !allowed.contains(k))
        .collect();
    if unknown.is_empty() {
        return Ok(());
    }
    unknown.sort_unstable();
    Err(GateError::InvalidRequest(format!("unknown field(s): {}", unknown.join(", "))))
}

pub fn required_u64(fields: &Fields, key: &str) -> Result<u64, GateError> {
    match fields.get(key) {
        Some(value) => value
            .as_u64()
            .ok_or_else(|| GateError::InvalidRequest(format!("{key} must be a non-negative integer"))),
        None => Err(GateError::InvalidRequest(format!("missing {key}"))),
    }
}

pub fn optional_str<'a>(fields: &'a Fields, key: &str) -> Result<Option<&'a str>, GateError> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim())),
        Some(_) => Err(GateError::InvalidRequest(format!("{key} must be a string"))),
    }
}

pub fn optional_bool(fields: &Fields, key: &str) -> Result<Option<bool>, GateError> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(GateError::InvalidRequest(format!("{key} must be a boolean"))),
    }
}
