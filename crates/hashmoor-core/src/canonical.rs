//! Canonical JSON encoding for deterministic serialization.
//!
//! Rules:
//! - Object keys sorted lexicographically at every nesting level
//! - Compact separators (no whitespace)
//! - Floats use the shortest round-trip decimal representation
//! - Non-finite floats normalize to null
//!
//! The canonical encoding is what gets hashed and what gets encrypted: the
//! same structured value must produce identical bytes (and thus identical
//! digests and ciphertext inputs) regardless of how its maps were built.

use serde::Serialize;
use serde_json::Value;

use crate::error::CoreError;

/// Encode a serializable value to canonical JSON bytes.
///
/// Fails with [`CoreError::Encoding`] when the value has no JSON form,
/// for example a map with non-string keys.
pub fn to_canonical_vec<T: Serialize>(value: &T) -> Result<Vec<u8>, CoreError> {
    let value = normalize(value)?;
    serde_json::to_vec(&value).map_err(|e| CoreError::Encoding(e.to_string()))
}

/// Encode a serializable value to a canonical JSON string.
pub fn to_canonical_string<T: Serialize>(value: &T) -> Result<String, CoreError> {
    let value = normalize(value)?;
    serde_json::to_string(&value).map_err(|e| CoreError::Encoding(e.to_string()))
}

/// Convert to a [`serde_json::Value`], which stores objects in a sorted map.
///
/// Struct fields serialize in declaration order; routing them through
/// `Value` is what imposes the key ordering.
fn normalize<T: Serialize>(value: &T) -> Result<Value, CoreError> {
    serde_json::to_value(value).map_err(|e| CoreError::Encoding(e.to_string()))
}
