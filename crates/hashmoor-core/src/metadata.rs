//! Provenance metadata attached to each encrypted record.
//!
//! The metadata envelope is persisted as the `.meta` artifact and its
//! canonical hash is what gets anchored on the ledger alongside the
//! ciphertext hash. Treated as immutable once built.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;
use crate::hash::ContentHash;

/// The symmetric scheme used to produce an encrypted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncryptionMethod {
    #[serde(rename = "AES-256-CBC")]
    Aes256Cbc,
}

impl fmt::Display for EncryptionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncryptionMethod::Aes256Cbc => f.write_str("AES-256-CBC"),
        }
    }
}

/// Provenance envelope for one encrypted record.
///
/// `data_hash` is the content hash of the plaintext, so integrity can be
/// verified after decryption without consulting the ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub original_filename: String,
    pub encrypted_filename: String,
    pub encryption_timestamp: DateTime<Utc>,
    pub data_hash: ContentHash,
    pub encryption_method: EncryptionMethod,
}

impl Metadata {
    /// Build a metadata envelope for an AES-256-CBC record.
    pub fn new(
        original_filename: impl Into<String>,
        encrypted_filename: impl Into<String>,
        data_hash: ContentHash,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            original_filename: original_filename.into(),
            encrypted_filename: encrypted_filename.into(),
            encryption_timestamp: at,
            data_hash,
            encryption_method: EncryptionMethod::Aes256Cbc,
        }
    }

    /// Canonical content hash of the envelope.
    ///
    /// Stable across field ordering in any serialized form.
    pub fn digest(&self) -> Result<ContentHash, CoreError> {
        ContentHash::digest_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Metadata {
        Metadata::new(
            "tracks.json",
            "tracks.enc",
            ContentHash::digest(b"plaintext"),
            Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap(),
        )
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        let obj = json.as_object().unwrap();
        for field in [
            "original_filename",
            "encrypted_filename",
            "encryption_timestamp",
            "data_hash",
            "encryption_method",
        ] {
            assert!(obj.contains_key(field), "missing field {}", field);
        }
        assert_eq!(obj["encryption_method"], "AES-256-CBC");
        assert_eq!(obj["data_hash"], ContentHash::digest(b"plaintext").to_hex());
    }

    #[test]
    fn test_timestamp_is_iso8601() {
        let json = serde_json::to_value(sample()).unwrap();
        let ts = json["encryption_timestamp"].as_str().unwrap();
        assert!(ts.starts_with("2026-03-14T09:26:53"));
        let parsed: DateTime<Utc> = ts.parse().unwrap();
        assert_eq!(parsed, sample().encryption_timestamp);
    }

    #[test]
    fn test_digest_invariant_under_field_order() {
        let meta = sample();
        let json = serde_json::to_string(&meta).unwrap();

        // Rebuild the same envelope from a reordered document.
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let mut pairs: Vec<(String, serde_json::Value)> = value
            .as_object()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        pairs.reverse();
        let reordered = format!(
            "{{{}}}",
            pairs
                .iter()
                .map(|(k, v)| format!("\"{}\":{}", k, v))
                .collect::<Vec<_>>()
                .join(",")
        );
        let back: Metadata = serde_json::from_str(&reordered).unwrap();

        assert_eq!(meta.digest().unwrap(), back.digest().unwrap());
    }

    #[test]
    fn test_roundtrip() {
        let meta = sample();
        let json = serde_json::to_string(&meta).unwrap();
        let back: Metadata = serde_json::from_str(&json).unwrap();
        assert_eq!(meta, back);
    }
}
