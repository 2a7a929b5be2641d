//! Strong type definitions for hashmoor identifiers.
//!
//! All identifiers are newtypes to prevent misuse at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::hash::ContentHash;

/// A ledger data identifier.
///
/// Derived ids are 32 lowercase hex characters, the truncated SHA-256 of
/// `"{label}_{timestamp}"`. Explicit ids supplied by callers are 1..=32
/// characters of `[A-Za-z0-9._-]`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DataId(String);

impl DataId {
    /// Maximum identifier length in characters.
    pub const MAX_LEN: usize = 32;

    /// Create a validated identifier.
    pub fn new(id: impl Into<String>) -> Result<Self, CoreError> {
        let id = id.into();
        if id.is_empty() {
            return Err(CoreError::InvalidDataId("empty".into()));
        }
        if id.len() > Self::MAX_LEN {
            return Err(CoreError::InvalidDataId(format!(
                "{} characters exceeds the {} limit",
                id.len(),
                Self::MAX_LEN
            )));
        }
        if let Some(bad) = id
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')))
        {
            return Err(CoreError::InvalidDataId(format!(
                "character {:?} not allowed",
                bad
            )));
        }
        Ok(Self(id))
    }

    /// Derive a deterministic identifier from a label and a Unix timestamp.
    ///
    /// The digest input is `"{label}_{timestamp}"`; the id is the first 32
    /// hex characters of its SHA-256.
    pub fn derive(label: &str, timestamp: i64) -> Self {
        let digest = ContentHash::digest(format!("{}_{}", label, timestamp).as_bytes());
        Self(digest.to_hex()[..Self::MAX_LEN].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for DataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataId({})", self.0)
    }
}

impl fmt::Display for DataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DataId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for DataId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for DataId {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<DataId> for String {
    fn from(id: DataId) -> String {
        id.0
    }
}

/// A 20-byte principal address.
///
/// Displays as `0x`-prefixed lowercase hex. For in-process signers the
/// address is the trailing 20 bytes of the SHA-256 of the verifying key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Convert to a `0x`-prefixed lowercase hex string.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse from hex, with or without a `0x` prefix, any case.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let stripped = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
        let bytes = hex::decode(stripped).map_err(|e| CoreError::InvalidAddress(e.to_string()))?;
        if bytes.len() != 20 {
            return Err(CoreError::InvalidAddress(format!(
                "expected 20 bytes, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// The zero address (sentinel value).
    pub const ZERO: Self = Self([0u8; 20]);
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({}..)", &self.to_hex()[..10])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_derive_deterministic() {
        let a = DataId::derive("tracks.json", 1_700_000_000);
        let b = DataId::derive("tracks.json", 1_700_000_000);
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 32);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_derive_sensitive_to_inputs() {
        let base = DataId::derive("tracks.json", 1_700_000_000);
        assert_ne!(base, DataId::derive("tracks.json", 1_700_000_001));
        assert_ne!(base, DataId::derive("other.json", 1_700_000_000));
    }

    #[test]
    fn test_explicit_id_validation() {
        assert!(DataId::new("doc1").is_ok());
        assert!(DataId::new("test-data-1").is_ok());
        assert!(DataId::new("a".repeat(32)).is_ok());

        assert!(DataId::new("").is_err());
        assert!(DataId::new("a".repeat(33)).is_err());
        assert!(DataId::new("has space").is_err());
        assert!(DataId::new("semi;colon").is_err());
    }

    #[test]
    fn test_data_id_serde_validates() {
        let ok: DataId = serde_json::from_str("\"doc1\"").unwrap();
        assert_eq!(ok.as_str(), "doc1");
        assert!(serde_json::from_str::<DataId>("\"bad id\"").is_err());
    }

    #[test]
    fn test_address_hex_roundtrip() {
        let addr = Address::from_bytes([0xab; 20]);
        let hex = addr.to_hex();
        assert!(hex.starts_with("0x"));
        assert_eq!(Address::from_hex(&hex).unwrap(), addr);
    }

    #[test]
    fn test_address_accepts_unprefixed_and_mixed_case() {
        let addr = Address::from_bytes([0xab; 20]);
        let bare = hex::encode(addr.0).to_uppercase();
        assert_eq!(Address::from_hex(&bare).unwrap(), addr);
    }

    #[test]
    fn test_address_rejects_wrong_length() {
        assert!(Address::from_hex("0xabcd").is_err());
        assert!(Address::from_hex("not hex").is_err());
    }

    #[test]
    fn test_address_serde_string_form() {
        let addr = Address::from_bytes([0x11; 20]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr.to_hex()));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(addr, back);
    }

    proptest! {
        #[test]
        fn prop_derived_ids_always_valid(label in ".{0,64}", ts in proptest::num::i64::ANY) {
            let id = DataId::derive(&label, ts);
            prop_assert_eq!(id.as_str().len(), 32);
            prop_assert!(DataId::new(id.as_str()).is_ok());
        }

        #[test]
        fn prop_address_roundtrip(bytes in proptest::array::uniform20(any::<u8>())) {
            let addr = Address::from_bytes(bytes);
            prop_assert_eq!(Address::from_hex(&addr.to_hex()).unwrap(), addr);
        }
    }
}
