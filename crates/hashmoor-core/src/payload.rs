//! Data payloads: structured JSON values or opaque bytes.
//!
//! Encryption and hashing always operate on the canonical byte form, so a
//! structured payload hashes and encrypts identically no matter how its
//! maps were assembled. Decryption output is classified back best-effort:
//! bytes that parse as JSON become [`Payload::Structured`], everything else
//! stays [`Payload::Raw`].

use bytes::Bytes;
use serde_json::Value;
use std::fmt;

use crate::canonical;
use crate::error::CoreError;
use crate::hash::ContentHash;

/// A payload to be hashed, encrypted, or recovered from decryption.
#[derive(Clone, PartialEq, Eq)]
pub enum Payload {
    /// A JSON value. Byte form is the canonical encoding.
    Structured(Value),
    /// Opaque bytes. Byte form is the bytes themselves.
    Raw(Bytes),
}

impl Payload {
    /// Classify decrypted or loaded bytes.
    ///
    /// Any valid JSON document (including bare numbers and strings)
    /// classifies as structured; invalid JSON or non-UTF-8 input stays raw.
    pub fn classify(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => Payload::Structured(value),
            Err(_) => Payload::Raw(bytes),
        }
    }

    /// The byte form used for hashing and encryption.
    pub fn to_bytes(&self) -> Result<Bytes, CoreError> {
        match self {
            Payload::Structured(value) => Ok(canonical::to_canonical_vec(value)?.into()),
            Payload::Raw(bytes) => Ok(bytes.clone()),
        }
    }

    /// Content hash of the byte form.
    pub fn digest(&self) -> Result<ContentHash, CoreError> {
        Ok(ContentHash::digest(&self.to_bytes()?))
    }

    /// The structured value, if this payload is structured.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Payload::Structured(value) => Some(value),
            Payload::Raw(_) => None,
        }
    }

    /// The raw bytes, if this payload is raw.
    pub fn as_raw(&self) -> Option<&Bytes> {
        match self {
            Payload::Structured(_) => None,
            Payload::Raw(bytes) => Some(bytes),
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Payload::Structured(_))
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Structured(value) => write!(f, "Structured({})", value),
            Payload::Raw(bytes) => write!(f, "Raw({} bytes)", bytes.len()),
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Structured(value)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::Raw(bytes.into())
    }
}

impl From<Bytes> for Payload {
    fn from(bytes: Bytes) -> Self {
        Payload::Raw(bytes)
    }
}
