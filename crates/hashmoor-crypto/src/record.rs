//! Encrypted record envelope.
//!
//! The wire form of one encrypted payload: a fresh IV plus the padded
//! ciphertext, persisted as JSON with base64 fields. Key material never
//! appears in the envelope.

use bytes::Bytes;
use hashmoor_core::{ContentHash, Payload};
use serde::{Deserialize, Serialize};

use crate::cipher::{Iv, SymmetricKey};
use crate::error::{CryptoError, Result};

/// An encrypted record: IV and ciphertext, nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedRecord {
    /// IV used for this encryption (unique per record).
    pub iv: Iv,

    /// The padded ciphertext. Always a multiple of the block size.
    #[serde(with = "b64_bytes")]
    pub ciphertext: Bytes,
}

impl EncryptedRecord {
    /// Encrypt plaintext under a fresh random IV.
    pub fn encrypt(plaintext: &[u8], key: &SymmetricKey) -> Self {
        let iv = Iv::generate();
        let ciphertext = key.encrypt_raw(plaintext, &iv);
        Self {
            iv,
            ciphertext: ciphertext.into(),
        }
    }

    /// Decrypt with the given key.
    pub fn decrypt(&self, key: &SymmetricKey) -> Result<Vec<u8>> {
        key.decrypt_raw(&self.ciphertext, &self.iv)
    }

    /// Decrypt and classify the plaintext back into a payload.
    pub fn decrypt_payload(&self, key: &SymmetricKey) -> Result<Payload> {
        Ok(Payload::classify(self.decrypt(key)?))
    }

    /// Content hash of the raw ciphertext bytes.
    ///
    /// This is the `cipher_hash` that gets anchored on the ledger.
    pub fn cipher_hash(&self) -> ContentHash {
        ContentHash::digest(&self.ciphertext)
    }

    /// Serialize to the JSON wire form.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("JSON serialization failed")
    }

    /// Deserialize from the JSON wire form.
    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| CryptoError::MalformedRecord(e.to_string()))
    }

    /// Get the size of the ciphertext.
    pub fn ciphertext_len(&self) -> usize {
        self.ciphertext.len()
    }
}

mod b64_bytes {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let s = String::deserialize(deserializer)?;
        BASE64
            .decode(s.as_bytes())
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}
