//! Record sealing: plaintext in, encrypted record plus metadata out.
//!
//! The builder composes the hash, cipher, and wrap layers into one pure
//! transformation. It touches no files; persisting the results is the
//! caller's concern.

use chrono::{DateTime, Utc};
use hashmoor_core::{ContentHash, Metadata, Payload};
use std::path::Path;

use crate::cipher::SymmetricKey;
use crate::error::Result;
use crate::keyfile::{KeyBundle, WrappedKeyEnvelope};
use crate::record::EncryptedRecord;
use crate::wrap::{wrap_key_pem, RsaKeyPair};

/// How the symmetric key leaves the seal operation.
#[derive(Debug, Clone)]
pub enum KeyWrap {
    /// Hand the symmetric key back raw.
    None,
    /// Wrap under an existing recipient public key (SPKI PEM). The
    /// resulting bundle carries no private half.
    Recipient(String),
    /// Generate a fresh RSA pair and wrap under it. The bundle carries
    /// both halves.
    Generated,
}

/// Everything produced by sealing one payload.
#[derive(Debug)]
pub struct SealedRecord {
    /// The encrypted record (IV + ciphertext).
    pub record: EncryptedRecord,

    /// Provenance envelope. `data_hash` is the plaintext hash.
    pub metadata: Metadata,

    /// Key material for the caller.
    pub keys: KeyBundle,
}

/// Builder for sealing a payload into an encrypted record.
pub struct RecordBuilder {
    original_filename: String,
    encrypted_filename: Option<String>,
    key: Option<SymmetricKey>,
    wrap: KeyWrap,
    timestamp: Option<DateTime<Utc>>,
}

impl RecordBuilder {
    /// Start building a record for the named source document.
    pub fn new(original_filename: impl Into<String>) -> Self {
        Self {
            original_filename: original_filename.into(),
            encrypted_filename: None,
            key: None,
            wrap: KeyWrap::None,
            timestamp: None,
        }
    }

    /// Override the encrypted filename (defaults to `<stem>.enc`).
    pub fn encrypted_filename(mut self, name: impl Into<String>) -> Self {
        self.encrypted_filename = Some(name.into());
        self
    }

    /// Encrypt under an existing key instead of a fresh one.
    pub fn key(mut self, key: SymmetricKey) -> Self {
        self.key = Some(key);
        self
    }

    /// Choose how the key leaves the operation.
    pub fn wrap(mut self, wrap: KeyWrap) -> Self {
        self.wrap = wrap;
        self
    }

    /// Fix the metadata timestamp (defaults to now).
    pub fn timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = Some(at);
        self
    }

    /// Seal the payload: hash, encrypt, wrap.
    pub fn seal(self, payload: &Payload) -> Result<SealedRecord> {
        let plaintext = payload.to_bytes()?;
        let data_hash = ContentHash::digest(&plaintext);

        let key = self.key.unwrap_or_else(SymmetricKey::generate);
        let record = EncryptedRecord::encrypt(&plaintext, &key);

        let encrypted_filename = self
            .encrypted_filename
            .unwrap_or_else(|| default_encrypted_name(&self.original_filename));
        let metadata = Metadata::new(
            self.original_filename,
            encrypted_filename,
            data_hash,
            self.timestamp.unwrap_or_else(Utc::now),
        );

        let keys = match self.wrap {
            KeyWrap::None => KeyBundle::Raw(key),
            KeyWrap::Recipient(public_pem) => {
                let wrapped = wrap_key_pem(&key, &public_pem)?;
                KeyBundle::Wrapped(WrappedKeyEnvelope::new(&wrapped, public_pem, None))
            }
            KeyWrap::Generated => {
                let pair = RsaKeyPair::generate()?;
                let wrapped = pair.wrap_key(&key)?;
                KeyBundle::Wrapped(WrappedKeyEnvelope::new(
                    &wrapped,
                    pair.public_pem()?,
                    Some(pair.private_pem()?),
                ))
            }
        };

        Ok(SealedRecord {
            record,
            metadata,
            keys,
        })
    }
}

/// `tracks.json` becomes `tracks.enc`; extensionless names keep the stem.
fn default_encrypted_name(original: &str) -> String {
    let stem = Path::new(original)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| original.to_string());
    format!("{}.enc", stem)
}
