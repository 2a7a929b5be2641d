//! Key bundles: the key material a caller holds after sealing.
//!
//! The persisted `.key` artifact is either a bare base64 symmetric key or
//! a JSON envelope carrying an RSA-wrapped key. The kind is auto-detected
//! on read. Persisting bundles next to ciphertext is a development-mode
//! fallback; production callers keep them in real key storage.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::cipher::SymmetricKey;
use crate::error::{CryptoError, Result};
use crate::wrap::{unwrap_key_pem, WrappedKey};

/// JSON envelope for an RSA-wrapped symmetric key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedKeyEnvelope {
    /// Base64 OAEP ciphertext of the symmetric key.
    pub encrypted_aes_key: String,

    /// SPKI PEM of the wrapping public key.
    pub rsa_public_key: String,

    /// PKCS#8 PEM of the private half. Absent when wrapping used an
    /// external recipient key.
    #[serde(default)]
    pub rsa_private_key: Option<String>,
}

impl WrappedKeyEnvelope {
    /// Build an envelope from a wrapped key and its PEMs.
    pub fn new(
        wrapped: &WrappedKey,
        rsa_public_key: impl Into<String>,
        rsa_private_key: Option<String>,
    ) -> Self {
        Self {
            encrypted_aes_key: wrapped.to_base64(),
            rsa_public_key: rsa_public_key.into(),
            rsa_private_key,
        }
    }

    /// Decode the wrapped key bytes.
    pub fn wrapped_key(&self) -> Result<WrappedKey> {
        WrappedKey::from_base64(&self.encrypted_aes_key)
    }

    /// Whether the private half travels with the envelope.
    pub fn has_private_key(&self) -> bool {
        self.rsa_private_key.is_some()
    }
}

impl fmt::Debug for WrappedKeyEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrappedKeyEnvelope")
            .field("encrypted_aes_key_len", &self.encrypted_aes_key.len())
            .field("has_private_key", &self.has_private_key())
            .finish()
    }
}

/// Key material handed back to the caller of a seal operation.
pub enum KeyBundle {
    /// The symmetric key itself, persisted as bare base64.
    Raw(SymmetricKey),
    /// An RSA-wrapped key envelope.
    Wrapped(WrappedKeyEnvelope),
}

impl KeyBundle {
    /// Serialize to the `.key` file form.
    pub fn to_file_string(&self) -> String {
        match self {
            KeyBundle::Raw(key) => key.to_base64(),
            KeyBundle::Wrapped(envelope) => {
                serde_json::to_string(envelope).expect("JSON serialization failed")
            }
        }
    }

    /// Parse a `.key` file, auto-detecting the kind.
    ///
    /// Content starting with `{` parses as an envelope; anything else must
    /// be a base64 symmetric key.
    pub fn from_file_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.starts_with('{') {
            let envelope: WrappedKeyEnvelope = serde_json::from_str(trimmed)
                .map_err(|e| CryptoError::KeyFormat(format!("bad key envelope: {}", e)))?;
            Ok(KeyBundle::Wrapped(envelope))
        } else {
            SymmetricKey::from_base64(trimmed).map(KeyBundle::Raw)
        }
    }

    /// Recover the symmetric key.
    ///
    /// For a wrapped bundle this unwraps with the envelope's private half
    /// and fails with [`CryptoError::NoKey`] when it is absent.
    pub fn symmetric_key(&self) -> Result<SymmetricKey> {
        match self {
            KeyBundle::Raw(key) => Ok(key.clone()),
            KeyBundle::Wrapped(envelope) => {
                let private = envelope.rsa_private_key.as_deref().ok_or_else(|| {
                    CryptoError::NoKey("wrapped key bundle carries no private key".into())
                })?;
                unwrap_key_pem(&envelope.wrapped_key()?, private)
            }
        }
    }

    pub fn is_wrapped(&self) -> bool {
        matches!(self, KeyBundle::Wrapped(_))
    }
}

impl fmt::Debug for KeyBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyBundle::Raw(_) => f.write_str("KeyBundle::Raw(..)"),
            KeyBundle::Wrapped(envelope) => write!(f, "KeyBundle::{:?}", envelope),
        }
    }
}
