//! Error types for hashmoor crypto operations.

use thiserror::Error;

/// Errors that can occur during encryption, decryption, and key handling.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Symmetric key material has the wrong length.
    #[error("invalid key length: expected {expected} bytes, got {got}")]
    KeyLength { expected: usize, got: usize },

    /// Padding check failed: wrong key or corrupted ciphertext.
    #[error("padding check failed")]
    Padding,

    /// A wrap or unwrap was attempted without the needed key half.
    #[error("missing key material: {0}")]
    NoKey(String),

    /// Asymmetric decryption failed. Carries no cause detail.
    #[error("asymmetric decryption failed")]
    Decryption,

    /// Encryption failed.
    #[error("encryption error: {0}")]
    Encryption(String),

    /// Key generation failed.
    #[error("key generation error: {0}")]
    KeyGeneration(String),

    /// Malformed key material: bad PEM, base64, or envelope.
    #[error("malformed key material: {0}")]
    KeyFormat(String),

    /// Malformed encrypted record.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// Core error.
    #[error("core error: {0}")]
    Core(#[from] hashmoor_core::CoreError),
}

/// Result type for crypto operations.
pub type Result<T> = std::result::Result<T, CryptoError>;
