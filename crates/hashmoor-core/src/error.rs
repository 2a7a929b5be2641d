//! Error types for hashmoor core primitives.

use thiserror::Error;

/// Errors from hashing, canonical encoding, and identifier validation.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("invalid data id: {0}")]
    InvalidDataId(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid hash: {0}")]
    InvalidHash(String),
}
