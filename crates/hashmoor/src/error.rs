//! Error types for the facade.

use hashmoor_core::CoreError;
use hashmoor_crypto::CryptoError;
use hashmoor_ledger::LedgerError;
use thiserror::Error;

/// Errors that can surface through the Hashmoor facade.
///
/// Every lower layer keeps its own closed error enum; the facade folds
/// them together so callers match on kind instead of strings.
#[derive(Debug, Error)]
pub enum HashmoorError {
    /// Encoding or identifier error from the core primitives.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Cipher, key-wrap, or record-format error.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Ledger error.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Filesystem error while handling artifacts.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl HashmoorError {
    /// Whether a failed ledger write is safe to retry.
    ///
    /// Only transport-level failures qualify, and even then the caller
    /// must confirm via `retrieve` that the original call did not land:
    /// a landed `store` retried blindly fails with `DuplicateId`.
    pub fn is_retry_safe(&self) -> bool {
        matches!(
            self,
            HashmoorError::Ledger(LedgerError::Transaction(_))
                | HashmoorError::Ledger(LedgerError::TransactionTimeout { .. })
        )
    }
}

/// Result type for facade operations.
pub type Result<T> = std::result::Result<T, HashmoorError>;
