//! Error types for ledger operations.

use hashmoor_core::DataId;
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A reference with this id is already anchored. Anchored references
    /// are never overwritten.
    #[error("data id already anchored: {0}")]
    DuplicateId(DataId),

    /// No reference with this id.
    #[error("data id not found: {0}")]
    NotFound(DataId),

    /// The caller lacks the rights for this operation.
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    /// Submission or signing failed before confirmation. The write may or
    /// may not have landed; callers must re-check `retrieve` before
    /// retrying.
    #[error("transaction failed: {0}")]
    Transaction(String),

    /// No confirmation within the configured bound. Same retry contract
    /// as `Transaction`.
    #[error("transaction not confirmed after {after_ms} ms")]
    TransactionTimeout { after_ms: u64 },

    /// A signing key could not be parsed.
    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    /// A transaction signature did not verify.
    #[error("signature verification failed")]
    InvalidSignature,

    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
