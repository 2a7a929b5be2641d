//! Ledger trait: the abstract interface for anchored references.
//!
//! This trait lets the anchor client be ledger-agnostic. Implementations
//! here are development collaborators (in-memory and SQLite); a production
//! backend would speak to a real chain behind the same interface.

use async_trait::async_trait;
use hashmoor_core::{Address, ContentHash, DataId};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Receipt for a confirmed ledger write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    /// Hash of the signed call (`sha256(call_bytes || signature)`).
    pub tx_hash: ContentHash,
    /// Height at which the write was included.
    pub block_number: u64,
    /// Flat per-call-kind cost.
    pub gas_used: u64,
}

/// An anchored reference, as the ledger returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataReference {
    pub data_id: DataId,
    /// SHA-256 of the raw ciphertext bytes.
    pub cipher_hash: ContentHash,
    /// SHA-256 of the canonical metadata envelope.
    pub metadata_hash: ContentHash,
    /// Ledger-assigned anchor time (Unix seconds).
    pub timestamp: u64,
    pub owner: Address,
}

/// The Ledger trait: async interface for anchoring and access control.
///
/// # Design Notes
///
/// - **No overwrites**: `store` on a taken id fails with `DuplicateId`;
///   re-anchoring goes through `update`, which is owner-only.
/// - **Authorization**: `retrieve` admits the owner and addresses holding
///   a live grant. `check_access` reads the grant relation only; ownership
///   is not an implicit grant.
/// - **Idempotent grants**: grant/revoke flip a per-(id, address) flag and
///   never delete the pair. Repeating either is not an error.
/// - **Signed writes**: handles without a signing identity serve reads
///   only; their writes fail with `Transaction`.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Anchor a new reference under `id`.
    async fn store(
        &self,
        id: &DataId,
        cipher_hash: &ContentHash,
        metadata_hash: &ContentHash,
    ) -> Result<TxReceipt>;

    /// Re-anchor fresh hashes under an existing id, refreshing its
    /// timestamp. Owner only.
    async fn update(
        &self,
        id: &DataId,
        cipher_hash: &ContentHash,
        metadata_hash: &ContentHash,
    ) -> Result<TxReceipt>;

    /// Fetch the reference for `id`. Owner or granted addresses only.
    async fn retrieve(&self, id: &DataId) -> Result<DataReference>;

    /// Grant `grantee` read access to `id`. Owner only, idempotent.
    async fn grant_access(&self, id: &DataId, grantee: &Address) -> Result<TxReceipt>;

    /// Revoke `grantee`'s access to `id`. Owner only, idempotent.
    async fn revoke_access(&self, id: &DataId, grantee: &Address) -> Result<TxReceipt>;

    /// Whether `address` holds a live grant on `id`. Never errors on
    /// unknown pairs; the default state is revoked.
    async fn check_access(&self, id: &DataId, address: &Address) -> Result<bool>;

    /// All anchored ids, in anchor order.
    async fn list_all_ids(&self) -> Result<Vec<DataId>>;

    /// Ids owned by `owner`, in anchor order.
    async fn list_owned_ids(&self, owner: &Address) -> Result<Vec<DataId>>;

    /// The address this handle acts as.
    fn caller(&self) -> Address;
}
