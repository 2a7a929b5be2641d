//! Anchoring client: the main read/write surface over a ledger backend.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use hashmoor_core::{Address, ContentHash, DataId};
use hashmoor_ledger::{DataReference, Ledger, LedgerError, TxReceipt};

use crate::access::AccessController;
use crate::config::DEFAULT_CONFIRM_TIMEOUT_MS;
use crate::error::Result;

/// Client for anchoring encrypted-data fingerprints on a ledger.
///
/// Generic over the [`Ledger`] backend, which it holds behind an `Arc`:
/// clients are cheap to clone and share across tasks. Every ledger call
/// is bounded by the configured confirmation timeout.
#[derive(Clone)]
pub struct AnchorClient<L: Ledger> {
    ledger: Arc<L>,
    confirm_timeout: Duration,
}

impl<L: Ledger> AnchorClient<L> {
    /// Create a client over a ledger backend with the default timeout.
    pub fn new(ledger: L) -> Self {
        Self {
            ledger: Arc::new(ledger),
            confirm_timeout: Duration::from_millis(DEFAULT_CONFIRM_TIMEOUT_MS),
        }
    }

    /// Set the confirmation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.confirm_timeout = timeout;
        self
    }

    /// The backend.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// The address this client acts as.
    pub fn caller(&self) -> Address {
        self.ledger.caller()
    }

    /// An access controller sharing this client's backend and timeout.
    pub fn access(&self) -> AccessController<L> {
        AccessController::from_shared(Arc::clone(&self.ledger), self.confirm_timeout)
    }

    /// Derive a data id from a label and a timestamp in milliseconds.
    ///
    /// Deterministic: the same inputs always yield the same id.
    pub fn generate_data_id(&self, label: &str, timestamp: i64) -> DataId {
        DataId::derive(label, timestamp)
    }

    /// Anchor a new data reference, waiting for confirmation.
    ///
    /// Fails with `DuplicateId` if the id is already anchored.
    ///
    /// # Retry contract
    ///
    /// A `Transaction` or `TransactionTimeout` error means the call may or
    /// may not have landed. Re-check with [`retrieve`](Self::retrieve)
    /// before retrying: a retry after a landed write fails with
    /// `DuplicateId`. No other error kind is retry-safe.
    pub async fn anchor(
        &self,
        id: &DataId,
        cipher_hash: &ContentHash,
        metadata_hash: &ContentHash,
    ) -> Result<TxReceipt> {
        let receipt = self
            .confirm(self.ledger.store(id, cipher_hash, metadata_hash))
            .await?;
        tracing::info!(id = %id, block = receipt.block_number, "anchored data reference");
        Ok(receipt)
    }

    /// Re-anchor fresh hashes under an existing id. Owner only.
    ///
    /// Refreshes the on-ledger timestamp. Same retry contract as
    /// [`anchor`](Self::anchor).
    pub async fn update(
        &self,
        id: &DataId,
        cipher_hash: &ContentHash,
        metadata_hash: &ContentHash,
    ) -> Result<TxReceipt> {
        let receipt = self
            .confirm(self.ledger.update(id, cipher_hash, metadata_hash))
            .await?;
        tracing::info!(id = %id, block = receipt.block_number, "re-anchored data reference");
        Ok(receipt)
    }

    /// Fetch the anchored reference for an id.
    ///
    /// The ledger authorizes the read: the caller must be the owner or
    /// hold a grant.
    pub async fn retrieve(&self, id: &DataId) -> Result<DataReference> {
        self.confirm(self.ledger.retrieve(id)).await
    }

    /// List every anchored id, in anchor order.
    pub async fn list_all(&self) -> Result<Vec<DataId>> {
        self.confirm(self.ledger.list_all_ids()).await
    }

    /// List ids anchored by this client's address, in anchor order.
    pub async fn list_owned(&self) -> Result<Vec<DataId>> {
        let owner = self.ledger.caller();
        self.confirm(self.ledger.list_owned_ids(&owner)).await
    }

    async fn confirm<T>(
        &self,
        call: impl Future<Output = hashmoor_ledger::Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.confirm_timeout, call).await {
            Ok(outcome) => Ok(outcome?),
            Err(_) => {
                let after_ms = self.confirm_timeout.as_millis() as u64;
                tracing::warn!(after_ms, "ledger call timed out");
                Err(LedgerError::TransactionTimeout { after_ms }.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HashmoorError;
    use hashmoor_ledger::{MemoryLedger, Signer};

    fn client() -> AnchorClient<MemoryLedger> {
        let ledger = MemoryLedger::new().with_signer(Signer::from_seed(&[1; 32]));
        AnchorClient::new(ledger)
    }

    fn hashes() -> (ContentHash, ContentHash) {
        (
            ContentHash::digest(b"ciphertext"),
            ContentHash::digest(b"metadata"),
        )
    }

    #[tokio::test]
    async fn test_anchor_and_retrieve() {
        let client = client();
        let id = DataId::new("doc1").unwrap();
        let (cipher, meta) = hashes();

        let receipt = client.anchor(&id, &cipher, &meta).await.unwrap();
        assert_eq!(receipt.block_number, 1);

        let reference = client.retrieve(&id).await.unwrap();
        assert_eq!(reference.cipher_hash, cipher);
        assert_eq!(reference.metadata_hash, meta);
        assert_eq!(reference.owner, client.caller());
    }

    #[tokio::test]
    async fn test_duplicate_anchor_not_retry_safe() {
        let client = client();
        let id = DataId::new("doc1").unwrap();
        let (cipher, meta) = hashes();

        client.anchor(&id, &cipher, &meta).await.unwrap();
        let err = client.anchor(&id, &cipher, &meta).await.unwrap_err();
        assert!(matches!(
            err,
            HashmoorError::Ledger(LedgerError::DuplicateId(_))
        ));
        assert!(!err.is_retry_safe());
    }

    #[tokio::test]
    async fn test_update_through_client() {
        let client = client();
        let id = DataId::new("doc1").unwrap();
        let (cipher, meta) = hashes();
        client.anchor(&id, &cipher, &meta).await.unwrap();

        let cipher2 = ContentHash::digest(b"ciphertext v2");
        client.update(&id, &cipher2, &meta).await.unwrap();
        assert_eq!(client.retrieve(&id).await.unwrap().cipher_hash, cipher2);
    }

    #[tokio::test]
    async fn test_listings() {
        let client = client();
        let (cipher, meta) = hashes();
        for name in ["a", "b"] {
            client
                .anchor(&DataId::new(name).unwrap(), &cipher, &meta)
                .await
                .unwrap();
        }

        assert_eq!(client.list_all().await.unwrap().len(), 2);
        assert_eq!(client.list_owned().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_generate_data_id_deterministic() {
        let client = client();
        let a = client.generate_data_id("tracks.json", 1_736_870_400_000);
        let b = client.generate_data_id("tracks.json", 1_736_870_400_000);
        let c = client.generate_data_id("tracks.json", 1_736_870_400_001);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
