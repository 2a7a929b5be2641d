//! Fault-injecting ledger wrappers.
//!
//! Deterministic failures for exercising retry contracts and timeout
//! handling without a real flaky network. `FlakyLedger` models the
//! nastiest transport failure: the write lands, the confirmation is
//! lost. `SlowLedger` delays every call by a fixed amount.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use hashmoor_core::{Address, ContentHash, DataId};
use hashmoor_ledger::{DataReference, Ledger, LedgerError, Result, TxReceipt};

/// Wraps a ledger so the next `failures` writes land but report a
/// transport failure instead of their receipt.
pub struct FlakyLedger<L> {
    inner: L,
    failures: AtomicU32,
}

impl<L> FlakyLedger<L> {
    pub fn new(inner: L, failures: u32) -> Self {
        Self {
            inner,
            failures: AtomicU32::new(failures),
        }
    }

    /// Failures not yet consumed.
    pub fn remaining_failures(&self) -> u32 {
        self.failures.load(Ordering::Relaxed)
    }

    fn take_failure(&self) -> bool {
        self.failures
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok()
    }

    fn swallow(&self, receipt: TxReceipt) -> Result<TxReceipt> {
        if self.take_failure() {
            return Err(LedgerError::Transaction(
                "connection reset before confirmation".into(),
            ));
        }
        Ok(receipt)
    }
}

#[async_trait]
impl<L: Ledger> Ledger for FlakyLedger<L> {
    async fn store(
        &self,
        id: &DataId,
        cipher_hash: &ContentHash,
        metadata_hash: &ContentHash,
    ) -> Result<TxReceipt> {
        let receipt = self.inner.store(id, cipher_hash, metadata_hash).await?;
        self.swallow(receipt)
    }

    async fn update(
        &self,
        id: &DataId,
        cipher_hash: &ContentHash,
        metadata_hash: &ContentHash,
    ) -> Result<TxReceipt> {
        let receipt = self.inner.update(id, cipher_hash, metadata_hash).await?;
        self.swallow(receipt)
    }

    async fn retrieve(&self, id: &DataId) -> Result<DataReference> {
        self.inner.retrieve(id).await
    }

    async fn grant_access(&self, id: &DataId, grantee: &Address) -> Result<TxReceipt> {
        let receipt = self.inner.grant_access(id, grantee).await?;
        self.swallow(receipt)
    }

    async fn revoke_access(&self, id: &DataId, grantee: &Address) -> Result<TxReceipt> {
        let receipt = self.inner.revoke_access(id, grantee).await?;
        self.swallow(receipt)
    }

    async fn check_access(&self, id: &DataId, address: &Address) -> Result<bool> {
        self.inner.check_access(id, address).await
    }

    async fn list_all_ids(&self) -> Result<Vec<DataId>> {
        self.inner.list_all_ids().await
    }

    async fn list_owned_ids(&self, owner: &Address) -> Result<Vec<DataId>> {
        self.inner.list_owned_ids(owner).await
    }

    fn caller(&self) -> Address {
        self.inner.caller()
    }
}

/// Wraps a ledger so every call sleeps before reaching the backend.
pub struct SlowLedger<L> {
    inner: L,
    delay: Duration,
}

impl<L> SlowLedger<L> {
    pub fn new(inner: L, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl<L: Ledger> Ledger for SlowLedger<L> {
    async fn store(
        &self,
        id: &DataId,
        cipher_hash: &ContentHash,
        metadata_hash: &ContentHash,
    ) -> Result<TxReceipt> {
        tokio::time::sleep(self.delay).await;
        self.inner.store(id, cipher_hash, metadata_hash).await
    }

    async fn update(
        &self,
        id: &DataId,
        cipher_hash: &ContentHash,
        metadata_hash: &ContentHash,
    ) -> Result<TxReceipt> {
        tokio::time::sleep(self.delay).await;
        self.inner.update(id, cipher_hash, metadata_hash).await
    }

    async fn retrieve(&self, id: &DataId) -> Result<DataReference> {
        tokio::time::sleep(self.delay).await;
        self.inner.retrieve(id).await
    }

    async fn grant_access(&self, id: &DataId, grantee: &Address) -> Result<TxReceipt> {
        tokio::time::sleep(self.delay).await;
        self.inner.grant_access(id, grantee).await
    }

    async fn revoke_access(&self, id: &DataId, grantee: &Address) -> Result<TxReceipt> {
        tokio::time::sleep(self.delay).await;
        self.inner.revoke_access(id, grantee).await
    }

    async fn check_access(&self, id: &DataId, address: &Address) -> Result<bool> {
        tokio::time::sleep(self.delay).await;
        self.inner.check_access(id, address).await
    }

    async fn list_all_ids(&self) -> Result<Vec<DataId>> {
        tokio::time::sleep(self.delay).await;
        self.inner.list_all_ids().await
    }

    async fn list_owned_ids(&self, owner: &Address) -> Result<Vec<DataId>> {
        tokio::time::sleep(self.delay).await;
        self.inner.list_owned_ids(owner).await
    }

    fn caller(&self) -> Address {
        self.inner.caller()
    }
}
