//! Access control surface: grant, revoke, check.
//!
//! A ledger-backed two-state machine per `(data id, address)` pair:
//! revoked (the default) or granted. There is deliberately no local
//! cache; `check` hits the ledger every time, since a stale allow is an
//! access-control hole.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use hashmoor_core::{Address, DataId};
use hashmoor_ledger::{Ledger, LedgerError, TxReceipt};

use crate::config::DEFAULT_CONFIRM_TIMEOUT_MS;
use crate::error::Result;

/// Controller for per-address grants on anchored data.
#[derive(Clone)]
pub struct AccessController<L: Ledger> {
    ledger: Arc<L>,
    confirm_timeout: Duration,
}

impl<L: Ledger> AccessController<L> {
    /// Create a controller over a ledger backend with the default timeout.
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

    pub(crate) fn from_shared(ledger: Arc<L>, confirm_timeout: Duration) -> Self {
        Self {
            ledger,
            confirm_timeout,
        }
    }

    /// Grant `grantee` read access to `id`. Owner only, idempotent.
    pub async fn grant(&self, id: &DataId, grantee: &Address) -> Result<TxReceipt> {
        let receipt = self.confirm(self.ledger.grant_access(id, grantee)).await?;
        tracing::info!(id = %id, grantee = %grantee, "granted access");
        Ok(receipt)
    }

    /// Revoke a grant. Owner only, idempotent.
    pub async fn revoke(&self, id: &DataId, grantee: &Address) -> Result<TxReceipt> {
        let receipt = self.confirm(self.ledger.revoke_access(id, grantee)).await?;
        tracing::info!(id = %id, grantee = %grantee, "revoked access");
        Ok(receipt)
    }

    /// Whether `address` currently holds a grant on `id`.
    ///
    /// Consults only the grant relation: owners are not implicitly
    /// granted here, and unknown ids read as not granted.
    pub async fn check(&self, id: &DataId, address: &Address) -> Result<bool> {
        self.confirm(self.ledger.check_access(id, address)).await
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
    use crate::anchor::AnchorClient;
    use crate::error::HashmoorError;
    use hashmoor_core::ContentHash;
    use hashmoor_ledger::{MemoryLedger, Signer};

    async fn anchored_client() -> (AnchorClient<MemoryLedger>, DataId) {
        let ledger = MemoryLedger::new().with_signer(Signer::from_seed(&[1; 32]));
        let client = AnchorClient::new(ledger);
        let id = DataId::new("doc1").unwrap();
        client
            .anchor(
                &id,
                &ContentHash::digest(b"ciphertext"),
                &ContentHash::digest(b"metadata"),
            )
            .await
            .unwrap();
        (client, id)
    }

    #[tokio::test]
    async fn test_grant_check_revoke_lifecycle() {
        let (client, id) = anchored_client().await;
        let access = client.access();
        let grantee = Address::from_bytes([0xee; 20]);

        assert!(!access.check(&id, &grantee).await.unwrap());

        access.grant(&id, &grantee).await.unwrap();
        assert!(access.check(&id, &grantee).await.unwrap());

        // Idempotent in both directions.
        access.grant(&id, &grantee).await.unwrap();
        assert!(access.check(&id, &grantee).await.unwrap());

        access.revoke(&id, &grantee).await.unwrap();
        assert!(!access.check(&id, &grantee).await.unwrap());

        access.revoke(&id, &grantee).await.unwrap();
        assert!(!access.check(&id, &grantee).await.unwrap());
    }

    #[tokio::test]
    async fn test_owner_not_implicitly_granted() {
        let (client, id) = anchored_client().await;
        let access = client.access();
        assert!(!access.check(&id, &client.caller()).await.unwrap());
    }

    #[tokio::test]
    async fn test_non_owner_grant_rejected() {
        let (client, id) = anchored_client().await;

        let intruder = AccessController::new(
            MemoryLedger::new().with_signer(Signer::from_seed(&[2; 32])),
        );
        // Different backend entirely; the anchor is unknown there.
        let err = intruder
            .grant(&id, &Address::from_bytes([0xee; 20]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HashmoorError::Ledger(LedgerError::NotFound(_))
        ));

        // Same backend, wrong identity.
        let shared = client.ledger().clone().with_signer(Signer::from_seed(&[2; 32]));
        let err = AccessController::new(shared)
            .grant(&id, &Address::from_bytes([0xee; 20]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HashmoorError::Ledger(LedgerError::NotAuthorized(_))
        ));
        assert!(!client
            .access()
            .check(&id, &Address::from_bytes([0xee; 20]))
            .await
            .unwrap());
    }
}
