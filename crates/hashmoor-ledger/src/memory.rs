//! In-memory implementation of the Ledger trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence. Handles are cheap
//! clones sharing one state; rebind them with `with_signer` or
//! `with_caller` to act as different principals.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use hashmoor_core::{Address, ContentHash, DataId};

use crate::calls::{LedgerCall, TxRecord};
use crate::error::{LedgerError, Result};
use crate::signer::Signer;
use crate::traits::{DataReference, Ledger, TxReceipt};

/// In-memory ledger implementation.
///
/// All data is lost when the last handle is dropped. Thread-safe via RwLock.
#[derive(Clone)]
pub struct MemoryLedger {
    state: Arc<RwLock<LedgerState>>,
    caller: Address,
    signer: Option<Arc<Signer>>,
}

struct LedgerState {
    /// Anchored references by id.
    references: HashMap<DataId, DataReference>,

    /// Ids in anchor order.
    order: Vec<DataId>,

    /// Grant relation. Pairs are flipped, never removed.
    grants: HashMap<(DataId, Address), bool>,

    /// Append-only log of signed writes.
    log: Vec<TxRecord>,

    /// Current chain height.
    height: u64,
}

impl MemoryLedger {
    /// Create an empty ledger with an anonymous read-only handle.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(LedgerState {
                references: HashMap::new(),
                order: Vec::new(),
                grants: HashMap::new(),
                log: Vec::new(),
                height: 0,
            })),
            caller: Address::ZERO,
            signer: None,
        }
    }

    /// Rebind this handle to a signing identity. The handle acts as the
    /// signer's address and may write.
    pub fn with_signer(mut self, signer: Signer) -> Self {
        self.caller = signer.address();
        self.signer = Some(Arc::new(signer));
        self
    }

    /// Rebind this handle to a bare caller address. Reads only; writes
    /// fail with `Transaction`.
    pub fn with_caller(mut self, caller: Address) -> Self {
        self.caller = caller;
        self.signer = None;
        self
    }

    /// Snapshot of the signed transaction log.
    pub fn transaction_log(&self) -> Vec<TxRecord> {
        self.state.read().unwrap().log.clone()
    }

    /// Current chain height.
    pub fn height(&self) -> u64 {
        self.state.read().unwrap().height
    }

    fn signer(&self) -> Result<&Arc<Signer>> {
        self.signer.as_ref().ok_or_else(|| {
            LedgerError::Transaction("no signing identity bound to this ledger handle".into())
        })
    }

    fn flip_access(&self, id: &DataId, grantee: &Address, granted: bool) -> Result<TxReceipt> {
        let signer = self.signer()?;
        let mut state = self.state.write().unwrap();

        let owner = match state.references.get(id) {
            None => return Err(LedgerError::NotFound(id.clone())),
            Some(reference) => reference.owner,
        };
        if owner != self.caller {
            return Err(LedgerError::NotAuthorized(format!(
                "{} does not own {}",
                self.caller, id
            )));
        }

        let call = if granted {
            LedgerCall::GrantAccess {
                data_id: id.clone(),
                grantee: *grantee,
            }
        } else {
            LedgerCall::RevokeAccess {
                data_id: id.clone(),
                grantee: *grantee,
            }
        };

        state.height += 1;
        let record = TxRecord::seal(call, signer, state.height, now_secs());
        let receipt = record.receipt();

        state.grants.insert((id.clone(), *grantee), granted);
        state.log.push(record);

        Ok(receipt)
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn store(
        &self,
        id: &DataId,
        cipher_hash: &ContentHash,
        metadata_hash: &ContentHash,
    ) -> Result<TxReceipt> {
        let signer = self.signer()?;
        let mut state = self.state.write().unwrap();

        if state.references.contains_key(id) {
            return Err(LedgerError::DuplicateId(id.clone()));
        }

        let now = now_secs();
        let call = LedgerCall::Store {
            data_id: id.clone(),
            cipher_hash: *cipher_hash,
            metadata_hash: *metadata_hash,
        };
        state.height += 1;
        let record = TxRecord::seal(call, signer, state.height, now);
        let receipt = record.receipt();

        state.references.insert(
            id.clone(),
            DataReference {
                data_id: id.clone(),
                cipher_hash: *cipher_hash,
                metadata_hash: *metadata_hash,
                timestamp: now,
                owner: self.caller,
            },
        );
        state.order.push(id.clone());
        state.log.push(record);

        Ok(receipt)
    }

    async fn update(
        &self,
        id: &DataId,
        cipher_hash: &ContentHash,
        metadata_hash: &ContentHash,
    ) -> Result<TxReceipt> {
        let signer = self.signer()?;
        let mut state = self.state.write().unwrap();

        let owner = match state.references.get(id) {
            None => return Err(LedgerError::NotFound(id.clone())),
            Some(reference) => reference.owner,
        };
        if owner != self.caller {
            return Err(LedgerError::NotAuthorized(format!(
                "{} does not own {}",
                self.caller, id
            )));
        }

        let now = now_secs();
        let call = LedgerCall::Update {
            data_id: id.clone(),
            cipher_hash: *cipher_hash,
            metadata_hash: *metadata_hash,
        };
        state.height += 1;
        let record = TxRecord::seal(call, signer, state.height, now);
        let receipt = record.receipt();

        if let Some(reference) = state.references.get_mut(id) {
            reference.cipher_hash = *cipher_hash;
            reference.metadata_hash = *metadata_hash;
            reference.timestamp = now;
        }
        state.log.push(record);

        Ok(receipt)
    }

    async fn retrieve(&self, id: &DataId) -> Result<DataReference> {
        let state = self.state.read().unwrap();

        let reference = state
            .references
            .get(id)
            .ok_or_else(|| LedgerError::NotFound(id.clone()))?;

        let granted = state
            .grants
            .get(&(id.clone(), self.caller))
            .copied()
            .unwrap_or(false);
        if reference.owner != self.caller && !granted {
            return Err(LedgerError::NotAuthorized(format!(
                "{} may not read {}",
                self.caller, id
            )));
        }

        Ok(reference.clone())
    }

    async fn grant_access(&self, id: &DataId, grantee: &Address) -> Result<TxReceipt> {
        self.flip_access(id, grantee, true)
    }

    async fn revoke_access(&self, id: &DataId, grantee: &Address) -> Result<TxReceipt> {
        self.flip_access(id, grantee, false)
    }

    async fn check_access(&self, id: &DataId, address: &Address) -> Result<bool> {
        let state = self.state.read().unwrap();
        Ok(state
            .grants
            .get(&(id.clone(), *address))
            .copied()
            .unwrap_or(false))
    }

    async fn list_all_ids(&self) -> Result<Vec<DataId>> {
        let state = self.state.read().unwrap();
        Ok(state.order.clone())
    }

    async fn list_owned_ids(&self, owner: &Address) -> Result<Vec<DataId>> {
        let state = self.state.read().unwrap();
        Ok(state
            .order
            .iter()
            .filter(|id| {
                state
                    .references
                    .get(*id)
                    .map(|r| r.owner == *owner)
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    fn caller(&self) -> Address {
        self.caller
    }
}

/// Get current time in Unix seconds.
fn now_secs() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchored_ledger() -> (MemoryLedger, Signer, DataId) {
        let signer = Signer::from_seed(&[1; 32]);
        let ledger = MemoryLedger::new().with_signer(signer.clone());
        let id = DataId::new("doc1").unwrap();
        (ledger, signer, id)
    }

    fn hashes() -> (ContentHash, ContentHash) {
        (
            ContentHash::digest(b"ciphertext"),
            ContentHash::digest(b"metadata"),
        )
    }

    #[tokio::test]
    async fn test_store_and_retrieve() {
        let (ledger, signer, id) = anchored_ledger();
        let (cipher, meta) = hashes();

        let receipt = ledger.store(&id, &cipher, &meta).await.unwrap();
        assert_eq!(receipt.block_number, 1);
        assert_eq!(receipt.gas_used, crate::calls::gas::STORE);

        let reference = ledger.retrieve(&id).await.unwrap();
        assert_eq!(reference.data_id, id);
        assert_eq!(reference.cipher_hash, cipher);
        assert_eq!(reference.metadata_hash, meta);
        assert_eq!(reference.owner, signer.address());
        assert!(reference.timestamp > 0);
    }

    #[tokio::test]
    async fn test_duplicate_store_rejected() {
        let (ledger, _, id) = anchored_ledger();
        let (cipher, meta) = hashes();

        ledger.store(&id, &cipher, &meta).await.unwrap();
        let err = ledger.store(&id, &cipher, &meta).await.unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateId(d) if d == id));

        // The original anchor is untouched.
        let reference = ledger.retrieve(&id).await.unwrap();
        assert_eq!(reference.cipher_hash, cipher);
    }

    #[tokio::test]
    async fn test_retrieve_missing() {
        let (ledger, _, _) = anchored_ledger();
        let err = ledger.retrieve(&DataId::new("nope").unwrap()).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_retrieve_requires_grant() {
        let (ledger, _, id) = anchored_ledger();
        let (cipher, meta) = hashes();
        ledger.store(&id, &cipher, &meta).await.unwrap();

        let outsider = Address::from_bytes([0xee; 20]);
        let outsider_view = ledger.clone().with_caller(outsider);

        let err = outsider_view.retrieve(&id).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotAuthorized(_)));

        ledger.grant_access(&id, &outsider).await.unwrap();
        let reference = outsider_view.retrieve(&id).await.unwrap();
        assert_eq!(reference.data_id, id);

        ledger.revoke_access(&id, &outsider).await.unwrap();
        assert!(outsider_view.retrieve(&id).await.is_err());
    }

    #[tokio::test]
    async fn test_access_lifecycle() {
        let (ledger, _, id) = anchored_ledger();
        let (cipher, meta) = hashes();
        ledger.store(&id, &cipher, &meta).await.unwrap();

        let grantee = Address::from_bytes([0xee; 20]);
        assert!(!ledger.check_access(&id, &grantee).await.unwrap());

        ledger.grant_access(&id, &grantee).await.unwrap();
        assert!(ledger.check_access(&id, &grantee).await.unwrap());

        // Idempotent re-grant.
        ledger.grant_access(&id, &grantee).await.unwrap();
        assert!(ledger.check_access(&id, &grantee).await.unwrap());

        ledger.revoke_access(&id, &grantee).await.unwrap();
        assert!(!ledger.check_access(&id, &grantee).await.unwrap());

        // Idempotent re-revoke.
        ledger.revoke_access(&id, &grantee).await.unwrap();
        assert!(!ledger.check_access(&id, &grantee).await.unwrap());
    }

    #[tokio::test]
    async fn test_owner_is_not_implicitly_granted() {
        let (ledger, signer, id) = anchored_ledger();
        let (cipher, meta) = hashes();
        ledger.store(&id, &cipher, &meta).await.unwrap();

        // The owner reads fine, but the grant relation itself is empty.
        assert!(ledger.retrieve(&id).await.is_ok());
        assert!(!ledger.check_access(&id, &signer.address()).await.unwrap());
    }

    #[tokio::test]
    async fn test_non_owner_grant_rejected() {
        let (ledger, _, id) = anchored_ledger();
        let (cipher, meta) = hashes();
        ledger.store(&id, &cipher, &meta).await.unwrap();

        let intruder = Signer::from_seed(&[2; 32]);
        let intruder_addr = intruder.address();
        let intruder_view = ledger.clone().with_signer(intruder);

        let err = intruder_view
            .grant_access(&id, &intruder_addr)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotAuthorized(_)));
        assert!(!ledger.check_access(&id, &intruder_addr).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_replaces_hashes() {
        let (ledger, _, id) = anchored_ledger();
        let (cipher, meta) = hashes();
        ledger.store(&id, &cipher, &meta).await.unwrap();
        let before = ledger.retrieve(&id).await.unwrap();

        let cipher2 = ContentHash::digest(b"ciphertext v2");
        let meta2 = ContentHash::digest(b"metadata v2");
        let receipt = ledger.update(&id, &cipher2, &meta2).await.unwrap();
        assert_eq!(receipt.block_number, 2);
        assert_eq!(receipt.gas_used, crate::calls::gas::UPDATE);

        let after = ledger.retrieve(&id).await.unwrap();
        assert_eq!(after.cipher_hash, cipher2);
        assert_eq!(after.metadata_hash, meta2);
        assert!(after.timestamp >= before.timestamp);
    }

    #[tokio::test]
    async fn test_update_is_owner_only() {
        let (ledger, _, id) = anchored_ledger();
        let (cipher, meta) = hashes();
        ledger.store(&id, &cipher, &meta).await.unwrap();

        let intruder_view = ledger.clone().with_signer(Signer::from_seed(&[2; 32]));
        let err = intruder_view.update(&id, &cipher, &meta).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotAuthorized(_)));

        let missing = DataId::new("nope").unwrap();
        let err = ledger.update(&missing, &cipher, &meta).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_write_without_signer_fails() {
        let ledger = MemoryLedger::new();
        let (cipher, meta) = hashes();
        let id = DataId::new("doc1").unwrap();

        let err = ledger.store(&id, &cipher, &meta).await.unwrap_err();
        assert!(matches!(err, LedgerError::Transaction(_)));
        assert!(ledger.list_all_ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_listing_in_anchor_order() {
        let signer_a = Signer::from_seed(&[1; 32]);
        let signer_b = Signer::from_seed(&[2; 32]);
        let ledger = MemoryLedger::new();
        let view_a = ledger.clone().with_signer(signer_a.clone());
        let view_b = ledger.clone().with_signer(signer_b);
        let (cipher, meta) = hashes();

        for (view, name) in [(&view_a, "a1"), (&view_b, "b1"), (&view_a, "a2")] {
            view.store(&DataId::new(name).unwrap(), &cipher, &meta)
                .await
                .unwrap();
        }

        let all: Vec<String> = ledger
            .list_all_ids()
            .await
            .unwrap()
            .into_iter()
            .map(Into::into)
            .collect();
        assert_eq!(all, vec!["a1", "b1", "a2"]);

        let owned: Vec<String> = ledger
            .list_owned_ids(&signer_a.address())
            .await
            .unwrap()
            .into_iter()
            .map(Into::into)
            .collect();
        assert_eq!(owned, vec!["a1", "a2"]);
    }

    #[tokio::test]
    async fn test_log_is_signed_and_ordered() {
        let (ledger, signer, id) = anchored_ledger();
        let (cipher, meta) = hashes();
        let grantee = Address::from_bytes([0xee; 20]);

        ledger.store(&id, &cipher, &meta).await.unwrap();
        ledger.grant_access(&id, &grantee).await.unwrap();
        ledger.revoke_access(&id, &grantee).await.unwrap();

        let log = ledger.transaction_log();
        assert_eq!(log.len(), 3);
        for (i, record) in log.iter().enumerate() {
            record.verify().unwrap();
            assert_eq!(record.block_number, i as u64 + 1);
            assert_eq!(record.signer_address(), signer.address());
        }
        assert_eq!(ledger.height(), 3);

        // Failed writes never reach the log.
        assert!(ledger.store(&id, &cipher, &meta).await.is_err());
        assert_eq!(ledger.transaction_log().len(), 3);
    }
}
