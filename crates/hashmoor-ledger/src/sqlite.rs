//! SQLite implementation of the Ledger trait.
//!
//! The persistent development backend. Uses rusqlite with bundled SQLite,
//! wrapped in async via tokio::spawn_blocking. Like the in-memory ledger,
//! handles are cheap clones over one connection and can be rebound with
//! `with_signer` / `with_caller`.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hashmoor_core::{Address, ContentHash, DataId};
use rusqlite::{params, Connection, OptionalExtension};

use crate::calls::{LedgerCall, TxRecord};
use crate::error::{LedgerError, Result};
use crate::migration;
use crate::signer::{Ed25519PublicKey, Ed25519Signature, Signer};
use crate::traits::{DataReference, Ledger, TxReceipt};

/// SQLite-backed ledger implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking to
/// avoid blocking the async runtime.
#[derive(Clone)]
pub struct SqliteLedger {
    conn: Arc<Mutex<Connection>>,
    caller: Address,
    signer: Option<Arc<Signer>>,
}

impl SqliteLedger {
    /// Open a ledger database at the given path, creating and migrating
    /// it as needed. The handle starts anonymous and read-only.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(&path)?;
        migration::migrate(&mut conn)?;
        tracing::debug!(path = %path.as_ref().display(), "opened ledger database");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            caller: Address::ZERO,
            signer: None,
        })
    }

    /// Open an in-memory ledger database. Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            caller: Address::ZERO,
            signer: None,
        })
    }

    /// Rebind this handle to a signing identity. The handle acts as the
    /// signer's address and may write.
    pub fn with_signer(mut self, signer: Signer) -> Self {
        self.caller = signer.address();
        self.signer = Some(Arc::new(signer));
        self
    }

    /// Rebind this handle to a bare caller address. Reads only.
    pub fn with_caller(mut self, caller: Address) -> Self {
        self.caller = caller;
        self.signer = None;
        self
    }

    /// Read back the signed transaction log, in block order.
    pub async fn transaction_log(&self) -> Result<Vec<TxRecord>> {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(lock_err)?;
            let mut stmt = conn.prepare(
                "SELECT tx_hash, call_json, signer_key, signature,
                        block_number, gas_used, created_at
                 FROM transactions ORDER BY block_number",
            )?;
            let records = stmt
                .query_map([], row_to_record)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(records)
        })
        .await
        .map_err(join_err)?
    }

    fn require_signer(&self) -> Result<Arc<Signer>> {
        self.signer.clone().ok_or_else(|| {
            LedgerError::Transaction("no signing identity bound to this ledger handle".into())
        })
    }

    async fn flip_access(&self, id: &DataId, grantee: &Address, granted: bool) -> Result<TxReceipt> {
        let signer = self.require_signer()?;
        let caller = self.caller;
        let id = id.clone();
        let grantee = *grantee;
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(lock_err)?;
            let tx = conn.transaction()?;

            let owner = owner_of(&tx, &id)?;
            if owner != caller {
                return Err(LedgerError::NotAuthorized(format!(
                    "{} does not own {}",
                    caller, id
                )));
            }

            let call = if granted {
                LedgerCall::GrantAccess {
                    data_id: id.clone(),
                    grantee,
                }
            } else {
                LedgerCall::RevokeAccess {
                    data_id: id.clone(),
                    grantee,
                }
            };
            let record = next_record(&tx, call, &signer)?;

            tx.execute(
                "INSERT INTO access_grants (data_id, address, granted, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(data_id, address) DO UPDATE SET
                    granted = excluded.granted,
                    updated_at = excluded.updated_at",
                params![
                    id.as_str(),
                    grantee.as_bytes().as_slice(),
                    granted as i64,
                    now_secs() as i64,
                ],
            )?;

            tx.commit()?;
            Ok(record.receipt())
        })
        .await
        .map_err(join_err)?
    }
}

fn lock_err<E: std::fmt::Display>(e: E) -> LedgerError {
    LedgerError::Transaction(format!("connection lock poisoned: {}", e))
}

fn join_err(e: tokio::task::JoinError) -> LedgerError {
    LedgerError::Transaction(format!("ledger task failed: {}", e))
}

/// Mint the next block: bump the height, sign the call, log the record.
/// Runs inside the caller's transaction so failed writes leave no trace.
fn next_record(conn: &Connection, call: LedgerCall, signer: &Signer) -> Result<TxRecord> {
    let height: i64 =
        conn.query_row("SELECT height FROM chain_state WHERE id = 1", [], |row| {
            row.get(0)
        })?;
    let height = height as u64 + 1;

    let record = TxRecord::seal(call, signer, height, now_secs());

    conn.execute(
        "UPDATE chain_state SET height = ?1 WHERE id = 1",
        params![height as i64],
    )?;

    let call_json =
        hashmoor_core::to_canonical_string(&record.call).expect("JSON serialization failed");
    conn.execute(
        "INSERT INTO transactions (
            tx_hash, call_json, signer_key, signature,
            block_number, gas_used, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            record.tx_hash.as_bytes().as_slice(),
            call_json,
            record.signer_key.as_bytes().as_slice(),
            record.signature.as_bytes().as_slice(),
            record.block_number as i64,
            record.gas_used as i64,
            record.timestamp as i64,
        ],
    )?;

    Ok(record)
}

fn owner_of(conn: &Connection, id: &DataId) -> Result<Address> {
    let owner: Option<Vec<u8>> = conn
        .query_row(
            "SELECT owner FROM anchors WHERE data_id = ?1",
            params![id.as_str()],
            |row| row.get(0),
        )
        .optional()?;

    match owner {
        None => Err(LedgerError::NotFound(id.clone())),
        Some(bytes) => Ok(Address::from_bytes(bytes.try_into().unwrap_or([0u8; 20]))),
    }
}

fn row_to_reference(row: &rusqlite::Row<'_>) -> rusqlite::Result<DataReference> {
    let data_id: String = row.get("data_id")?;
    let cipher_bytes: Vec<u8> = row.get("cipher_hash")?;
    let metadata_bytes: Vec<u8> = row.get("metadata_hash")?;
    let owner_bytes: Vec<u8> = row.get("owner")?;
    let anchored_at: i64 = row.get("anchored_at")?;

    Ok(DataReference {
        data_id: DataId::new(&data_id).map_err(|_| invalid_column(0, "data_id"))?,
        cipher_hash: ContentHash::from_bytes(blob32(cipher_bytes, 1, "cipher_hash")?),
        metadata_hash: ContentHash::from_bytes(blob32(metadata_bytes, 2, "metadata_hash")?),
        timestamp: anchored_at as u64,
        owner: Address::from_bytes(blob20(owner_bytes, 3, "owner")?),
    })
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<TxRecord> {
    let tx_hash_bytes: Vec<u8> = row.get("tx_hash")?;
    let call_json: String = row.get("call_json")?;
    let signer_bytes: Vec<u8> = row.get("signer_key")?;
    let signature_bytes: Vec<u8> = row.get("signature")?;
    let block_number: i64 = row.get("block_number")?;
    let gas_used: i64 = row.get("gas_used")?;
    let created_at: i64 = row.get("created_at")?;

    let call: LedgerCall =
        serde_json::from_str(&call_json).map_err(|_| invalid_column(1, "call_json"))?;
    let signature: [u8; 64] = signature_bytes
        .try_into()
        .map_err(|_| invalid_column(3, "signature"))?;

    Ok(TxRecord {
        tx_hash: ContentHash::from_bytes(blob32(tx_hash_bytes, 0, "tx_hash")?),
        call,
        signer_key: Ed25519PublicKey::from_bytes(blob32(signer_bytes, 2, "signer_key")?),
        signature: Ed25519Signature::from_bytes(signature),
        block_number: block_number as u64,
        gas_used: gas_used as u64,
        timestamp: created_at as u64,
    })
}

fn blob32(bytes: Vec<u8>, idx: usize, name: &str) -> rusqlite::Result<[u8; 32]> {
    bytes.try_into().map_err(|_| invalid_column(idx, name))
}

fn blob20(bytes: Vec<u8>, idx: usize, name: &str) -> rusqlite::Result<[u8; 20]> {
    bytes.try_into().map_err(|_| invalid_column(idx, name))
}

fn invalid_column(idx: usize, name: &str) -> rusqlite::Error {
    rusqlite::Error::InvalidColumnType(idx, name.into(), rusqlite::types::Type::Blob)
}

#[async_trait]
impl Ledger for SqliteLedger {
    async fn store(
        &self,
        id: &DataId,
        cipher_hash: &ContentHash,
        metadata_hash: &ContentHash,
    ) -> Result<TxReceipt> {
        let signer = self.require_signer()?;
        let caller = self.caller;
        let id = id.clone();
        let cipher_hash = *cipher_hash;
        let metadata_hash = *metadata_hash;
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(lock_err)?;
            let tx = conn.transaction()?;

            let exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM anchors WHERE data_id = ?1)",
                params![id.as_str()],
                |row| row.get(0),
            )?;
            if exists {
                return Err(LedgerError::DuplicateId(id));
            }

            let call = LedgerCall::Store {
                data_id: id.clone(),
                cipher_hash,
                metadata_hash,
            };
            let record = next_record(&tx, call, &signer)?;

            tx.execute(
                "INSERT INTO anchors (data_id, cipher_hash, metadata_hash, owner, anchored_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    id.as_str(),
                    cipher_hash.as_bytes().as_slice(),
                    metadata_hash.as_bytes().as_slice(),
                    caller.as_bytes().as_slice(),
                    record.timestamp as i64,
                ],
            )?;

            tx.commit()?;
            Ok(record.receipt())
        })
        .await
        .map_err(join_err)?
    }

    async fn update(
        &self,
        id: &DataId,
        cipher_hash: &ContentHash,
        metadata_hash: &ContentHash,
    ) -> Result<TxReceipt> {
        let signer = self.require_signer()?;
        let caller = self.caller;
        let id = id.clone();
        let cipher_hash = *cipher_hash;
        let metadata_hash = *metadata_hash;
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(lock_err)?;
            let tx = conn.transaction()?;

            let owner = owner_of(&tx, &id)?;
            if owner != caller {
                return Err(LedgerError::NotAuthorized(format!(
                    "{} does not own {}",
                    caller, id
                )));
            }

            let call = LedgerCall::Update {
                data_id: id.clone(),
                cipher_hash,
                metadata_hash,
            };
            let record = next_record(&tx, call, &signer)?;

            tx.execute(
                "UPDATE anchors
                 SET cipher_hash = ?2, metadata_hash = ?3, anchored_at = ?4
                 WHERE data_id = ?1",
                params![
                    id.as_str(),
                    cipher_hash.as_bytes().as_slice(),
                    metadata_hash.as_bytes().as_slice(),
                    record.timestamp as i64,
                ],
            )?;

            tx.commit()?;
            Ok(record.receipt())
        })
        .await
        .map_err(join_err)?
    }

    async fn retrieve(&self, id: &DataId) -> Result<DataReference> {
        let caller = self.caller;
        let id = id.clone();
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(lock_err)?;

            let reference = conn
                .query_row(
                    "SELECT data_id, cipher_hash, metadata_hash, owner, anchored_at
                     FROM anchors WHERE data_id = ?1",
                    params![id.as_str()],
                    row_to_reference,
                )
                .optional()?
                .ok_or_else(|| LedgerError::NotFound(id.clone()))?;

            if reference.owner != caller {
                let granted: bool = conn
                    .query_row(
                        "SELECT granted FROM access_grants
                         WHERE data_id = ?1 AND address = ?2",
                        params![id.as_str(), caller.as_bytes().as_slice()],
                        |row| row.get::<_, i64>(0).map(|v| v != 0),
                    )
                    .optional()?
                    .unwrap_or(false);
                if !granted {
                    return Err(LedgerError::NotAuthorized(format!(
                        "{} may not read {}",
                        caller, id
                    )));
                }
            }

            Ok(reference)
        })
        .await
        .map_err(join_err)?
    }

    async fn grant_access(&self, id: &DataId, grantee: &Address) -> Result<TxReceipt> {
        self.flip_access(id, grantee, true).await
    }

    async fn revoke_access(&self, id: &DataId, grantee: &Address) -> Result<TxReceipt> {
        self.flip_access(id, grantee, false).await
    }

    async fn check_access(&self, id: &DataId, address: &Address) -> Result<bool> {
        let id = id.clone();
        let address = *address;
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(lock_err)?;
            let granted: Option<i64> = conn
                .query_row(
                    "SELECT granted FROM access_grants WHERE data_id = ?1 AND address = ?2",
                    params![id.as_str(), address.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(granted.map(|v| v != 0).unwrap_or(false))
        })
        .await
        .map_err(join_err)?
    }

    async fn list_all_ids(&self) -> Result<Vec<DataId>> {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(lock_err)?;
            let mut stmt = conn.prepare("SELECT data_id FROM anchors ORDER BY rowid")?;
            let ids = stmt
                .query_map([], |row| {
                    let s: String = row.get(0)?;
                    DataId::new(&s).map_err(|_| invalid_column(0, "data_id"))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(ids)
        })
        .await
        .map_err(join_err)?
    }

    async fn list_owned_ids(&self, owner: &Address) -> Result<Vec<DataId>> {
        let owner = *owner;
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(lock_err)?;
            let mut stmt = conn
                .prepare("SELECT data_id FROM anchors WHERE owner = ?1 ORDER BY rowid")?;
            let ids = stmt
                .query_map(params![owner.as_bytes().as_slice()], |row| {
                    let s: String = row.get(0)?;
                    DataId::new(&s).map_err(|_| invalid_column(0, "data_id"))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(ids)
        })
        .await
        .map_err(join_err)?
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
