//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL
//! string that transforms the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{LedgerError, Result};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent; it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;
            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_secs() as i64],
            )?;
            tracing::debug!(version, "applied ledger schema migration");
        }

        tx.commit()?;
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(LedgerError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Anchored references, one row per data id
        CREATE TABLE anchors (
            data_id TEXT PRIMARY KEY,
            cipher_hash BLOB NOT NULL,        -- 32 bytes, SHA-256 of ciphertext
            metadata_hash BLOB NOT NULL,      -- 32 bytes, SHA-256 of metadata
            owner BLOB NOT NULL,              -- 20 bytes
            anchored_at INTEGER NOT NULL      -- Unix seconds, refreshed on update
        );

        -- Grant relation: rows are flipped, never deleted
        CREATE TABLE access_grants (
            data_id TEXT NOT NULL,
            address BLOB NOT NULL,            -- 20 bytes
            granted INTEGER NOT NULL,         -- 0 or 1
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (data_id, address)
        );

        -- Signed write log
        CREATE TABLE transactions (
            tx_hash BLOB PRIMARY KEY,         -- 32 bytes
            call_json TEXT NOT NULL,          -- canonical call bytes
            signer_key BLOB NOT NULL,         -- 32 bytes, Ed25519 verifying key
            signature BLOB NOT NULL,          -- 64 bytes
            block_number INTEGER NOT NULL,
            gas_used INTEGER NOT NULL,
            created_at INTEGER NOT NULL
        );

        -- Single-row chain height counter
        CREATE TABLE chain_state (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            height INTEGER NOT NULL
        );
        INSERT INTO chain_state (id, height) VALUES (1, 0);

        -- Indexes for common queries
        CREATE INDEX idx_anchors_owner ON anchors(owner);
        CREATE INDEX idx_transactions_block ON transactions(block_number);
        "#,
    )?;

    Ok(())
}

/// Get current time in Unix seconds.
fn now_secs() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_secs()
}
