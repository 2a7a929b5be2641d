//! # Hashmoor Ledger
//!
//! Anchoring ledger for Hashmoor. Provides a trait-based interface for
//! recording encrypted-data fingerprints and access grants, with SQLite
//! and in-memory implementations.
//!
//! ## Overview
//!
//! The ledger module abstracts anchoring behind the [`Ledger`] trait,
//! allowing the upper layers to be backend-agnostic. The primary
//! implementation is [`SqliteLedger`], with [`MemoryLedger`] for testing.
//! Every successful write is signed by the handle's [`Signer`] and appended
//! to a transaction log with a block number and a flat gas charge.
//!
//! ## Key Types
//!
//! - [`Ledger`] - The async trait for all anchoring operations
//! - [`SqliteLedger`] - SQLite-based persistent ledger
//! - [`MemoryLedger`] - In-memory ledger for tests
//! - [`Signer`] - Ed25519 signing identity; its address owns what it anchors
//! - [`TxRecord`] - A signed, logged ledger call
//! - [`TxReceipt`] - What callers get back from a successful write
//!
//! ## Usage
//!
//! ```rust,no_run
//! use hashmoor_core::{ContentHash, DataId};
//! use hashmoor_ledger::{Ledger, Signer, SqliteLedger};
//!
//! async fn example() {
//!     let ledger = SqliteLedger::open("ledger.db")
//!         .unwrap()
//!         .with_signer(Signer::generate());
//!
//!     let id = DataId::new("doc1").unwrap();
//!     let cipher_hash = ContentHash::digest(b"ciphertext");
//!     let metadata_hash = ContentHash::digest(b"metadata");
//!
//!     let receipt = ledger.store(&id, &cipher_hash, &metadata_hash).await.unwrap();
//!     println!("anchored in block {}", receipt.block_number);
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **No overwrites**: Storing a taken id returns `DuplicateId`; updates go
//!   through `update` and are owner-only
//! - **Explicit grants**: `check_access` consults the grant table alone;
//!   ownership is not an implicit grant
//! - **Signed writes**: A handle without a signer can read but every write
//!   fails before touching state
//! - **Auditable log**: `transaction_log` returns every write in block order,
//!   each independently verifiable against its signer key

pub mod calls;
pub mod error;
pub mod memory;
pub mod migration;
pub mod signer;
pub mod sqlite;
pub mod traits;

pub use calls::{gas, LedgerCall, TxRecord};
pub use error::{LedgerError, Result};
pub use memory::MemoryLedger;
pub use signer::{Ed25519PublicKey, Ed25519Signature, Signer};
pub use sqlite::SqliteLedger;
pub use traits::{DataReference, Ledger, TxReceipt};
