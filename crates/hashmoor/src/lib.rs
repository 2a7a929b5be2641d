//! # Hashmoor
//!
//! The unified API for Hashmoor: encrypted-data integrity and
//! access-control anchoring.
//!
//! ## Overview
//!
//! Hashmoor encrypts documents locally and anchors tamper-evident
//! fingerprints of the results on a ledger:
//!
//! - **Records**: AES-256-CBC ciphertext with a fresh IV, optionally
//!   carrying its key wrapped under RSA-OAEP
//! - **Metadata**: a provenance envelope whose canonical hash is anchored
//!   beside the ciphertext hash
//! - **Anchors**: signed, immutable ledger entries binding a data id to
//!   both hashes and an owner
//! - **Grants**: per-address read access, granted and revoked by the owner
//!
//! Plaintext and keys never reach the ledger; only content hashes do.
//!
//! ## Key Concepts
//!
//! - **Data id**: slug chosen by the caller, or derived from a label and
//!   a timestamp. Anchoring a taken id fails; anchors are never
//!   overwritten.
//! - **Owner**: the address whose signer anchored the id. Only the owner
//!   updates, grants, and revokes.
//! - **Grant**: explicit and revocable. Ownership is not an implicit
//!   grant in `check`; retrieval authorizes owner-or-granted.
//! - **Receipt**: every successful write returns a transaction hash,
//!   block number, and flat gas charge.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use hashmoor::ops;
//! use hashmoor::{AnchorClient, LedgerConfig};
//!
//! async fn example() {
//!     let config = LedgerConfig::from_env().unwrap();
//!     let ledger = config.open_ledger().unwrap();
//!     let client = AnchorClient::new(ledger).with_timeout(config.confirm_timeout);
//!
//!     // Encrypt tracks.json and anchor its fingerprints.
//!     let outcome = ops::anchor_file(&client, Path::new("tracks.json"), false)
//!         .await
//!         .unwrap();
//!     println!(
//!         "anchored {} in block {}",
//!         outcome.data_id, outcome.receipt.block_number
//!     );
//!
//!     // Grant another address read access.
//!     let grantee = "0xabababababababababababababababababababab".parse().unwrap();
//!     client.access().grant(&outcome.data_id, &grantee).await.unwrap();
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `hashmoor::core` - Core primitives (hashes, ids, payloads, metadata)
//! - `hashmoor::crypto` - Cipher, key wrapping, and record sealing
//! - `hashmoor::ledger` - The ledger trait and its backends

pub mod access;
pub mod anchor;
pub mod artifacts;
pub mod config;
pub mod error;
pub mod ops;

// Re-export component crates
pub use hashmoor_core as core;
pub use hashmoor_crypto as crypto;
pub use hashmoor_ledger as ledger;

// Re-export main types for convenience
pub use access::AccessController;
pub use anchor::AnchorClient;
pub use artifacts::EncryptedArtifacts;
pub use config::LedgerConfig;
pub use error::{HashmoorError, Result};
pub use ops::{AnchorOutcome, DecryptOutcome};

// Re-export commonly used component types
pub use hashmoor_core::{Address, ContentHash, DataId, Metadata, Payload};
pub use hashmoor_crypto::{
    EncryptedRecord, KeyBundle, KeyWrap, RecordBuilder, SealedRecord, SymmetricKey,
};
pub use hashmoor_ledger::{
    DataReference, Ledger, MemoryLedger, Signer, SqliteLedger, TxReceipt,
};
