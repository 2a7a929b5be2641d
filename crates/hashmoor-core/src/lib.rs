//! # Hashmoor Core
//!
//! Pure primitives for hashmoor: content hashes, canonical JSON, payloads,
//! and identifiers.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over the data that gets encrypted and anchored.
//!
//! ## Key Types
//!
//! - [`ContentHash`] - 32-byte SHA-256 digest, hex-serialized
//! - [`Payload`] - structured JSON or opaque bytes, with a canonical byte form
//! - [`Metadata`] - provenance envelope whose hash gets anchored
//! - [`DataId`] / [`Address`] - ledger identifiers
//!
//! ## Canonicalization
//!
//! Structured values are hashed and encrypted over deterministic JSON (keys
//! sorted, compact). See the [`canonical`] module.

pub mod canonical;
pub mod error;
pub mod hash;
pub mod metadata;
pub mod payload;
pub mod types;

pub use canonical::{to_canonical_string, to_canonical_vec};
pub use error::CoreError;
pub use hash::ContentHash;
pub use metadata::{EncryptionMethod, Metadata};
pub use payload::Payload;
pub use types::{Address, DataId};
