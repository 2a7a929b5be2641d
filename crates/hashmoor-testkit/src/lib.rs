//! # Hashmoor Testkit
//!
//! Testing utilities for Hashmoor.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a ready-made bench with a signer, an in-memory ledger,
//!   and a scratch directory
//! - **Faults**: ledger wrappers that lose confirmations or add latency,
//!   for exercising retry and timeout behavior
//! - **Generators**: proptest strategies for property-based testing
//!
//! ## Fixtures
//!
//! ```rust
//! use hashmoor_testkit::TestBench;
//!
//! # async fn example() {
//! let bench = TestBench::with_seed([1; 32]);
//! let (id, receipt) = bench.anchor_sample("doc1").await;
//! assert_eq!(receipt.block_number, 1);
//! # }
//! ```
//!
//! ## Fault Injection
//!
//! `FlakyLedger` models the nastiest transport failure: the write lands
//! but the confirmation is lost. Callers exercising the retry contract
//! must observe the anchor via `retrieve` before retrying:
//!
//! ```rust
//! use hashmoor::AnchorClient;
//! use hashmoor_ledger::{MemoryLedger, Signer};
//! use hashmoor_testkit::FlakyLedger;
//!
//! let inner = MemoryLedger::new().with_signer(Signer::generate());
//! let client = AnchorClient::new(FlakyLedger::new(inner, 1));
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use hashmoor_testkit::generators::{record_from_params, CallParams};
//!
//! proptest! {
//!     #[test]
//!     fn sealed_records_verify(params: CallParams) {
//!         prop_assert!(record_from_params(&params).verify().is_ok());
//!     }
//! }
//! ```

pub mod faults;
pub mod fixtures;
pub mod generators;

pub use faults::{FlakyLedger, SlowLedger};
pub use fixtures::{multi_party_benches, TestBench};
pub use generators::{record_from_params, CallParams};
