//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: a signing identity, an
//! in-memory ledger behind an [`AnchorClient`], and a scratch directory
//! for artifact I/O.

use std::path::{Path, PathBuf};

use hashmoor::{AnchorClient, DataId, Payload, RecordBuilder, TxReceipt};
use hashmoor_core::Address;
use hashmoor_ledger::{MemoryLedger, Signer};

/// A ready-to-use test bench.
pub struct TestBench {
    pub signer: Signer,
    pub client: AnchorClient<MemoryLedger>,
    pub dir: tempfile::TempDir,
}

impl TestBench {
    /// Create a bench with a random signing identity.
    pub fn new() -> Self {
        Self::build(Signer::generate())
    }

    /// Create a bench with a deterministic signing identity.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self::build(Signer::from_seed(&seed))
    }

    fn build(signer: Signer) -> Self {
        let ledger = MemoryLedger::new().with_signer(signer.clone());
        Self {
            signer,
            client: AnchorClient::new(ledger),
            dir: tempfile::tempdir().expect("failed to create temp dir"),
        }
    }

    /// The address this bench's client acts as.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// The scratch directory path.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// The sample geo document used across the integration suite.
    pub fn geo_payload() -> Payload {
        Payload::Structured(serde_json::json!({"lat": 40.0, "lon": -73.0}))
    }

    /// Write an input file into the scratch directory.
    pub fn write_input(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).expect("failed to write test input");
        path
    }

    /// Seal the sample payload and anchor it under `id`.
    pub async fn anchor_sample(&self, id: &str) -> (DataId, TxReceipt) {
        let sealed = RecordBuilder::new("geo.json")
            .seal(&Self::geo_payload())
            .expect("failed to seal sample payload");
        let id = DataId::new(id).expect("invalid test data id");
        let receipt = self
            .client
            .anchor(
                &id,
                &sealed.record.cipher_hash(),
                &sealed.metadata.digest().expect("metadata digest failed"),
            )
            .await
            .expect("anchor failed");
        (id, receipt)
    }

    /// A client over the same ledger acting as a different signer.
    pub fn peer(&self, seed: [u8; 32]) -> AnchorClient<MemoryLedger> {
        let ledger = self
            .client
            .ledger()
            .clone()
            .with_signer(Signer::from_seed(&seed));
        AnchorClient::new(ledger)
    }

    /// A read-only client over the same ledger acting as `caller`.
    pub fn reader(&self, caller: Address) -> AnchorClient<MemoryLedger> {
        AnchorClient::new(self.client.ledger().clone().with_caller(caller))
    }
}

impl Default for TestBench {
    fn default() -> Self {
        Self::new()
    }
}

/// Create multiple benches with distinct deterministic identities.
pub fn multi_party_benches(count: usize) -> Vec<TestBench> {
    (0..count)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[0] = i as u8 + 1;
            TestBench::with_seed(seed)
        })
        .collect()
}
