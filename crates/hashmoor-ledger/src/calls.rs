//! Signed ledger calls and the transaction log.
//!
//! The development ledgers mint honest receipts: every state-changing call
//! is serialized to canonical JSON, signed, and retained in an append-only
//! log. `tx_hash = sha256(call_bytes || signature)`.

use hashmoor_core::{to_canonical_vec, Address, ContentHash, DataId};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::signer::{Ed25519PublicKey, Ed25519Signature, Signer};
use crate::traits::TxReceipt;

/// Flat gas schedule for the development ledgers.
pub mod gas {
    pub const STORE: u64 = 120_000;
    pub const UPDATE: u64 = 45_000;
    pub const GRANT: u64 = 48_000;
    pub const REVOKE: u64 = 29_000;
}

/// A state-changing ledger call, in its signed wire form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum LedgerCall {
    Store {
        data_id: DataId,
        cipher_hash: ContentHash,
        metadata_hash: ContentHash,
    },
    Update {
        data_id: DataId,
        cipher_hash: ContentHash,
        metadata_hash: ContentHash,
    },
    GrantAccess {
        data_id: DataId,
        grantee: Address,
    },
    RevokeAccess {
        data_id: DataId,
        grantee: Address,
    },
}

impl LedgerCall {
    /// The signing bytes: recursively key-sorted compact JSON.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        to_canonical_vec(self).expect("JSON serialization failed")
    }

    /// The id this call touches.
    pub fn data_id(&self) -> &DataId {
        match self {
            LedgerCall::Store { data_id, .. }
            | LedgerCall::Update { data_id, .. }
            | LedgerCall::GrantAccess { data_id, .. }
            | LedgerCall::RevokeAccess { data_id, .. } => data_id,
        }
    }

    /// The flat cost of this call kind.
    pub fn gas_cost(&self) -> u64 {
        match self {
            LedgerCall::Store { .. } => gas::STORE,
            LedgerCall::Update { .. } => gas::UPDATE,
            LedgerCall::GrantAccess { .. } => gas::GRANT,
            LedgerCall::RevokeAccess { .. } => gas::REVOKE,
        }
    }
}

/// One entry in a development ledger's transaction log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRecord {
    /// `sha256(call_bytes || signature)`.
    pub tx_hash: ContentHash,
    pub call: LedgerCall,
    pub signer_key: Ed25519PublicKey,
    pub signature: Ed25519Signature,
    /// Height at which the write was included.
    pub block_number: u64,
    pub gas_used: u64,
    /// Unix seconds at inclusion.
    pub timestamp: u64,
}

impl TxRecord {
    /// Sign `call` and record it at the given height.
    pub fn seal(call: LedgerCall, signer: &Signer, block_number: u64, timestamp: u64) -> Self {
        let bytes = call.canonical_bytes();
        let signature = signer.sign(&bytes);
        let tx_hash = tx_hash(&bytes, &signature);
        let gas_used = call.gas_cost();
        Self {
            tx_hash,
            call,
            signer_key: signer.public_key(),
            signature,
            block_number,
            gas_used,
            timestamp,
        }
    }

    /// The receipt handed back to the caller.
    pub fn receipt(&self) -> TxReceipt {
        TxReceipt {
            tx_hash: self.tx_hash,
            block_number: self.block_number,
            gas_used: self.gas_used,
        }
    }

    /// The address that signed this record.
    pub fn signer_address(&self) -> Address {
        self.signer_key.address()
    }

    /// Re-check the signature and hash against the recorded call.
    pub fn verify(&self) -> Result<()> {
        let bytes = self.call.canonical_bytes();
        self.signer_key.verify(&bytes, &self.signature)?;
        if tx_hash(&bytes, &self.signature) != self.tx_hash {
            return Err(crate::error::LedgerError::InvalidSignature);
        }
        Ok(())
    }
}

/// `sha256(call_bytes || signature)`.
pub fn tx_hash(call_bytes: &[u8], signature: &Ed25519Signature) -> ContentHash {
    let mut buf = Vec::with_capacity(call_bytes.len() + signature.as_bytes().len());
    buf.extend_from_slice(call_bytes);
    buf.extend_from_slice(signature.as_bytes());
    ContentHash::digest(&buf)
}
