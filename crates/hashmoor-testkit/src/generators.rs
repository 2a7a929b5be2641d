//! Proptest generators for property-based testing.

use proptest::prelude::*;

use hashmoor_core::{Address, ContentHash, DataId, Payload};
use hashmoor_crypto::SymmetricKey;
use hashmoor_ledger::{LedgerCall, Signer, TxRecord};

/// Generate a random content hash.
pub fn content_hash() -> impl Strategy<Value = ContentHash> {
    any::<[u8; 32]>().prop_map(ContentHash::from_bytes)
}

/// Generate a random address.
pub fn address() -> impl Strategy<Value = Address> {
    any::<[u8; 20]>().prop_map(Address::from_bytes)
}

/// Generate a random signing identity.
pub fn signer() -> impl Strategy<Value = Signer> {
    any::<[u8; 32]>().prop_map(|seed| Signer::from_seed(&seed))
}

/// Generate a random symmetric key.
pub fn symmetric_key() -> impl Strategy<Value = SymmetricKey> {
    any::<[u8; 32]>().prop_map(SymmetricKey::from_bytes)
}

/// Generate a valid explicit data id.
pub fn data_id() -> impl Strategy<Value = DataId> {
    "[a-z0-9][a-z0-9._-]{0,31}".prop_map(|s| DataId::new(s).expect("generated id is valid"))
}

/// Generate a data id the derived way, from a label and a timestamp.
pub fn derived_data_id() -> impl Strategy<Value = DataId> {
    ("[a-z]{1,16}", 0i64..=1_800_000_000_000i64)
        .prop_map(|(label, timestamp)| DataId::derive(&label, timestamp))
}

/// Generate raw payload bytes of bounded length.
pub fn raw_payload(max_len: usize) -> impl Strategy<Value = Payload> {
    prop::collection::vec(any::<u8>(), 0..=max_len).prop_map(|b| Payload::Raw(b.into()))
}

/// Generate a flat structured payload.
///
/// Leaves stay within bool / integer / ASCII string so every generated
/// document has a stable canonical form.
pub fn structured_payload() -> impl Strategy<Value = Payload> {
    prop::collection::btree_map("[a-z]{1,8}", json_leaf(), 0..8).prop_map(|m| {
        let map: serde_json::Map<String, serde_json::Value> = m.into_iter().collect();
        Payload::Structured(serde_json::Value::Object(map))
    })
}

/// Generate either payload kind.
pub fn payload(max_len: usize) -> impl Strategy<Value = Payload> {
    prop_oneof![raw_payload(max_len), structured_payload()]
}

fn json_leaf() -> impl Strategy<Value = serde_json::Value> {
    prop_oneof![
        any::<bool>().prop_map(serde_json::Value::from),
        any::<i64>().prop_map(serde_json::Value::from),
        "[ -~]{0,16}".prop_map(serde_json::Value::from),
    ]
}

/// Generate a ledger call of any kind.
pub fn ledger_call() -> impl Strategy<Value = LedgerCall> {
    prop_oneof![
        (data_id(), content_hash(), content_hash()).prop_map(
            |(data_id, cipher_hash, metadata_hash)| LedgerCall::Store {
                data_id,
                cipher_hash,
                metadata_hash,
            }
        ),
        (data_id(), content_hash(), content_hash()).prop_map(
            |(data_id, cipher_hash, metadata_hash)| LedgerCall::Update {
                data_id,
                cipher_hash,
                metadata_hash,
            }
        ),
        (data_id(), address())
            .prop_map(|(data_id, grantee)| LedgerCall::GrantAccess { data_id, grantee }),
        (data_id(), address())
            .prop_map(|(data_id, grantee)| LedgerCall::RevokeAccess { data_id, grantee }),
    ]
}

/// Parameters for sealing a transaction record.
#[derive(Debug, Clone)]
pub struct CallParams {
    pub signer: Signer,
    pub call: LedgerCall,
    pub block_number: u64,
    pub timestamp: u64,
}

impl Arbitrary for CallParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            any::<[u8; 32]>(),
            ledger_call(),
            1u64..=1_000_000u64,
            0u64..=1_800_000_000u64,
        )
            .prop_map(|(seed, call, block_number, timestamp)| CallParams {
                signer: Signer::from_seed(&seed),
                call,
                block_number,
                timestamp,
            })
            .boxed()
    }
}

/// Seal a transaction record from parameters.
pub fn record_from_params(params: &CallParams) -> TxRecord {
    TxRecord::seal(
        params.call.clone(),
        &params.signer,
        params.block_number,
        params.timestamp,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashmoor_crypto::EncryptedRecord;

    proptest! {
        #[test]
        fn test_sealed_record_deterministic(params: CallParams) {
            let r1 = record_from_params(&params);
            let r2 = record_from_params(&params);

            prop_assert_eq!(r1.tx_hash, r2.tx_hash);
            prop_assert_eq!(r1.signature, r2.signature);
        }

        #[test]
        fn test_sealed_record_verifies(params: CallParams) {
            let record = record_from_params(&params);
            prop_assert!(record.verify().is_ok());
        }

        #[test]
        fn test_canonical_bytes_stable(call in ledger_call()) {
            prop_assert_eq!(call.canonical_bytes(), call.canonical_bytes());
        }

        #[test]
        fn test_generated_explicit_ids_valid(id in data_id()) {
            prop_assert!(DataId::new(id.as_str()).is_ok());
        }

        #[test]
        fn test_derived_ids_are_themselves_valid(id in derived_data_id()) {
            prop_assert!(DataId::new(id.as_str()).is_ok());
        }

        #[test]
        fn test_record_round_trips_any_payload(
            payload in payload(512),
            key_bytes in any::<[u8; 32]>(),
        ) {
            let key = SymmetricKey::from_bytes(key_bytes);
            let plaintext = payload.to_bytes().unwrap();
            let record = EncryptedRecord::encrypt(&plaintext, &key);
            prop_assert_eq!(record.decrypt(&key).unwrap(), plaintext.to_vec());
        }

        #[test]
        fn test_structured_payload_classify_roundtrip(payload in structured_payload()) {
            let bytes = payload.to_bytes().unwrap();
            prop_assert_eq!(Payload::classify(bytes), payload);
        }
    }
}
