//! End-to-end workflow: encrypt a document, anchor its fingerprints,
//! move access around, and decrypt back to the original payload.

use std::fs;

use anyhow::Result;
use hashmoor::ops;
use hashmoor::{
    AnchorClient, ContentHash, DataId, HashmoorError, MemoryLedger, Payload, Signer,
};
use hashmoor::ledger::LedgerError;

const GEO_DOCUMENT: &[u8] = br#"{"lat":40.0,"lon":-73.0}"#;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().try_init();
}

fn owner_client() -> AnchorClient<MemoryLedger> {
    let ledger = MemoryLedger::new().with_signer(Signer::from_seed(&[1; 32]));
    AnchorClient::new(ledger)
}

#[tokio::test]
async fn test_geo_document_lifecycle() -> Result<()> {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let input = dir.path().join("geo.json");
    fs::write(&input, GEO_DOCUMENT)?;

    // Encrypt: three artifacts appear, ciphertext differs from plaintext.
    let artifacts = ops::encrypt_file(&input, None, false)?;
    let record = hashmoor::artifacts::read_record(&artifacts.enc)?;
    let metadata = hashmoor::artifacts::read_metadata(&artifacts.meta)?;
    assert_ne!(record.cipher_hash(), ContentHash::digest(GEO_DOCUMENT));
    assert_eq!(metadata.data_hash, ContentHash::digest(GEO_DOCUMENT));

    // Anchor under an explicit id.
    let client = owner_client();
    let id = DataId::new("doc1")?;
    let cipher_hash = record.cipher_hash();
    let metadata_hash = metadata.digest()?;
    let receipt = client.anchor(&id, &cipher_hash, &metadata_hash).await?;
    assert_eq!(receipt.block_number, 1);

    // A second anchor under the same id is rejected.
    let err = client
        .anchor(&id, &cipher_hash, &metadata_hash)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        HashmoorError::Ledger(LedgerError::DuplicateId(_))
    ));

    // Retrieval returns exactly the submitted hashes.
    let reference = client.retrieve(&id).await?;
    assert_eq!(reference.cipher_hash, cipher_hash);
    assert_eq!(reference.metadata_hash, metadata_hash);
    assert_eq!(reference.owner, client.caller());

    // Access lifecycle for an outside reader.
    let outsider = Signer::from_seed(&[2; 32]).address();
    let outsider_view = AnchorClient::new(client.ledger().clone().with_caller(outsider));
    let access = client.access();

    assert!(!access.check(&id, &outsider).await?);
    assert!(matches!(
        outsider_view.retrieve(&id).await.unwrap_err(),
        HashmoorError::Ledger(LedgerError::NotAuthorized(_))
    ));

    access.grant(&id, &outsider).await?;
    assert!(access.check(&id, &outsider).await?);
    assert_eq!(outsider_view.retrieve(&id).await?.cipher_hash, cipher_hash);

    access.revoke(&id, &outsider).await?;
    assert!(!access.check(&id, &outsider).await?);
    assert!(outsider_view.retrieve(&id).await.is_err());

    // Decrypt reproduces the original payload, verified against the
    // anchored plaintext hash.
    let outcome = ops::decrypt_file(&artifacts.enc, &artifacts.key, None)?;
    assert_eq!(outcome.payload, Payload::classify(GEO_DOCUMENT));
    assert_eq!(outcome.payload.digest()?, metadata.data_hash);

    Ok(())
}

#[tokio::test]
async fn test_anchor_file_workflow_with_hybrid_keys() -> Result<()> {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let input = dir.path().join("geo.json");
    fs::write(&input, GEO_DOCUMENT)?;

    let client = owner_client();
    let outcome = ops::anchor_file(&client, &input, true).await?;

    // The key artifact is a wrapped envelope, not a raw key.
    let bundle = hashmoor::artifacts::read_key_bundle(&outcome.artifacts.key)?;
    assert!(bundle.is_wrapped());

    // Lookup round-trips through the ledger and writes the info artifact.
    let reference = ops::lookup(&client, &outcome.data_id, Some(dir.path())).await?;
    let record = hashmoor::artifacts::read_record(&outcome.artifacts.enc)?;
    assert_eq!(reference.cipher_hash, record.cipher_hash());
    assert!(dir
        .path()
        .join(format!("{}_ledger_info.json", outcome.data_id))
        .exists());

    // The wrapped key still decrypts the document.
    let decrypted = ops::decrypt_file(&outcome.artifacts.enc, &outcome.artifacts.key, None)?;
    assert_eq!(decrypted.payload, Payload::classify(GEO_DOCUMENT));

    Ok(())
}

#[tokio::test]
async fn test_update_refreshes_anchor_for_new_ciphertext() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("geo.json");
    fs::write(&input, GEO_DOCUMENT)?;

    let client = owner_client();
    let outcome = ops::anchor_file(&client, &input, false).await?;
    let first = client.retrieve(&outcome.data_id).await?;

    // Re-encrypt the same document: fresh key and IV, new fingerprints.
    let artifacts = ops::encrypt_file(&input, None, false)?;
    let record = hashmoor::artifacts::read_record(&artifacts.enc)?;
    let metadata = hashmoor::artifacts::read_metadata(&artifacts.meta)?;
    assert_ne!(record.cipher_hash(), first.cipher_hash);

    client
        .update(&outcome.data_id, &record.cipher_hash(), &metadata.digest()?)
        .await?;

    let second = client.retrieve(&outcome.data_id).await?;
    assert_eq!(second.cipher_hash, record.cipher_hash());
    assert!(second.timestamp >= first.timestamp);

    Ok(())
}

#[test]
fn test_explicit_ids_validated_at_the_boundary() {
    assert!(DataId::new("doc1").is_ok());
    assert!(DataId::new("geo-2026_v2.json").is_ok());
    assert!(DataId::new("").is_err());
    assert!(DataId::new("no spaces").is_err());
    assert!(DataId::new("x".repeat(33)).is_err());
}
