//! Scripted operations: one-call encrypt, decrypt, anchor, and lookup.
//!
//! Each call here is a complete workflow over the lower layers, the shape
//! a deployment script or CLI would drive.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use hashmoor_core::{DataId, Payload};
use hashmoor_crypto::{KeyWrap, RecordBuilder};
use hashmoor_ledger::{DataReference, Ledger, TxReceipt};

use crate::anchor::AnchorClient;
use crate::artifacts::{self, EncryptedArtifacts};
use crate::error::Result;

/// Outcome of [`decrypt_file`].
#[derive(Debug, Clone)]
pub struct DecryptOutcome {
    /// The recovered payload, classified as structured when it parses
    /// as JSON.
    pub payload: Payload,
    /// Where the plaintext was written, when an output path was given.
    pub written: Option<PathBuf>,
}

/// Outcome of [`anchor_file`].
#[derive(Debug, Clone)]
pub struct AnchorOutcome {
    /// The artifacts written beside the input.
    pub artifacts: EncryptedArtifacts,
    /// The id the file was anchored under.
    pub data_id: DataId,
    /// The ledger receipt.
    pub receipt: TxReceipt,
}

/// Encrypt a file into its `.enc` / `.key` / `.meta` artifacts.
///
/// With `use_hybrid` the symmetric key is wrapped under a fresh RSA pair
/// and the `.key` artifact holds the full envelope; otherwise it holds
/// the raw base64 key.
pub fn encrypt_file(
    input: &Path,
    output_dir: Option<&Path>,
    use_hybrid: bool,
) -> Result<EncryptedArtifacts> {
    let bytes = fs::read(input)?;
    let payload = Payload::classify(bytes);
    let label = file_label(input)?;

    let wrap = if use_hybrid {
        KeyWrap::Generated
    } else {
        KeyWrap::None
    };
    let sealed = RecordBuilder::new(&label).wrap(wrap).seal(&payload)?;

    let paths = EncryptedArtifacts::for_input(input, output_dir);
    artifacts::write_sealed(&sealed, &paths)?;
    tracing::info!(
        input = %input.display(),
        enc = %paths.enc.display(),
        hybrid = use_hybrid,
        "encrypted file"
    );
    Ok(paths)
}

/// Decrypt a `.enc` artifact with its `.key` artifact.
///
/// The key file kind is auto-detected. When `output` is given the
/// plaintext is written there as well.
pub fn decrypt_file(enc: &Path, key: &Path, output: Option<&Path>) -> Result<DecryptOutcome> {
    let record = artifacts::read_record(enc)?;
    let bundle = artifacts::read_key_bundle(key)?;
    let symmetric = bundle.symmetric_key()?;
    let payload = record.decrypt_payload(&symmetric)?;

    let written = match output {
        None => None,
        Some(path) => {
            fs::write(path, payload.to_bytes()?)?;
            Some(path.to_path_buf())
        }
    };
    Ok(DecryptOutcome { payload, written })
}

/// Encrypt a file and anchor its fingerprints in one workflow.
///
/// Hashes exactly what was persisted: the ciphertext hash comes from the
/// written `.enc` artifact and the metadata hash from the written `.meta`
/// envelope. The data id is derived from the input file name and the
/// current time.
pub async fn anchor_file<L: Ledger>(
    client: &AnchorClient<L>,
    input: &Path,
    use_hybrid: bool,
) -> Result<AnchorOutcome> {
    let paths = encrypt_file(input, None, use_hybrid)?;

    let record = artifacts::read_record(&paths.enc)?;
    let metadata = artifacts::read_metadata(&paths.meta)?;
    let cipher_hash = record.cipher_hash();
    let metadata_hash = metadata.digest()?;

    let label = file_label(input)?;
    let data_id = client.generate_data_id(&label, now_millis());
    let receipt = client.anchor(&data_id, &cipher_hash, &metadata_hash).await?;

    Ok(AnchorOutcome {
        artifacts: paths,
        data_id,
        receipt,
    })
}

/// Fetch an anchored reference, optionally writing the
/// `<id>_ledger_info.json` artifact into a directory.
pub async fn lookup<L: Ledger>(
    client: &AnchorClient<L>,
    id: &DataId,
    output_dir: Option<&Path>,
) -> Result<DataReference> {
    let reference = client.retrieve(id).await?;
    if let Some(dir) = output_dir {
        let path = artifacts::write_ledger_info(dir, &reference)?;
        tracing::info!(id = %id, info = %path.display(), "wrote ledger info");
    }
    Ok(reference)
}

fn file_label(input: &Path) -> Result<String> {
    input
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "input path has no file name").into()
        })
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}
