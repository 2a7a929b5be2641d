//! Artifact layout: the `.enc` / `.key` / `.meta` triple on disk.
//!
//! One input file yields three artifacts sharing its stem: the encrypted
//! record, the key bundle, and the provenance metadata. Writing key
//! material beside ciphertext is a development-mode layout; production
//! deployments hand the [`KeyBundle`] to a real key store and persist
//! only the `.enc` and `.meta` files.

use std::fs;
use std::path::{Path, PathBuf};

use hashmoor_core::{CoreError, Metadata};
use hashmoor_crypto::{EncryptedRecord, KeyBundle, SealedRecord};
use hashmoor_ledger::DataReference;

use crate::error::Result;

/// Paths of the three artifacts derived from one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedArtifacts {
    pub enc: PathBuf,
    pub key: PathBuf,
    pub meta: PathBuf,
}

impl EncryptedArtifacts {
    /// Derive artifact paths for an input file.
    ///
    /// Artifacts land next to the input unless an output directory is
    /// given. The stem drops the input's final extension, so
    /// `data/tracks.json` maps to `data/tracks.enc` and friends.
    pub fn for_input(input: &Path, output_dir: Option<&Path>) -> Self {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        let dir = match output_dir {
            Some(dir) => dir.to_path_buf(),
            None => match input.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            },
        };
        Self {
            enc: dir.join(format!("{}.enc", stem)),
            key: dir.join(format!("{}.key", stem)),
            meta: dir.join(format!("{}.meta", stem)),
        }
    }
}

/// Persist a sealed record as its three artifacts.
pub fn write_sealed(sealed: &SealedRecord, paths: &EncryptedArtifacts) -> Result<()> {
    fs::write(&paths.enc, sealed.record.to_json())?;
    fs::write(&paths.key, sealed.keys.to_file_string())?;
    let meta_json = serde_json::to_string_pretty(&sealed.metadata)
        .map_err(|e| CoreError::Encoding(e.to_string()))?;
    fs::write(&paths.meta, meta_json)?;
    Ok(())
}

/// Read an encrypted record from a `.enc` artifact.
pub fn read_record(path: &Path) -> Result<EncryptedRecord> {
    let raw = fs::read_to_string(path)?;
    Ok(EncryptedRecord::from_json(&raw)?)
}

/// Read a key bundle from a `.key` artifact.
///
/// The bundle kind is auto-detected: JSON parses as a wrapped-key
/// envelope, anything else is treated as a raw base64 key.
pub fn read_key_bundle(path: &Path) -> Result<KeyBundle> {
    let raw = fs::read_to_string(path)?;
    Ok(KeyBundle::from_file_str(&raw)?)
}

/// Read a metadata envelope from a `.meta` artifact.
pub fn read_metadata(path: &Path) -> Result<Metadata> {
    let raw = fs::read_to_string(path)?;
    let meta = serde_json::from_str(&raw).map_err(|e| CoreError::Encoding(e.to_string()))?;
    Ok(meta)
}

/// Write the `<id>_ledger_info.json` artifact for a retrieved reference.
pub fn write_ledger_info(dir: &Path, reference: &DataReference) -> Result<PathBuf> {
    let path = dir.join(format!("{}_ledger_info.json", reference.data_id));
    let json = serde_json::to_string_pretty(reference)
        .map_err(|e| CoreError::Encoding(e.to_string()))?;
    fs::write(&path, json)?;
    Ok(path)
}
