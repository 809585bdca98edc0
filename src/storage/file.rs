//! Collection file I/O
//!
//! Whole-file read and atomic whole-file replace of a JSON array.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::document::Document;
use crate::error::Result;

/// Read a collection file as a JSON array of documents
///
/// An empty (or whitespace-only) file reads as an empty collection.
pub async fn read_documents(path: &Path) -> Result<Vec<Document>> {
    let bytes = fs::read(path).await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_slice(&bytes)?)
}

/// Replace a collection file with `documents`
///
/// Writes `{path}.tmp`, syncs it, then renames it over `path`, so readers
/// observe either the previous array or the new one.
pub async fn write_documents(path: &Path, documents: &[Document]) -> Result<()> {
    let bytes = serde_json::to_vec(documents)?;
    let tmp_path = sidecar(path, ".tmp");

    let mut file = fs::File::create(&tmp_path).await?;
    file.write_all(&bytes).await?;
    file.sync_all().await?;
    drop(file);

    if let Err(e) = fs::rename(&tmp_path, path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(e.into());
    }

    tracing::trace!("Wrote {} documents ({} bytes) to {}", documents.len(), bytes.len(), path.display());
    Ok(())
}

/// `{path}{suffix}`, e.g. "users.json" → "users.json.lock"
pub(crate) fn sidecar(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}
