//! Disk Backend
//!
//! Every read and write goes straight to the collection file.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::document::Document;
use crate::error::{Result, ShelfError};

use super::file::{read_documents, sidecar, write_documents};
use super::{FileLock, StorageBackend};

/// File-backed document set
///
/// ## Exclusive section
/// Two layers, taken in order:
/// 1. `section`: one-permit semaphore serializing tasks in this process
/// 2. `file_lock`: advisory lock on `{path}.lock` serializing processes
pub struct DiskBackend {
    /// Collection file (JSON array)
    path: PathBuf,

    /// In-process exclusion
    section: Semaphore,

    /// Whether the permit is currently checked out
    held: AtomicBool,

    /// Cross-process exclusion
    file_lock: FileLock,
}

impl DiskBackend {
    /// Wrap an existing collection file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_lock = FileLock::new(sidecar(&path, ".lock"));
        Self {
            path,
            section: Semaphore::new(1),
            held: AtomicBool::new(false),
            file_lock,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StorageBackend for DiskBackend {
    async fn acquire_exclusive(&self) -> Result<()> {
        let permit = self
            .section
            .acquire()
            .await
            .map_err(|e| ShelfError::Lock(format!("section for {} closed: {}", self.path.display(), e)))?;

        // The permit returns to the semaphore if this fails or is dropped
        self.file_lock.acquire().await?;

        permit.forget();
        self.held.store(true, Ordering::SeqCst);
        tracing::trace!("Acquired exclusive section for {}", self.path.display());
        Ok(())
    }

    /// Holder only; see `StorageBackend::release_exclusive`
    fn release_exclusive(&self) {
        self.file_lock.release();
        if self.held.swap(false, Ordering::SeqCst) {
            self.section.add_permits(1);
            tracing::trace!("Released exclusive section for {}", self.path.display());
        }
    }

    async fn read_all(&self) -> Result<Vec<Document>> {
        read_documents(&self.path).await
    }

    async fn replace_all(&self, documents: Vec<Document>) -> Result<()> {
        write_documents(&self.path, &documents).await
    }
}
