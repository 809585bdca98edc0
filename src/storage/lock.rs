//! Advisory file lock
//!
//! Cross-process exclusion on a sidecar lock file. The collection file
//! itself is replaced by rename on every write, so it cannot carry the lock.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::{Result, ShelfError};

/// OS-level exclusive lock scoped to one path
pub struct FileLock {
    /// Lock file path (created on first acquire)
    path: PathBuf,

    /// Handle holding the lock while acquired
    held: Mutex<Option<File>>,
}

impl FileLock {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            held: Mutex::new(None),
        }
    }

    /// Block (on the blocking pool) until the OS grants the lock
    pub async fn acquire(&self) -> Result<()> {
        let path = self.path.clone();
        let file = tokio::task::spawn_blocking(move || -> std::io::Result<File> {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(&path)?;
            file.lock()?;
            Ok(file)
        })
        .await
        .map_err(|e| ShelfError::Lock(format!("lock task for {} failed: {}", self.path.display(), e)))?
        .map_err(|e| ShelfError::Lock(format!("cannot lock {}: {}", self.path.display(), e)))?;

        *self.held.lock() = Some(file);
        Ok(())
    }

    /// Acquire and get a guard that releases on drop
    pub async fn lock(&self) -> Result<FileLockGuard<'_>> {
        self.acquire().await?;
        Ok(FileLockGuard { lock: self })
    }

    /// Drop the lock if held; a no-op otherwise
    pub fn release(&self) {
        if let Some(file) = self.held.lock().take() {
            if let Err(e) = file.unlock() {
                // Closing the handle below still drops the lock
                tracing::error!("Failed to unlock {}: {}", self.path.display(), e);
            }
        }
    }

    pub fn is_held(&self) -> bool {
        self.held.lock().is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        self.release();
    }
}

/// Scoped hold on a `FileLock`
pub struct FileLockGuard<'a> {
    lock: &'a FileLock,
}

impl Drop for FileLockGuard<'_> {
    fn drop(&mut self) {
        self.lock.release();
    }
}
