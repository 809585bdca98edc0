//! Memory Backend
//!
//! In-process document set. Persistence happens out of band through
//! `FlushScheduler`, never on the write path.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::Semaphore;

use crate::document::Document;
use crate::error::{Result, ShelfError};

use super::StorageBackend;

/// Buffered document set
///
/// ## Concurrency
/// - `documents`: RwLock, swapped wholesale by `replace_all`
/// - `generation`: bumped on every replace, lets the flusher skip clean ticks
/// - `section`: one-permit semaphore for read-modify-write cycles
pub struct MemoryBackend {
    documents: RwLock<Vec<Document>>,
    generation: AtomicU64,
    section: Semaphore,
    held: AtomicBool,
}

impl MemoryBackend {
    /// Create an empty set
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(Vec::new()),
            generation: AtomicU64::new(0),
            section: Semaphore::new(1),
            held: AtomicBool::new(false),
        }
    }

    /// Seed the set with documents already on disk
    ///
    /// Does not bump the generation: the loaded state is already persisted.
    pub fn load(&self, documents: Vec<Document>) {
        *self.documents.write() = documents;
    }

    /// Copy of the current set
    pub fn snapshot(&self) -> Vec<Document> {
        self.documents.read().clone()
    }

    /// Copy of the current set together with its generation
    pub fn snapshot_with_generation(&self) -> (Vec<Document>, u64) {
        let documents = self.documents.read();
        (documents.clone(), self.generation.load(Ordering::SeqCst))
    }

    /// Number of replaces applied so far
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn acquire_exclusive(&self) -> Result<()> {
        let permit = self
            .section
            .acquire()
            .await
            .map_err(|e| ShelfError::Lock(format!("memory section closed: {}", e)))?;
        permit.forget();
        self.held.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Holder only; the `held` flag is backend-wide, not per caller
    fn release_exclusive(&self) {
        if self.held.swap(false, Ordering::SeqCst) {
            self.section.add_permits(1);
        }
    }

    async fn read_all(&self) -> Result<Vec<Document>> {
        Ok(self.snapshot())
    }

    async fn replace_all(&self, documents: Vec<Document>) -> Result<()> {
        let mut current = self.documents.write();
        *current = documents;
        self.generation.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
