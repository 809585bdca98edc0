//! Storage Module
//!
//! Where a collection's documents live between operations.
//!
//! ## Responsibilities
//! - Grant an exclusive section for read-modify-write cycles
//! - Return a coherent snapshot of the whole document set
//! - Replace the whole document set atomically
//!
//! ## Variants
//! ```text
//!   ┌──────────────────┐            ┌──────────────────┐
//!   │   DiskBackend    │            │  MemoryBackend   │
//!   │ semaphore+flock  │            │    semaphore     │
//!   │ read/rename file │            │  RwLock<Vec<_>>  │
//!   └────────┬─────────┘            └────────┬─────────┘
//!            │                               │ (FlushScheduler)
//!            ▼                               ▼
//!   ┌──────────────────────────────────────────────────┐
//!   │   {root}/{collection}.json   (one JSON array)    │
//!   └──────────────────────────────────────────────────┘
//! ```

mod disk;
mod file;
mod lock;
mod memory;

use async_trait::async_trait;

use crate::document::Document;
use crate::error::Result;

pub use disk::DiskBackend;
pub use file::{read_documents, write_documents};
pub(crate) use file::sidecar;
pub use lock::{FileLock, FileLockGuard};
pub use memory::MemoryBackend;

/// Capability set consumed by the collection engine
///
/// Implementations must make `replace_all` atomic with respect to
/// `read_all`: a reader sees either the old or the new set, never a mix.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Suspend until this caller is the only holder of the section
    ///
    /// On failure the backend must be left unheld.
    async fn acquire_exclusive(&self) -> Result<()>;

    /// Leave the exclusive section
    ///
    /// Only the current holder may call this. Ownership is not tracked per
    /// caller, so a release from anyone else frees the holder's section.
    /// Calling it when nobody holds the section is a no-op. Never fails the
    /// caller.
    fn release_exclusive(&self);

    /// Snapshot of every document, in stored order
    async fn read_all(&self) -> Result<Vec<Document>>;

    /// Replace the stored set with `documents`
    async fn replace_all(&self, documents: Vec<Document>) -> Result<()>;
}
