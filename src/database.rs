//! Database Module
//!
//! Connects a root directory to a set of named collections.
//!
//! ## Responsibilities
//! - Verify the root directory exists
//! - Create missing collection files as an empty array (`[]`)
//! - Build one `Collection` per name over the configured backend
//! - Start and stop flush tasks in in-memory mode

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;

use crate::config::Config;
use crate::engine::Collection;
use crate::error::{Result, ShelfError};
use crate::flush::FlushScheduler;
use crate::storage::{DiskBackend, MemoryBackend};

/// An open set of collections under one root directory
pub struct Database {
    /// Database configuration
    config: Config,

    /// Collections by name
    collections: BTreeMap<String, Arc<Collection>>,
}

impl Database {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const FILE_EXTENSION: &'static str = "json";

    /// Connect to `config.root_dir` and load `names`
    ///
    /// On connect:
    /// 1. Validate config and root directory
    /// 2. Create missing collection files
    /// 3. Build collections (starting flush tasks in in-memory mode)
    pub async fn connect<S: AsRef<str>>(config: Config, names: &[S]) -> Result<Self> {
        config.validate()?;

        let metadata = fs::metadata(&config.root_dir).await.map_err(|e| {
            ShelfError::Config(format!(
                "root directory {} is not accessible: {}",
                config.root_dir.display(),
                e
            ))
        })?;
        if !metadata.is_dir() {
            return Err(ShelfError::Config(format!(
                "root path {} is not a directory",
                config.root_dir.display()
            )));
        }

        tracing::info!(
            "Connecting to {} ({} mode)",
            config.root_dir.display(),
            if config.in_memory { "in-memory" } else { "disk" }
        );

        let mut database = Self {
            config,
            collections: BTreeMap::new(),
        };
        database.load_collections(names).await?;
        Ok(database)
    }

    /// Add collections to an open database
    ///
    /// Names already loaded are left as they are.
    pub async fn load_collections<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        for name in names {
            let name = name.as_ref();
            Self::validate_name(name)?;
            if self.collections.contains_key(name) {
                continue;
            }

            let path = self.collection_path(name);
            Self::ensure_file(&path).await?;

            let collection = self.open_collection(name, path).await?;
            self.collections.insert(name.to_string(), Arc::new(collection));
            tracing::debug!("Loaded collection {}", name);
        }
        Ok(())
    }

    /// Look up a loaded collection
    pub fn collection(&self, name: &str) -> Result<Arc<Collection>> {
        self.collections
            .get(name)
            .cloned()
            .ok_or_else(|| ShelfError::CollectionNotFound(name.to_string()))
    }

    /// Names of every loaded collection, sorted
    pub fn collection_names(&self) -> Vec<&str> {
        self.collections.keys().map(String::as_str).collect()
    }

    /// Stop every flush task, flushing buffered data
    ///
    /// Every collection is closed even if one fails; the first error is
    /// returned.
    pub async fn close(self) -> Result<()> {
        let mut first_error = None;
        for (name, collection) in &self.collections {
            if let Err(e) = collection.close().await {
                tracing::warn!("Closing collection {} failed: {}", name, e);
                first_error.get_or_insert(e);
            }
        }
        tracing::info!("Closed {}", self.config.root_dir.display());
        first_error.map_or(Ok(()), Err)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// File backing collection `name`
    pub fn collection_path(&self, name: &str) -> PathBuf {
        self.config
            .root_dir
            .join(format!("{}.{}", name, Self::FILE_EXTENSION))
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    async fn open_collection(&self, name: &str, path: PathBuf) -> Result<Collection> {
        if !self.config.in_memory {
            return Ok(Collection::new(name, Arc::new(DiskBackend::new(path))));
        }

        let backend = Arc::new(MemoryBackend::new());
        let scheduler =
            FlushScheduler::start(Arc::clone(&backend), path, self.config.flush_interval()).await?;
        Ok(Collection::new(name, backend).attach_scheduler(scheduler))
    }

    /// Create `path` holding `[]` if it does not exist yet
    async fn ensure_file(path: &Path) -> Result<()> {
        if fs::try_exists(path).await? {
            return Ok(());
        }
        fs::write(path, b"[]").await?;
        tracing::debug!("Created {}", path.display());
        Ok(())
    }

    /// Names become file names: no separators, no parent references
    fn validate_name(name: &str) -> Result<()> {
        let bad = name.trim().is_empty()
            || name.contains(['/', '\\'])
            || name == "."
            || name == ".."
            || name.starts_with('.');
        if bad {
            return Err(ShelfError::invalid(format!("invalid collection name {:?}", name)));
        }
        Ok(())
    }
}
