//! Configuration for docshelf
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, ShelfError};

/// Main configuration for a docshelf database
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory holding one JSON file per collection
    /// Internal structure:
    ///   {root_dir}/
    ///     ├── {collection}.json       (JSON array of documents)
    ///     └── {collection}.json.lock  (advisory lock sidecar)
    pub root_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Buffering Configuration
    // -------------------------------------------------------------------------
    /// Keep collections in memory and flush them on an interval
    pub in_memory: bool,

    /// Flush interval for in-memory collections (milliseconds)
    pub flush_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("./docshelf_data"),
            in_memory: false,
            flush_interval_ms: 10_000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Flush interval as a `Duration`
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.in_memory && self.flush_interval_ms == 0 {
            return Err(ShelfError::Config(
                "flush interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the root directory (must already exist when connecting)
    pub fn root_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.root_dir = path.into();
        self
    }

    /// Enable or disable buffered in-memory mode
    pub fn in_memory(mut self, enabled: bool) -> Self {
        self.config.in_memory = enabled;
        self
    }

    /// Set the flush interval (in milliseconds)
    pub fn flush_interval_ms(mut self, ms: u64) -> Self {
        self.config.flush_interval_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
