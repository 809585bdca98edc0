//! # docshelf
//!
//! A lightweight embedded document store with:
//! - One JSON array file per collection
//! - MongoDB-style find/update/remove with `$inc` and upsert
//! - Atomic read-modify-write cycles serialized per collection
//! - Optional in-memory mode flushed on an interval
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Database                             │
//! │            (root path, one Collection per name)              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Collection                            │
//! │   acquire ─► read ─► compute (matcher, $inc) ─► write ─► release
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  StorageBackend
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │    Disk     │          │   Memory    │
//!   │ (flock+JSON)│          │  (RwLock)   │
//!   └─────────────┘          └──────┬──────┘
//!                                   │ FlushScheduler
//!                                   ▼
//!                           ┌─────────────┐
//!                           │  JSON file  │
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod document;
pub mod query;
pub mod storage;
pub mod flush;
pub mod engine;
pub mod database;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ShelfError, Result};
pub use config::Config;
pub use document::{Document, ID_FIELD};
pub use engine::{Collection, FindOptions, RemoveOptions, UpdateOptions, UpdateOutcome, UpdateResult};
pub use database::Database;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of docshelf
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
