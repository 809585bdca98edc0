//! Flush Module
//!
//! Periodic persistence for memory-backed collections.
//!
//! ## Lifecycle
//! ```text
//!   start ──► initial load (fatal on failure)
//!        └──► spawn ticker ──► tick: dirty? ──► lock file ─► write ─► unlock
//!                                   │
//!   stop ───► signal ticker ─► join ─► final flush
//! ```
//!
//! Data accepted between two ticks lives only in memory until the next
//! tick, a forced `flush_now`, or `stop`.

mod scheduler;

pub use scheduler::FlushScheduler;
