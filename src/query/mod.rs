//! Query Module
//!
//! Decides whether a document satisfies a criteria object.
//!
//! ## Criteria Language
//! ```text
//! { "status": "A" }                          equality (or array contains)
//! { "meta.views": { "$gte": 10 } }           dotted path + comparison
//! { "tag": { "$in": ["a", "b"] } }           membership
//! { "$or": [ { "a": 1 }, { "b": 2 } ] }      logical combinators
//! ```
//!
//! Matching is pure and never errors: a field the document does not have
//! simply fails to match, and so does an operator the matcher does not know.

mod matcher;

pub use matcher::FieldMatcher;

use crate::document::Document;

/// Predicate evaluation used by the collection engine
pub trait CriteriaMatcher: Send + Sync {
    /// True if `document` satisfies `criteria`; empty criteria match everything
    fn matches(&self, document: &Document, criteria: &Document) -> bool;
}
