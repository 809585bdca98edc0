//! Document Module
//!
//! Schema-less records stored in a collection.
//!
//! ## Shape
//! A document is an ordered JSON object. Field order is kept as inserted
//! (`serde_json` is built with `preserve_order`), so files round-trip
//! without reshuffling keys.
//!
//! ```text
//! {
//!   "_id": "3f1c0a...",      <- assigned on insert, never reassigned
//!   "title": "hello",
//!   "meta": { "views": 3 }   <- nested fields addressed as "meta.views"
//! }
//! ```

mod id;

use serde_json::{Map, Value};

use crate::error::{Result, ShelfError};

pub use id::{IdGenerator, UuidGenerator};

/// A single stored document
pub type Document = Map<String, Value>;

/// Reserved identifier field
pub const ID_FIELD: &str = "_id";

/// Resolve a dotted path ("a.b.c") inside a document
///
/// Returns `None` as soon as a segment is missing or the parent is not an
/// object.
pub fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Interpret a criteria argument
///
/// - `null` → `Ok(None)` (absent)
/// - object → `Ok(Some(map))`, possibly empty
/// - anything else → `InvalidArgument`
pub(crate) fn criteria_arg<'a>(criteria: &'a Value, what: &str) -> Result<Option<&'a Document>> {
    match criteria {
        Value::Null => Ok(None),
        Value::Object(map) => Ok(Some(map)),
        other => Err(ShelfError::invalid(format!(
            "{} must be an object, got {}",
            what,
            type_name(other)
        ))),
    }
}

/// Interpret a required object argument (document payload, update spec)
pub(crate) fn object_arg<'a>(value: &'a Value, what: &str) -> Result<&'a Document> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Err(ShelfError::invalid(format!("{} is required", what))),
        other => Err(ShelfError::invalid(format!(
            "{} must be an object, got {}",
            what,
            type_name(other)
        ))),
    }
}

/// JSON type name for error messages
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
