//! Update specifications
//!
//! An update spec maps field paths to either a literal (replace the field)
//! or an operator object. `$inc` is the only operator.
//!
//! The spec is parsed once, before the exclusive section is taken, so
//! malformed specs and unknown operators never cost any I/O.

use serde_json::{Number, Value};

use crate::document::{lookup, type_name, Document, ID_FIELD};
use crate::error::{Result, ShelfError};

/// One field assignment of an update spec
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    /// Replace the field with a value
    Set { path: String, value: Value },

    /// Add a number to a numeric field
    Inc { path: String, by: Number },
}

/// Parsed update specification
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateSpec {
    updates: Vec<FieldUpdate>,
}

impl UpdateSpec {
    /// Parse a spec object
    ///
    /// `_id` entries are skipped; identifiers are never reassigned.
    pub fn parse(spec: &Document) -> Result<Self> {
        let mut updates = Vec::with_capacity(spec.len());

        for (path, value) in spec {
            if path == ID_FIELD {
                tracing::debug!("Ignoring {} in update spec", ID_FIELD);
                continue;
            }
            if path.is_empty() || path.starts_with('$') {
                return Err(ShelfError::UnsupportedOperator(format!(
                    "top-level \"{}\" (update specs map field names to values or {{\"$inc\": n}})",
                    path
                )));
            }

            let update = match value {
                Value::Object(ops) if ops.keys().any(|k| k.starts_with('$')) => {
                    if let Some(op) = ops.keys().find(|k| k.as_str() != "$inc") {
                        return Err(ShelfError::UnsupportedOperator(format!(
                            "{} on field \"{}\"",
                            op, path
                        )));
                    }
                    match &ops["$inc"] {
                        Value::Number(by) => FieldUpdate::Inc {
                            path: path.clone(),
                            by: by.clone(),
                        },
                        other => {
                            return Err(ShelfError::TypeMismatch(format!(
                                "$inc on \"{}\" needs a numeric amount, got {}",
                                path,
                                type_name(other)
                            )))
                        }
                    }
                }
                literal => FieldUpdate::Set {
                    path: path.clone(),
                    value: literal.clone(),
                },
            };
            updates.push(update);
        }

        Ok(Self { updates })
    }

    pub fn updates(&self) -> &[FieldUpdate] {
        &self.updates
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Apply every field update to `document` in place
    ///
    /// Returns whether the document changed. On error the document may be
    /// partially updated; callers discard it.
    pub fn apply(&self, document: &mut Document) -> Result<bool> {
        let mut changed = false;

        for update in &self.updates {
            match update {
                FieldUpdate::Set { path, value } => {
                    if lookup(document, path) != Some(value) {
                        set_path(document, path, value.clone())?;
                        changed = true;
                    }
                }
                FieldUpdate::Inc { path, by } => {
                    let current = match lookup(document, path) {
                        Some(Value::Number(n)) => n.clone(),
                        Some(other) => {
                            return Err(ShelfError::TypeMismatch(format!(
                                "$inc on \"{}\" which holds {}",
                                path,
                                type_name(other)
                            )))
                        }
                        None => {
                            return Err(ShelfError::TypeMismatch(format!(
                                "$inc on missing field \"{}\"",
                                path
                            )))
                        }
                    };
                    let sum = add_numbers(&current, by, path)?;
                    if sum != current {
                        changed = true;
                    }
                    set_path(document, path, Value::Number(sum))?;
                }
            }
        }

        Ok(changed)
    }

    /// Build the document inserted by an upsert
    ///
    /// The spec itself becomes the document: literals are copied and `$inc`
    /// fields start at the increment. Criteria play no part.
    pub fn upsert_document(&self) -> Result<Document> {
        let mut document = Document::new();

        for update in &self.updates {
            match update {
                FieldUpdate::Set { path, value } => set_path(&mut document, path, value.clone())?,
                FieldUpdate::Inc { path, by } => set_path(&mut document, path, Value::Number(by.clone()))?,
            }
        }

        Ok(document)
    }
}

/// Integer + integer stays integer; anything else goes through f64
fn add_numbers(current: &Number, by: &Number, path: &str) -> Result<Number> {
    if let (Some(a), Some(b)) = (current.as_i64(), by.as_i64()) {
        if let Some(sum) = a.checked_add(b) {
            return Ok(Number::from(sum));
        }
    }

    let (a, b) = match (current.as_f64(), by.as_f64()) {
        (Some(a), Some(b)) => (a, b),
        _ => {
            return Err(ShelfError::TypeMismatch(format!(
                "$inc on \"{}\" with non-finite operands",
                path
            )))
        }
    };
    Number::from_f64(a + b).ok_or_else(|| {
        ShelfError::TypeMismatch(format!("$inc on \"{}\" overflowed", path))
    })
}

/// Assign `value` at a dotted path, creating intermediate objects
fn set_path(document: &mut Document, path: &str, value: Value) -> Result<()> {
    let (parents, leaf) = match path.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, path),
    };

    let mut target = document;
    for segment in parents.into_iter().flat_map(|p| p.split('.')) {
        let slot = target
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Document::new()));
        target = match slot {
            Value::Object(map) => map,
            other => {
                return Err(ShelfError::TypeMismatch(format!(
                    "cannot set \"{}\": \"{}\" holds {}",
                    path,
                    segment,
                    type_name(other)
                )))
            }
        };
    }

    target.insert(leaf.to_string(), value);
    Ok(())
}
