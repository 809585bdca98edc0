//! Default criteria matcher
//!
//! Field constraints are ANDed; each constraint is either a literal value or
//! an object of `$` operators.

use std::cmp::Ordering;

use serde_json::Value;

use crate::document::{lookup, Document};

use super::CriteriaMatcher;

/// MongoDB-style field matcher
#[derive(Debug, Default, Clone, Copy)]
pub struct FieldMatcher;

impl CriteriaMatcher for FieldMatcher {
    fn matches(&self, document: &Document, criteria: &Document) -> bool {
        criteria
            .iter()
            .all(|(key, condition)| match key.as_str() {
                "$and" => Self::each_clause(document, condition, |results| results.iter().all(|&m| m)),
                "$or" => Self::each_clause(document, condition, |results| results.iter().any(|&m| m)),
                "$nor" => Self::each_clause(document, condition, |results| !results.iter().any(|&m| m)),
                k if k.starts_with('$') => false,
                path => Self::field_matches(lookup(document, path), condition),
            })
    }
}

impl FieldMatcher {
    /// Evaluate a logical combinator over an array of sub-criteria
    ///
    /// A malformed clause list (not an array of objects) never matches.
    fn each_clause<F>(document: &Document, clauses: &Value, combine: F) -> bool
    where
        F: FnOnce(&[bool]) -> bool,
    {
        let Some(clauses) = clauses.as_array() else {
            return false;
        };
        if clauses.iter().any(|c| !c.is_object()) {
            return false;
        }

        let results: Vec<bool> = clauses
            .iter()
            .filter_map(Value::as_object)
            .map(|clause| FieldMatcher.matches(document, clause))
            .collect();
        combine(&results)
    }

    /// Check one field against a literal or an operator object
    fn field_matches(value: Option<&Value>, condition: &Value) -> bool {
        match condition {
            Value::Object(ops) if ops.keys().any(|k| k.starts_with('$')) => ops
                .iter()
                .all(|(op, arg)| Self::operator_matches(value, op, arg)),
            literal => value.map_or(false, |v| Self::equals(v, literal)),
        }
    }

    fn operator_matches(value: Option<&Value>, op: &str, arg: &Value) -> bool {
        match op {
            "$eq" => value.map_or(false, |v| Self::equals(v, arg)),
            "$ne" => !value.map_or(false, |v| Self::equals(v, arg)),
            "$gt" => Self::ordered(value, arg, |o| o == Ordering::Greater),
            "$gte" => Self::ordered(value, arg, |o| o != Ordering::Less),
            "$lt" => Self::ordered(value, arg, |o| o == Ordering::Less),
            "$lte" => Self::ordered(value, arg, |o| o != Ordering::Greater),
            "$in" => match arg {
                Value::Array(candidates) => value.map_or(false, |v| {
                    candidates.iter().any(|c| Self::equals(v, c))
                }),
                _ => false,
            },
            "$nin" => match arg {
                Value::Array(candidates) => !value.map_or(false, |v| {
                    candidates.iter().any(|c| Self::equals(v, c))
                }),
                _ => false,
            },
            "$exists" => value.is_some() == Self::truthy(arg),
            _ => false,
        }
    }

    /// Equality, with array fields matching when any element is equal
    fn equals(value: &Value, expected: &Value) -> bool {
        if Self::same(value, expected) {
            return true;
        }
        match value {
            Value::Array(items) => items.iter().any(|item| Self::same(item, expected)),
            _ => false,
        }
    }

    /// JSON equality that treats 1 and 1.0 as the same number
    fn same(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => x == y,
            },
            _ => a == b,
        }
    }

    fn ordered(value: Option<&Value>, arg: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
        value
            .and_then(|v| Self::compare(v, arg))
            .map_or(false, accept)
    }

    /// Ordering between two values of the same JSON type
    fn compare(a: &Value, b: &Value) -> Option<Ordering> {
        match (a, b) {
            (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
            (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
            (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
            _ => None,
        }
    }

    fn truthy(value: &Value) -> bool {
        match value {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
            _ => true,
        }
    }
}
