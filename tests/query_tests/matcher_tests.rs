//! Tests for FieldMatcher

use docshelf::query::{CriteriaMatcher, FieldMatcher};
use docshelf::Document;
use serde_json::{json, Value};

fn doc(value: Value) -> Document {
    value.as_object().unwrap().clone()
}

fn matches(document: Value, criteria: Value) -> bool {
    FieldMatcher.matches(&doc(document), &doc(criteria))
}

fn sample() -> Value {
    json!({
        "_id": "1",
        "name": "widget",
        "qty": 25,
        "price": 2.5,
        "active": true,
        "tags": ["red", "small"],
        "meta": { "views": 10, "owner": { "id": "u1" } }
    })
}

// =============================================================================
// Equality
// =============================================================================

#[test]
fn test_empty_criteria_matches_everything() {
    assert!(matches(sample(), json!({})));
    assert!(matches(json!({}), json!({})));
}

#[test]
fn test_literal_equality() {
    assert!(matches(sample(), json!({ "name": "widget", "qty": 25 })));
    assert!(!matches(sample(), json!({ "name": "widget", "qty": 26 })));
}

#[test]
fn test_integer_and_float_compare_equal() {
    assert!(matches(json!({ "n": 1 }), json!({ "n": 1.0 })));
}

#[test]
fn test_missing_field_never_equals() {
    assert!(!matches(sample(), json!({ "color": "red" })));
    assert!(!matches(sample(), json!({ "color": null })));
}

#[test]
fn test_array_field_matches_element() {
    assert!(matches(sample(), json!({ "tags": "red" })));
    assert!(matches(sample(), json!({ "tags": ["red", "small"] })));
    assert!(!matches(sample(), json!({ "tags": "blue" })));
}

#[test]
fn test_embedded_object_equality_is_exact() {
    assert!(matches(json!({ "a": { "b": 1 } }), json!({ "a": { "b": 1 } })));
    assert!(!matches(json!({ "a": { "b": 1, "c": 2 } }), json!({ "a": { "b": 1 } })));
}

#[test]
fn test_dotted_paths() {
    assert!(matches(sample(), json!({ "meta.views": 10 })));
    assert!(matches(sample(), json!({ "meta.owner.id": "u1" })));
    assert!(!matches(sample(), json!({ "meta.owner.name": "x" })));
    assert!(!matches(sample(), json!({ "name.first": "widget" })));
}

// =============================================================================
// Operators
// =============================================================================

#[test]
fn test_comparison_operators() {
    assert!(matches(sample(), json!({ "qty": { "$gt": 20 } })));
    assert!(matches(sample(), json!({ "qty": { "$gte": 25, "$lte": 25 } })));
    assert!(matches(sample(), json!({ "price": { "$lt": 3 } })));
    assert!(!matches(sample(), json!({ "qty": { "$gt": 20, "$lt": 25 } })));
    assert!(matches(sample(), json!({ "name": { "$gt": "apple" } })));
}

#[test]
fn test_comparison_across_types_fails() {
    assert!(!matches(sample(), json!({ "name": { "$gt": 1 } })));
    assert!(!matches(sample(), json!({ "missing": { "$lt": 1 } })));
}

#[test]
fn test_eq_and_ne() {
    assert!(matches(sample(), json!({ "qty": { "$eq": 25 } })));
    assert!(matches(sample(), json!({ "qty": { "$ne": 3 } })));
    assert!(!matches(sample(), json!({ "qty": { "$ne": 25 } })));
    assert!(matches(sample(), json!({ "missing": { "$ne": 1 } })));
}

#[test]
fn test_in_and_nin() {
    assert!(matches(sample(), json!({ "name": { "$in": ["gadget", "widget"] } })));
    assert!(matches(sample(), json!({ "tags": { "$in": ["small"] } })));
    assert!(!matches(sample(), json!({ "name": { "$in": [] } })));
    assert!(matches(sample(), json!({ "name": { "$nin": ["gadget"] } })));
    assert!(!matches(sample(), json!({ "tags": { "$nin": ["red"] } })));
    assert!(!matches(sample(), json!({ "name": { "$in": "widget" } })));
}

#[test]
fn test_exists() {
    assert!(matches(sample(), json!({ "meta.views": { "$exists": true } })));
    assert!(matches(sample(), json!({ "color": { "$exists": false } })));
    assert!(!matches(sample(), json!({ "name": { "$exists": 0 } })));
}

#[test]
fn test_unknown_field_operator_never_matches() {
    assert!(!matches(sample(), json!({ "qty": { "$regex": "2" } })));
}

// =============================================================================
// Logical Combinators
// =============================================================================

#[test]
fn test_and_or_nor() {
    assert!(matches(sample(), json!({ "$and": [{ "qty": 25 }, { "active": true }] })));
    assert!(!matches(sample(), json!({ "$and": [{ "qty": 25 }, { "active": false }] })));
    assert!(matches(sample(), json!({ "$or": [{ "qty": 1 }, { "name": "widget" }] })));
    assert!(!matches(sample(), json!({ "$or": [] })));
    assert!(matches(sample(), json!({ "$nor": [{ "qty": 1 }, { "name": "gadget" }] })));
}

#[test]
fn test_combinators_mix_with_fields() {
    let criteria = json!({
        "active": true,
        "$or": [{ "tags": "blue" }, { "meta.views": { "$gte": 5 } }]
    });
    assert!(matches(sample(), criteria));
}

#[test]
fn test_malformed_combinator_never_matches() {
    assert!(!matches(sample(), json!({ "$and": { "qty": 25 } })));
    assert!(!matches(sample(), json!({ "$or": [1, 2] })));
}

#[test]
fn test_unknown_top_level_operator_never_matches() {
    assert!(!matches(sample(), json!({ "$where": "true" })));
}

#[test]
fn test_nested_combinators() {
    let criteria = json!({
        "$and": [
            { "$or": [{ "qty": 1 }, { "tags": "small" }] },
            { "$nor": [{ "active": false }, { "meta.views": { "$gt": 100 } }] }
        ]
    });
    assert!(matches(sample(), criteria));

    let criteria = json!({
        "$or": [
            { "$and": [{ "qty": 25 }, { "active": false }] },
            { "$nor": [{ "name": "widget" }] }
        ]
    });
    assert!(!matches(sample(), criteria));
}
