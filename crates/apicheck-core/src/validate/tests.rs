use super::*;

use proptest::prelude::*;
use serde_json::json;

fn components() -> ComponentResolver {
    ComponentResolver::from_document(&json!({
        "components": {
            "schemas": {
                "Item": {
                    "type": "object",
                    "properties": {
                        "id": {"type": "string"},
                        "name": {"type": "string"}
                    }
                },
                "Tree": {
                    "type": "object",
                    "properties": {
                        "value": {"type": "integer"},
                        "children": {"type": "array", "items": {"$ref": "#/components/schemas/Tree"}}
                    }
                },
                "LoopA": {"$ref": "#/components/schemas/LoopB"},
                "LoopB": {"$ref": "#/components/schemas/LoopA"}
            }
        }
    }))
}

fn ok(value: Value, schema: Value) -> bool {
    let c = components();
    SchemaValidator::new(&c).validate(&value, &schema).is_ok()
}

fn err(value: Value, schema: Value) -> SchemaError {
    let c = components();
    SchemaValidator::new(&c)
        .validate(&value, &schema)
        .expect_err("validation should fail")
}

fn is_invalid(e: &SchemaError) -> bool {
    matches!(e, SchemaError::InvalidDefinition { .. })
}

// ── schema definition ──

#[test]
fn node_without_type_or_composition_is_invalid_for_any_data() {
    for data in [json!(null), json!(1), json!("x"), json!({}), json!([])] {
        assert!(is_invalid(&err(data.clone(), json!({}))));
        assert!(is_invalid(&err(data, json!({"minimum": 0}))));
    }
}

#[test]
fn empty_composition_is_invalid() {
    assert!(is_invalid(&err(json!(1), json!({"oneOf": []}))));
    assert!(is_invalid(&err(json!(1), json!({"anyOf": []}))));
    assert!(is_invalid(&err(json!(1), json!({"allOf": []}))));
}

#[test]
fn unknown_type_is_invalid() {
    assert!(is_invalid(&err(json!(1), json!({"type": "decimal"}))));
}

#[test]
fn unresolvable_ref_is_invalid() {
    let e = err(json!({}), json!({"$ref": "#/components/schemas/Nope"}));
    assert!(is_invalid(&e));
    let e = err(json!({}), json!({"$ref": "#/definitions/Item"}));
    assert!(is_invalid(&e));
}

#[test]
fn cyclic_ref_chain_is_invalid() {
    let e = err(json!({}), json!({"$ref": "#/components/schemas/LoopA"}));
    assert!(is_invalid(&e));
}

#[test]
fn recursive_schema_with_finite_data_validates() {
    let tree = json!({
        "value": 1,
        "children": [{"value": 2, "children": [{"value": 3, "children": []}]}]
    });
    assert!(ok(tree, json!({"$ref": "#/components/schemas/Tree"})));
}

#[test]
fn nesting_beyond_depth_bound_is_invalid() {
    let mut tree = json!({"value": 0, "children": []});
    for value in 1..300 {
        tree = json!({"value": value, "children": [tree]});
    }
    let e = err(tree, json!({"$ref": "#/components/schemas/Tree"}));
    assert!(is_invalid(&e));
    insta::assert_snapshot!(
        e.to_string(),
        @"Invalid schema definition: schema nesting exceeds 256 levels"
    );
}

// ── composition ──

#[test]
fn one_of_accepts_any_matching_branch() {
    let schema = json!({"oneOf": [{"type": "string"}, {"type": "integer"}]});
    assert!(ok(json!("a"), schema.clone()));
    assert!(ok(json!(3), schema.clone()));
    assert!(!ok(json!(true), schema));
}

#[test]
fn one_of_does_not_require_exclusivity() {
    let schema = json!({"oneOf": [{"type": "number"}, {"type": "integer"}]});
    assert!(ok(json!(3), schema));
}

#[test]
fn any_of_reports_a_branch_error() {
    let schema = json!({"anyOf": [{"type": "string", "minLength": 3}, {"type": "integer"}]});
    let e = err(json!("ab"), schema);
    assert!(matches!(e, SchemaError::Mismatch(_)));
}

#[test]
fn invalid_branch_is_reported_whatever_the_data() {
    let schema = json!({"anyOf": [{"minimum": 0}, {"type": "string"}]});
    assert!(is_invalid(&err(json!("x"), schema.clone())));
    assert!(is_invalid(&err(json!(1), schema)));
    let schema = json!({"oneOf": [{"type": "string"}, {"minimum": 0}]});
    assert!(is_invalid(&err(json!(1), schema)));
}

#[test]
fn all_of_requires_every_branch() {
    let schema = json!({"allOf": [
        {"type": "string", "minLength": 2},
        {"type": "string", "maxLength": 4}
    ]});
    assert!(ok(json!("abc"), schema.clone()));
    assert!(!ok(json!("a"), schema.clone()));
    assert!(!ok(json!("abcde"), schema));
}

#[test]
fn composition_and_ref_layer_on_same_node() {
    let schema = json!({
        "$ref": "#/components/schemas/Item",
        "anyOf": [{"type": "object", "properties": {"id": {"type": "string"}}}]
    });
    assert!(ok(json!({"id": "1"}), schema.clone()));
    // passes the ref, fails the only branch
    assert!(!ok(json!({"name": "n"}), schema));
}

// ── object ──

#[test]
fn object_rejects_undeclared_key() {
    let e = err(
        json!({"id": "1", "extra": true}),
        json!({"$ref": "#/components/schemas/Item"}),
    );
    let SchemaError::Mismatch(v) = e else {
        panic!("expected mismatch");
    };
    assert_eq!(v.key.as_deref(), Some("extra"));
}

#[test]
fn object_without_properties_accepts_only_empty() {
    assert!(ok(json!({}), json!({"type": "object"})));
    assert!(!ok(json!({"a": 1}), json!({"type": "object"})));
}

#[test]
fn object_missing_keys_are_allowed() {
    assert!(ok(json!({"id": "1"}), json!({"$ref": "#/components/schemas/Item"})));
}

#[test]
fn nested_error_carries_key_path() {
    let schema = json!({
        "type": "object",
        "properties": {
            "items": {"type": "array", "items": {"$ref": "#/components/schemas/Item"}}
        }
    });
    let e = err(json!({"items": [{"id": "1"}, {"id": 2}]}), schema);
    insta::assert_snapshot!(
        e.to_string(),
        @"Data and schema do not match. [items[1].id] expected string, got number"
    );
}

#[test]
fn key_label_prefixes_path() {
    let c = components();
    let e = SchemaValidator::new(&c)
        .validate_with(&json!(true), &json!({"type": "string"}), Some("id"), false)
        .unwrap_err();
    insta::assert_snapshot!(
        e.to_string(),
        @"Data and schema do not match. [id] expected string, got boolean"
    );
}

#[test]
fn invalid_definition_message() {
    let e = err(json!(1), json!({}));
    insta::assert_snapshot!(
        e.to_string(),
        @"Invalid schema definition: schema node has neither `type` nor a composition keyword"
    );
}

// ── array ──

#[test]
fn array_bounds_and_items() {
    let schema = json!({"type": "array", "minItems": 1, "maxItems": 2, "items": {"type": "integer"}});
    assert!(ok(json!([1]), schema.clone()));
    assert!(!ok(json!([]), schema.clone()));
    assert!(!ok(json!([1, 2, 3]), schema.clone()));
    assert!(!ok(json!([1, "2"]), schema.clone()));
    assert!(!ok(json!({"0": 1}), schema));
}

// ── string ──

#[test]
fn string_length_enum_pattern() {
    assert!(ok(json!("abc"), json!({"type": "string", "minLength": 3, "maxLength": 3})));
    assert!(!ok(json!("ab"), json!({"type": "string", "minLength": 3})));
    assert!(ok(json!("red"), json!({"type": "string", "enum": ["red", "blue"]})));
    assert!(!ok(json!("green"), json!({"type": "string", "enum": ["red", "blue"]})));
    // pattern must match the whole string
    assert!(ok(json!("abc123"), json!({"type": "string", "pattern": "[a-z]+\\d+"})));
    assert!(!ok(json!("abc123x"), json!({"type": "string", "pattern": "[a-z]+\\d+"})));
}

#[test]
fn invalid_pattern_is_invalid_definition() {
    assert!(is_invalid(&err(json!("a"), json!({"type": "string", "pattern": "("}))));
}

#[test]
fn string_formats() {
    assert!(ok(json!("2024-01-01T00:00:00Z"), json!({"type": "string", "format": "date-time"})));
    assert!(!ok(json!("yesterday"), json!({"type": "string", "format": "date-time"})));
    assert!(ok(json!("anything"), json!({"type": "string", "format": "custom"})));
}

#[test]
fn string_coercion_only_when_enabled() {
    let c = components();
    let v = SchemaValidator::new(&c);
    let schema = json!({"type": "string", "pattern": "\\d+"});
    assert!(v.validate_with(&json!(42), &schema, Some("id"), true).is_ok());
    assert!(v.validate_with(&json!(42), &schema, Some("id"), false).is_err());
}

// ── number / integer ──

#[test]
fn number_bounds() {
    let schema = json!({"type": "number", "minimum": 1, "maximum": 10});
    assert!(ok(json!(1), schema.clone()));
    assert!(ok(json!(10), schema.clone()));
    assert!(!ok(json!(0.5), schema.clone()));
    assert!(!ok(json!(10.5), schema));
}

#[test]
fn exclusive_bounds_numeric_and_boolean_forms() {
    let numeric = json!({"type": "number", "exclusiveMinimum": 0, "exclusiveMaximum": 5});
    assert!(!ok(json!(0), numeric.clone()));
    assert!(ok(json!(0.1), numeric.clone()));
    assert!(!ok(json!(5), numeric));

    let boolean = json!({"type": "number", "minimum": 0, "exclusiveMinimum": true});
    assert!(!ok(json!(0), boolean.clone()));
    assert!(ok(json!(1), boolean));
}

#[test]
fn integer_rejects_fractional_part() {
    assert!(ok(json!(3), json!({"type": "integer"})));
    assert!(ok(json!(3.0), json!({"type": "integer"})));
    assert!(!ok(json!(3.5), json!({"type": "integer"})));
}

#[test]
fn numeric_coercion_parses_strings() {
    let c = components();
    let v = SchemaValidator::new(&c);
    let schema = json!({"type": "integer", "minimum": 1});
    assert!(v.validate_with(&json!("42"), &schema, None, true).is_ok());
    assert!(v.validate_with(&json!("42.0"), &schema, None, true).is_ok());
    assert!(v.validate_with(&json!("4.2"), &schema, None, true).is_err());
    assert!(v.validate_with(&json!("abc"), &schema, None, true).is_err());
    assert!(v.validate_with(&json!("42"), &schema, None, false).is_err());
}

// ── boolean / null ──

#[test]
fn boolean_and_null_exact() {
    assert!(ok(json!(true), json!({"type": "boolean"})));
    assert!(!ok(json!("true"), json!({"type": "boolean"})));
    assert!(ok(json!(null), json!({"type": "null"})));
    assert!(!ok(json!(0), json!({"type": "null"})));
}

#[test]
fn nullable_accepts_null() {
    assert!(ok(json!(null), json!({"type": "string", "nullable": true})));
    assert!(!ok(json!(null), json!({"type": "string"})));
}

#[test]
fn type_list_accepts_any_listed_type() {
    let schema = json!({"type": ["string", "null"]});
    assert!(ok(json!("a"), schema.clone()));
    assert!(ok(json!(null), schema.clone()));
    assert!(!ok(json!(1), schema));
}

// ── properties ──

const DECLARED: [&str; 3] = ["a", "b", "c"];
const ALL_KEYS: [&str; 5] = ["a", "b", "c", "x", "y"];

proptest! {
    #[test]
    fn object_fails_iff_undeclared_key_present(
        keys in proptest::collection::btree_set(proptest::sample::select(ALL_KEYS.to_vec()), 0..5)
    ) {
        let properties: serde_json::Map<String, Value> = DECLARED
            .iter()
            .map(|k| ((*k).to_string(), json!({"type": "string"})))
            .collect();
        let schema = json!({"type": "object", "properties": properties});
        let data: serde_json::Map<String, Value> = keys
            .iter()
            .map(|k| ((*k).to_string(), json!("v")))
            .collect();
        let has_undeclared = keys.iter().any(|k| !DECLARED.contains(k));
        prop_assert_eq!(ok(Value::Object(data), schema), !has_undeclared);
    }

    #[test]
    fn all_of_is_conjunction(min in 0u64..6, max in 0u64..6, len in 0usize..8) {
        let schema = json!({"allOf": [
            {"type": "string", "minLength": min},
            {"type": "string", "maxLength": max}
        ]});
        let len64 = len as u64;
        prop_assert_eq!(ok(json!("x".repeat(len)), schema), len64 >= min && len64 <= max);
    }
}
