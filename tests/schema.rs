//! Tests for schema conversion and reference resolution.
mod common;
use common::*;
use model_runner::prelude::*;
use model_runner::schema::{ArrayItems, Concrete};
use serde_json::json;

#[test]
fn test_object_properties_keep_declaration_order() {
    let schema = object_schema(price_input_schema());
    let names: Vec<_> = schema.properties.keys().cloned().collect();
    assert_eq!(names, vec!["address", "window", "tokens"]);
    assert!(schema.required.contains("address"));
    assert!(schema.definitions.contains_key("Token"));
}

#[test]
fn test_conversion_of_scalar_kinds() {
    let node = SchemaNode::from_json(json!({ "type": "integer", "default": 3 })).unwrap();
    match node {
        SchemaNode::Number(number) => {
            assert!(number.is_integer);
            assert_eq!(number.default, Some(serde_json::Number::from(3)));
        }
        other => panic!("expected a number schema, got {:?}", other),
    }

    let node = SchemaNode::from_json(json!({ "type": "boolean", "default": true })).unwrap();
    assert!(matches!(node, SchemaNode::Boolean(b) if b.default == Some(true)));

    let node = SchemaNode::from_json(json!({ "type": "string", "maxLength": 5 })).unwrap();
    assert!(matches!(node, SchemaNode::String(s) if s.max_length == Some(5)));
}

#[test]
fn test_untyped_node_is_a_string() {
    let node = SchemaNode::from_json(json!({ "title": "Anything" })).unwrap();
    match node {
        SchemaNode::String(string) => assert_eq!(string.title.as_deref(), Some("Anything")),
        other => panic!("expected a string schema, got {:?}", other),
    }
}

#[test]
fn test_defaults_of_the_wrong_type_are_dropped() {
    let node = SchemaNode::from_json(json!({ "type": "number", "default": "ten" })).unwrap();
    assert!(matches!(node, SchemaNode::Number(n) if n.default.is_none()));

    let node = SchemaNode::from_json(json!({ "type": "array", "items": {}, "default": 4 })).unwrap();
    assert!(matches!(node, SchemaNode::Array(a) if a.default.is_none()));
}

#[test]
fn test_tuple_items_use_the_first_entry() {
    let node = SchemaNode::from_json(json!({
        "type": "array",
        "items": [{ "type": "number" }, { "type": "string" }]
    }))
    .unwrap();
    let SchemaNode::Array(array) = node else {
        panic!("expected an array schema");
    };
    assert!(matches!(array.items, ArrayItems::Tuple(ref items) if items.len() == 2));
    assert!(matches!(array.items.item(), SchemaNode::Number(_)));
}

#[test]
fn test_empty_compositions_are_rejected() {
    assert!(SchemaNode::from_json(json!({ "allOf": [] })).is_err());
    assert!(SchemaNode::from_json(json!({ "type": "array", "items": [] })).is_err());
}

#[test]
fn test_root_must_be_an_object() {
    assert!(ObjectSchema::from_json(json!({ "type": "string" })).is_err());
    assert!(ObjectSchema::from_json(json!({ "type": "object" })).is_ok());
}

#[test]
fn test_resolve_follows_reference_chains_and_compositions() {
    let schema = object_schema(json!({
        "type": "object",
        "properties": {
            "amount": { "allOf": [{ "$ref": "#/definitions/Amount" }, { "type": "string" }] }
        },
        "definitions": {
            "Amount": { "$ref": "#/definitions/Decimal" },
            "Decimal": { "type": "number", "title": "Decimal" }
        }
    }));
    let resolver = schema.resolver();
    let concrete = resolver.resolve(&schema.properties["amount"]).unwrap();
    assert!(matches!(concrete, Concrete::Number(_)));
    assert_eq!(concrete.title(), Some("Decimal"));
}

#[test]
fn test_resolve_matches_on_the_last_path_segment() {
    let schema = object_schema(json!({
        "type": "object",
        "properties": { "flag": { "$ref": "Toggle" } },
        "definitions": { "Toggle": { "type": "boolean" } }
    }));
    let concrete = schema.resolver().resolve(&schema.properties["flag"]).unwrap();
    assert!(matches!(concrete, Concrete::Boolean(_)));
}

#[test]
fn test_resolve_unknown_reference() {
    let schema = object_schema(json!({
        "type": "object",
        "properties": { "missing": { "$ref": "#/definitions/Nope" } }
    }));
    let err = schema.resolver().resolve(&schema.properties["missing"]).unwrap_err();
    assert_eq!(
        err,
        SchemaError::InvalidReference {
            target: "#/definitions/Nope".to_string()
        }
    );
    assert!(err.to_string().contains("does not match any key"));
}

#[test]
fn test_resolve_reports_reference_cycles() {
    let schema = object_schema(json!({
        "type": "object",
        "properties": { "loop": { "$ref": "#/definitions/A" } },
        "definitions": {
            "A": { "$ref": "#/definitions/B" },
            "B": { "$ref": "#/definitions/A" }
        }
    }));
    let err = schema.resolver().resolve(&schema.properties["loop"]).unwrap_err();
    assert!(matches!(err, SchemaError::ReferenceCycle { .. }));
}

#[test]
fn test_self_referencing_definition_fails_instead_of_recursing() {
    let linked_list = json!({
        "type": "object",
        "properties": { "head": { "$ref": "#/definitions/Node" } },
        "definitions": {
            "Node": {
                "type": "object",
                "properties": {
                    "value": { "type": "number" },
                    "next": { "$ref": "#/definitions/Node" }
                }
            }
        }
    });

    let err = FormState::new(object_schema(linked_list.clone())).unwrap_err();
    assert!(matches!(
        &err,
        SchemaError::ReferenceCycle { target } if target == "#/definitions/Node"
    ));

    let err = discover(&object_schema(linked_list), &json!({})).unwrap_err();
    assert!(matches!(err, SchemaError::ReferenceCycle { .. }));

    // A tree whose children sit behind an array is still expanded eagerly by the validator.
    let tree = object_schema(json!({
        "type": "object",
        "properties": { "root": { "$ref": "#/definitions/Tree" } },
        "definitions": {
            "Tree": {
                "type": "object",
                "properties": {
                    "children": { "type": "array", "items": { "$ref": "#/definitions/Tree" } }
                }
            }
        }
    }));
    assert!(matches!(
        FormState::new(tree),
        Err(SchemaError::ReferenceCycle { .. })
    ));
}

#[test]
fn test_definition_shared_by_siblings_is_not_a_cycle() {
    let schema = object_schema(json!({
        "type": "object",
        "properties": {
            "base": { "$ref": "#/definitions/Token" },
            "quote": { "$ref": "#/definitions/Token" }
        },
        "definitions": {
            "Token": {
                "type": "object",
                "properties": { "symbol": { "type": "string", "default": "ETH" } }
            }
        }
    }));
    let form = FormState::new(schema).unwrap();
    assert_eq!(
        form.values(),
        &json!({ "base": { "symbol": "ETH" }, "quote": { "symbol": "ETH" } })
    );
}

#[test]
fn test_empty_tuple_items_read_as_strings() {
    let items = ArrayItems::Tuple(Vec::new());
    let schema = object_schema(json!({ "type": "object", "properties": {} }));
    let concrete = schema.resolver().resolve(items.item()).unwrap();
    assert!(matches!(concrete, Concrete::String(_)));
}

#[test]
fn test_model_metadata_deserializes_with_defaults() {
    let model = model_from_json(json!({ "slug": "bare.model" }));
    assert_eq!(model.label(), "bare.model");
    assert!(model.input.properties.is_empty());
    assert!(model.output.properties.is_empty());
    assert_eq!(model.header(), "bare.model (bare.model)");

    let model = price_model();
    assert_eq!(model.label(), "Price Series");
    assert_eq!(model.header(), "Price Series (price.series)\nHistorical token prices");
}
