//! Tests for form defaults, validation, array edits and field rendering.
mod common;
use common::*;
use model_runner::prelude::*;
use serde_json::json;

fn price_form() -> FormState {
    FormState::new(object_schema(price_input_schema())).expect("price form should build")
}

#[test]
fn test_initial_values_follow_schema_defaults() {
    let form = price_form();
    assert_eq!(
        form.values(),
        &json!({ "address": "", "window": 7, "tokens": [] })
    );
}

#[test]
fn test_initial_values_for_every_kind() {
    let form = FormState::new(object_schema(json!({
        "type": "object",
        "properties": {
            "enabled": { "type": "boolean" },
            "on": { "type": "boolean", "default": true },
            "ratio": { "type": "number" },
            "label": { "type": "string", "default": "x" },
            "list": { "type": "array", "items": { "type": "number" }, "default": [1, 2] },
            "nested": {
                "type": "object",
                "properties": { "depth": { "type": "integer", "default": 2 } }
            },
            "odd": { "type": "boolean", "default": "yes" }
        }
    })))
    .unwrap();

    assert_eq!(
        form.values(),
        &json!({
            "enabled": false,
            "on": true,
            "ratio": 0,
            "label": "x",
            "list": [],
            "nested": { "depth": 2 },
            "odd": false
        })
    );
}

#[test]
fn test_required_and_array_length_messages() {
    let form = price_form();
    let errors = form.errors();
    assert_eq!(errors.get("address").as_deref(), Some("Required."));
    assert_eq!(
        errors.get("tokens").as_deref(),
        Some("tokens field must have at least 1 items")
    );
    assert_eq!(errors.get("window"), None);
}

#[test]
fn test_error_lookup_below_an_array_message() {
    let errors = price_form().errors();
    // Indexing into an array-level message reads single characters.
    assert_eq!(errors.get("tokens[0]").as_deref(), Some("t"));
    assert_eq!(errors.get("tokens[1]").as_deref(), Some("o"));
    assert_eq!(errors.get("tokens[0][0]").as_deref(), Some("t"));
    assert_eq!(errors.get("tokens[0][1]"), None);
    assert_eq!(errors.get("tokens[0].symbol"), None);
    assert_eq!(errors.get("tokens[99]"), None);
    assert_eq!(errors.get("missing.deeper"), None);
}

#[test]
fn test_pattern_and_length_messages() {
    let mut form = FormState::new(object_schema(json!({
        "type": "object",
        "properties": {
            "address": { "type": "string", "pattern": "^0x" },
            "code": { "type": "string", "maxLength": 3 }
        }
    })))
    .unwrap();

    form.set_value("address", json!("abc"));
    form.set_value("code", json!("ABCD"));
    let errors = form.errors();
    assert_eq!(errors.get("address").as_deref(), Some("Invalid value. Not matching ^0x"));
    assert_eq!(errors.get("code").as_deref(), Some("Cannot be more than 3 characters"));

    form.set_value("address", json!("0xabc"));
    form.set_value("code", json!("ABC"));
    assert!(form.errors().is_empty());
}

#[test]
fn test_optional_string_with_pattern_still_checks_empty_text() {
    let form = FormState::new(object_schema(json!({
        "type": "object",
        "properties": { "address": { "type": "string", "pattern": "^0x" } }
    })))
    .unwrap();
    assert_eq!(
        form.errors().get("address").as_deref(),
        Some("Invalid value. Not matching ^0x")
    );
}

#[test]
fn test_type_messages() {
    let mut form = FormState::new(object_schema(json!({
        "type": "object",
        "properties": {
            "count": { "type": "integer" },
            "flag": { "type": "boolean" }
        }
    })))
    .unwrap();

    form.set_value("count", json!("12"));
    form.set_value("flag", json!("true"));
    assert!(form.errors().is_empty());

    form.set_value("count", json!("twelve"));
    form.set_value("flag", json!([1]));
    let errors = form.errors();
    assert_eq!(errors.get("count").as_deref(), Some("count must be a `number` type"));
    assert_eq!(errors.get("flag").as_deref(), Some("flag must be a `boolean` type"));
}

#[test]
fn test_max_items_is_checked_as_a_lower_bound() {
    let mut form = FormState::new(object_schema(json!({
        "type": "object",
        "properties": {
            "points": { "type": "array", "items": { "type": "number" }, "maxItems": 2 }
        }
    })))
    .unwrap();

    form.edit_array("points", ArrayAction::Push).unwrap();
    assert_eq!(
        form.errors().get("points").as_deref(),
        Some("points field must have at least 2 items")
    );

    form.edit_array("points", ArrayAction::Push).unwrap();
    form.edit_array("points", ArrayAction::Push).unwrap();
    assert!(form.errors().is_empty());
}

#[test]
fn test_invalid_pattern_is_reported_when_building_the_form() {
    let err = FormState::new(object_schema(json!({
        "type": "object",
        "properties": { "code": { "type": "string", "pattern": "([a-z" } }
    })))
    .unwrap_err();
    match err {
        SchemaError::InvalidPattern { path, pattern, .. } => {
            assert_eq!(path, "code");
            assert_eq!(pattern, "([a-z");
        }
        other => panic!("expected an invalid pattern error, got {:?}", other),
    }
}

#[test]
fn test_array_push_insert_and_remove() {
    let mut form = price_form();

    form.edit_array("tokens", ArrayAction::Push).unwrap();
    assert_eq!(form.value("tokens"), Some(&json!([{ "symbol": "", "weight": 1 }])));

    form.set_value("tokens[0].symbol", json!("AAA"));
    form.edit_array("tokens", ArrayAction::InsertBefore(0)).unwrap();
    form.set_value("tokens[0].symbol", json!("BBB"));
    assert_eq!(
        form.value("tokens"),
        Some(&json!([
            { "symbol": "BBB", "weight": 1 },
            { "symbol": "AAA", "weight": 1 }
        ]))
    );

    form.edit_array("tokens", ArrayAction::Remove(0)).unwrap();
    assert_eq!(form.value("tokens"), Some(&json!([{ "symbol": "AAA", "weight": 1 }])));

    // Out of range removals are ignored, inserts are clamped to the end.
    form.edit_array("tokens", ArrayAction::Remove(5)).unwrap();
    form.edit_array("tokens", ArrayAction::InsertBefore(9)).unwrap();
    assert_eq!(form.value("tokens[1].symbol"), Some(&json!("")));
}

#[test]
fn test_array_item_errors() {
    let mut form = price_form();
    form.set_value("address", json!("0x01"));
    form.edit_array("tokens", ArrayAction::Push).unwrap();

    let errors = form.errors();
    assert_eq!(errors.get("tokens[0].symbol").as_deref(), Some("Required."));
    assert_eq!(errors.get("tokens"), None);

    form.set_value("tokens[0].symbol", json!("AAA"));
    assert!(form.errors().is_empty());
}

#[test]
fn test_toggle() {
    let mut form = FormState::new(object_schema(json!({
        "type": "object",
        "properties": { "enabled": { "type": "boolean" } }
    })))
    .unwrap();
    form.toggle("enabled");
    assert_eq!(form.value("enabled"), Some(&json!(true)));
    form.toggle("enabled");
    assert_eq!(form.value("enabled"), Some(&json!(false)));
}

#[test]
fn test_submit_returns_a_snapshot_or_errors() {
    let mut form = price_form();
    let errors = form.submit().unwrap_err();
    assert!(!errors.is_empty());
    let paths: Vec<_> = errors.messages().into_iter().map(|(path, _)| path).collect();
    assert_eq!(paths, vec!["address", "tokens"]);

    form.set_value("address", json!("0x01"));
    form.edit_array("tokens", ArrayAction::Push).unwrap();
    form.set_value("tokens[0].symbol", json!("AAA"));
    let values = form.submit().unwrap();
    assert_eq!(
        values,
        json!({ "address": "0x01", "window": 7, "tokens": [{ "symbol": "AAA", "weight": 1 }] })
    );
}

#[test]
fn test_render_form_fields() {
    let form = price_form();
    let root = render_form(&form).unwrap();

    let Field::Group { children, .. } = &root else {
        panic!("expected the root group, got {:?}", root);
    };
    assert_eq!(children.len(), 3);

    match root.find("address") {
        Some(Field::Input {
            label, kind, error, ..
        }) => {
            assert_eq!(label, "address: Address");
            assert_eq!(*kind, InputKind::Text);
            // Untouched fields do not show their message yet.
            assert_eq!(*error, None);
        }
        other => panic!("expected the address input, got {:?}", other),
    }
    assert!(matches!(
        root.find("window"),
        Some(Field::Input { kind: InputKind::Numeric, value, .. }) if *value == json!(7)
    ));
    match root.find("tokens") {
        Some(Field::List {
            label, items, push, error, ..
        }) => {
            assert_eq!(label, "tokens: Tokens");
            assert!(items.is_empty());
            assert_eq!(*push, Some(ArrayAction::Push));
            assert_eq!(error.as_deref(), Some("tokens field must have at least 1 items"));
        }
        other => panic!("expected the tokens list, got {:?}", other),
    }
}

#[test]
fn test_render_shows_messages_once_touched() {
    let mut form = price_form();
    form.touch("address");
    let root = render_form(&form).unwrap();
    assert!(matches!(
        root.find("address"),
        Some(Field::Input { error: Some(message), .. }) if message == "Required."
    ));
}

#[test]
fn test_render_list_items_offer_remove_and_insert() {
    let mut form = price_form();
    form.edit_array("tokens", ArrayAction::Push).unwrap();
    let root = render_form(&form).unwrap();

    let Some(Field::List { items, push, .. }) = root.find("tokens") else {
        panic!("expected the tokens list");
    };
    assert_eq!(*push, None);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].remove, ArrayAction::Remove(0));
    assert_eq!(items[0].insert_before, ArrayAction::InsertBefore(0));
    assert!(root.find("tokens[0].symbol").is_some());
    assert!(matches!(
        root.find("tokens[0].weight"),
        Some(Field::Input { kind: InputKind::Numeric, .. })
    ));
}

#[test]
fn test_array_message_is_not_shown_on_its_items() {
    let mut form = FormState::new(object_schema(json!({
        "type": "object",
        "properties": {
            "tags": { "type": "array", "items": { "type": "string" }, "minItems": 2 }
        }
    })))
    .unwrap();
    form.edit_array("tags", ArrayAction::Push).unwrap();
    assert!(form.submit().is_err());

    // Looking an element up inside the array-level message reads one character.
    let errors = form.errors();
    assert_eq!(errors.get("tags[0]").as_deref(), Some("t"));

    let root = render_form(&form).unwrap();
    assert!(matches!(root.find("tags[0]"), Some(Field::Input { error: None, .. })));
    assert!(matches!(root.find("tags"), Some(Field::List { error: Some(_), .. })));
}

#[test]
fn test_render_without_inputs() {
    let form = FormState::new(ObjectSchema::default()).unwrap();
    let root = render_form(&form).unwrap();
    assert_eq!(root, Field::NoInputRequired);
    assert_eq!(root.to_string(), "No input required\n");
}

#[test]
fn test_rendered_text() {
    let mut form = price_form();
    form.edit_array("tokens", ArrayAction::Push).unwrap();
    let text = render_form(&form).unwrap().to_string();

    assert!(text.contains("address: Address = \n"));
    assert!(text.contains("window = 7\n"));
    assert!(text.contains("tokens: Tokens (1 items)\n"));
    assert!(text.contains("[remove #0] [add before #0]"));
}
