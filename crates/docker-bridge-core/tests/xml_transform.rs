// crates/docker-bridge-core/tests/xml_transform.rs
// ============================================================================
// Module: Structured Output Transform Tests
// Description: Sanitization and XML rendering of engine JSON.
// Purpose: Verify fallback scoping, idempotence, and well-formed output.
// Dependencies: docker-bridge-core, proptest, quick-xml, serde_json
// ============================================================================
//! ## Overview
//! Renders sanitized JSON through the public XML helpers and parses the
//! result back with `quick-xml` to check structure and text content.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use docker_bridge_core::xml::FALLBACK_KEY;
use docker_bridge_core::xml::collection_to_xml;
use docker_bridge_core::xml::document_to_xml;
use docker_bridge_core::xml::is_xml_char;
use docker_bridge_core::xml::is_xml_name;
use docker_bridge_core::xml::sanitize;
use proptest::prelude::*;
use quick_xml::Reader;
use quick_xml::events::Event;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// Parses a document into `(element path, text)` leaves, failing on malformed XML.
fn leaves(xml: &str) -> Vec<(String, String)> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut path: Vec<String> = Vec::new();
    let mut found = Vec::new();
    loop {
        match reader.read_event().unwrap() {
            Event::Start(start) => {
                path.push(String::from_utf8(start.name().as_ref().to_vec()).unwrap());
            }
            Event::End(_) => {
                path.pop().unwrap();
            }
            Event::Empty(empty) => {
                let name = String::from_utf8(empty.name().as_ref().to_vec()).unwrap();
                found.push((format!("{}/{name}", path.join("/")), String::new()));
            }
            Event::Text(text) => {
                found.push((path.join("/"), text.unescape().unwrap().into_owned()));
            }
            Event::Eof => break,
            _ => {}
        }
    }
    assert!(path.is_empty(), "unbalanced document: {xml}");
    found
}

/// Parses a document into `(element path, text)` for every element without
/// child elements, keeping all whitespace.
fn text_leaves(xml: &str) -> Vec<(String, String)> {
    let mut reader = Reader::from_str(xml);
    let mut path: Vec<String> = Vec::new();
    let mut text = String::new();
    let mut childless = false;
    let mut found = Vec::new();
    loop {
        match reader.read_event().unwrap() {
            Event::Start(start) => {
                path.push(String::from_utf8(start.name().as_ref().to_vec()).unwrap());
                text.clear();
                childless = true;
            }
            Event::End(_) => {
                if childless {
                    found.push((path.join("/"), std::mem::take(&mut text)));
                }
                childless = false;
                path.pop().unwrap();
            }
            Event::Empty(empty) => {
                let name = String::from_utf8(empty.name().as_ref().to_vec()).unwrap();
                found.push((format!("{}/{name}", path.join("/")), String::new()));
                childless = false;
            }
            Event::Text(chunk) => text.push_str(&chunk.unescape().unwrap()),
            Event::Eof => break,
            _ => {}
        }
    }
    assert!(path.is_empty(), "unbalanced document: {xml}");
    found
}

/// Returns true when rendering `value` emits at least one element.
fn value_renders(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.iter().any(value_renders),
        _ => true,
    }
}

/// Returns true when rendering an object member emits at least one element.
fn member_renders(member: &Value) -> bool {
    match member {
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

/// Leaves a value is expected to produce when rendered under `path`.
fn expected_leaves(value: &Value, path: &str, found: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) if !map.values().any(member_renders) => {
            found.push((path.to_string(), String::new()));
        }
        Value::Object(map) => {
            for (key, member) in map {
                let child = format!("{path}/{key}");
                match member {
                    Value::Array(items) => {
                        for entry in items {
                            match entry {
                                Value::Array(nested) if !nested.iter().any(value_renders) => {
                                    found.push((child.clone(), String::new()));
                                }
                                Value::Array(nested) => {
                                    let inner_path = format!("{child}/array");
                                    for inner in nested {
                                        expected_leaves(inner, &inner_path, found);
                                    }
                                }
                                other => expected_leaves(other, &child, found),
                            }
                        }
                    }
                    other => expected_leaves(other, &child, found),
                }
            }
        }
        Value::Array(items) => {
            for entry in items {
                expected_leaves(entry, path, found);
            }
        }
        Value::String(text) => found.push((path.to_string(), text.clone())),
        Value::Null => found.push((path.to_string(), "null".to_string())),
        other => found.push((path.to_string(), other.to_string())),
    }
}

/// Returns true when every object key in `value` is a legal element name.
fn all_keys_legal(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.iter().all(|(key, member)| is_xml_name(key) && all_keys_legal(member)),
        Value::Array(items) => items.iter().all(all_keys_legal),
        _ => true,
    }
}

// ============================================================================
// SECTION: Sanitization
// ============================================================================

#[test]
fn illegal_key_replaces_only_its_object() {
    let mut value = json!({"valid": 1, "1invalid": 2});
    sanitize(&mut value);
    assert_eq!(value, json!({FALLBACK_KEY: r#"{"valid":1,"1invalid":2}"#}));

    let xml = document_to_xml(&value, "INSPECT_CONTAINER").unwrap();
    assert_eq!(leaves(&xml), vec![(
        "INSPECT_CONTAINER/value".to_string(),
        r#"{"valid":1,"1invalid":2}"#.to_string()
    )]);
}

#[test]
fn fallback_stays_at_the_owning_depth() {
    let mut value = json!({
        "Config": {
            "Labels": {
                "Owner": {"com.example.team": "infra", "tier": "web"},
                "Tier": {"name": "web"}
            },
            "Hostname": "box"
        },
        "Name": "/web"
    });
    sanitize(&mut value);
    assert_eq!(value["Name"], json!("/web"));
    assert_eq!(value["Config"]["Hostname"], json!("box"));
    assert_eq!(value["Config"]["Labels"]["Tier"], json!({"name": "web"}));
    assert_eq!(
        value["Config"]["Labels"]["Owner"],
        json!({FALLBACK_KEY: r#"{"com.example.team":"infra","tier":"web"}"#})
    );
    let labels: Vec<&String> = value["Config"]["Labels"].as_object().unwrap().keys().collect();
    assert_eq!(labels, vec!["Owner", "Tier"]);
}

#[test]
fn xml_prefixed_keys_are_illegal() {
    assert!(!is_xml_name("xmlns"));
    assert!(!is_xml_name("XMLData"));
    assert!(!is_xml_name(""));
    assert!(!is_xml_name("a.b"));
    assert!(is_xml_name("_private"));
    assert!(is_xml_name("Exit-Code_2"));
}

#[test]
fn sanitize_is_idempotent() {
    let mut once = json!([{"ok": {"1bad": true}}, {"fine": [1, 2, {"a b": null}]}]);
    sanitize(&mut once);
    let mut twice = once.clone();
    sanitize(&mut twice);
    assert_eq!(once, twice);
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

#[test]
fn members_render_as_elements() {
    let value = json!({"Id": "abc", "Names": ["/a", "/b"], "Label": "", "Size": null});
    let xml = document_to_xml(&value, "C").unwrap();
    assert_eq!(xml, "<C><Id>abc</Id><Names>/a</Names><Names>/b</Names><Label/><Size>null</Size></C>");
}

#[test]
fn nested_arrays_use_array_elements() {
    let value = json!({"Ports": [[80, 443]]});
    let xml = document_to_xml(&value, "C").unwrap();
    assert_eq!(xml, "<C><Ports><array>80</array><array>443</array></Ports></C>");
}

#[test]
fn collections_wrap_each_item() {
    let items = vec![json!({"Id": "1"}), json!({"Id": "2"})];
    let xml = collection_to_xml(&items, "LIST_IMAGES", "IMAGE").unwrap();
    assert_eq!(leaves(&xml), vec![
        ("LIST_IMAGES/IMAGE/Id".to_string(), "1".to_string()),
        ("LIST_IMAGES/IMAGE/Id".to_string(), "2".to_string()),
    ]);
}

#[test]
fn text_is_escaped() {
    let value = json!({"Cmd": "a < b && c"});
    let xml = document_to_xml(&value, "C").unwrap();
    assert!(!xml.contains("a < b"));
    assert_eq!(leaves(&xml), vec![("C/Cmd".to_string(), "a < b && c".to_string())]);
}

#[test]
fn forbidden_control_characters_are_replaced() {
    let value = json!({"Cmd": "a\u{1b}[0m\u{0}b", "Tab": "x\ty\r\nz"});
    let xml = document_to_xml(&value, "C").unwrap();
    assert!(!xml.contains('\u{1b}'));
    assert!(!xml.contains('\u{0}'));
    assert!(xml.chars().all(is_xml_char));
    assert_eq!(text_leaves(&xml), vec![
        ("C/Cmd".to_string(), "a\u{FFFD}[0m\u{FFFD}b".to_string()),
        ("C/Tab".to_string(), "x\ty\r\nz".to_string()),
    ]);
}

// ============================================================================
// SECTION: Generated Trees
// ============================================================================

fn key_strategy() -> impl Strategy<Value = String> + Clone {
    prop_oneof![
        "[A-Za-z_][A-Za-z0-9_]{0,6}",
        "[0-9][a-z]{0,4}",
        "[a-z]{1,3}\\.[a-z]{1,3}",
        Just("xmlns".to_string()),
    ]
}

fn valid_key_strategy() -> impl Strategy<Value = String> + Clone {
    "[A-Za-z_][A-Za-z0-9_-]{0,6}".prop_filter("xml prefix", |key| is_xml_name(key))
}

fn tree_strategy<K>(keys: K, strings: BoxedStrategy<String>) -> impl Strategy<Value = Value>
where
    K: Strategy<Value = String> + Clone + 'static,
{
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(Value::from),
        strings.prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 24, 4, move |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            proptest::collection::vec((keys.clone(), inner), 0..4)
                .prop_map(|members| Value::Object(members.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

fn json_strategy() -> impl Strategy<Value = Value> {
    let strings = prop_oneof!["[ -~]{0,12}", any::<String>()].boxed();
    tree_strategy(key_strategy(), strings)
}

fn valid_json_strategy() -> impl Strategy<Value = Value> {
    let strings = prop_oneof!["\\PC{0,12}", "[a-z \\t\\r\\n<>&]{0,8}"].boxed();
    tree_strategy(valid_key_strategy(), strings)
}

proptest! {
    #[test]
    fn sanitized_trees_render_well_formed(value in json_strategy()) {
        let mut sanitized = value;
        sanitize(&mut sanitized);
        prop_assert!(all_keys_legal(&sanitized));
        let mut again = sanitized.clone();
        sanitize(&mut again);
        prop_assert_eq!(&again, &sanitized);
        let xml = collection_to_xml(std::slice::from_ref(&sanitized), "ROOT", "ITEM").unwrap();
        prop_assert!(xml.chars().all(is_xml_char));
        text_leaves(&xml);
    }

    #[test]
    fn legal_trees_round_trip_through_xml(value in valid_json_strategy()) {
        let mut sanitized = value.clone();
        sanitize(&mut sanitized);
        prop_assert_eq!(&sanitized, &value);

        let xml = document_to_xml(&sanitized, "ROOT").unwrap();
        let mut expected = Vec::new();
        expected_leaves(&sanitized, "ROOT", &mut expected);
        prop_assert_eq!(text_leaves(&xml), expected);
    }
}
