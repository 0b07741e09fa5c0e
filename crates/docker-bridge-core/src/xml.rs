// crates/docker-bridge-core/src/xml.rs
// ============================================================================
// Module: Structured Output Transform
// Description: Sanitizes JSON trees into XML-safe shape and renders them.
// Purpose: Turn arbitrary engine JSON into documents the calling engine reads.
// Dependencies: quick-xml, serde_json
// ============================================================================

//! ## Overview
//! Engine responses use JSON keys that are not always legal XML element
//! names (`1invalid`, `com.docker.label`, `xmlns`). [`sanitize`] walks the
//! tree depth-first and, for any object owning an illegal key, replaces the
//! whole object with `{"value": "<original compact JSON>"}`. Rendering then
//! maps objects to nested elements and arrays to repeated elements.
//! Invariants:
//! - After [`sanitize`], every object key satisfies [`is_xml_name`].
//! - A fallback applies only to the object that owns the illegal key;
//!   ancestors and siblings are unaffected.
//! - [`sanitize`] is idempotent.
//! - Rendered text contains only characters XML 1.0 allows; forbidden
//!   control characters become U+FFFD.

// ============================================================================
// SECTION: Imports
// ============================================================================

use quick_xml::Writer;
use quick_xml::events::BytesEnd;
use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;
use serde_json::Map;
use serde_json::Value;

use crate::error::BridgeError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Key holding the serialized form of an object that failed sanitization.
pub const FALLBACK_KEY: &str = "value";

/// Element used for entries of arrays nested directly in arrays.
const NESTED_ARRAY_TAG: &str = "array";

/// Substitute for characters XML 1.0 does not allow.
const REPLACEMENT_CHAR: char = '\u{FFFD}';

// ============================================================================
// SECTION: Sanitization
// ============================================================================

/// Returns true when `name` is `[A-Za-z_][A-Za-z0-9_-]*` without an `xml` prefix.
#[must_use]
pub fn is_xml_name(name: &str) -> bool {
    let mut bytes = name.bytes();
    let Some(first) = bytes.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == b'_') {
        return false;
    }
    if !bytes.all(|byte| byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-') {
        return false;
    }
    !name.as_bytes().get(..3).is_some_and(|prefix| prefix.eq_ignore_ascii_case(b"xml"))
}

/// Sanitizes `value` in place.
pub fn sanitize(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if map.keys().all(|key| is_xml_name(key)) {
                map.values_mut().for_each(sanitize);
            } else {
                let original = Value::Object(std::mem::take(map)).to_string();
                let mut replacement = Map::new();
                replacement.insert(FALLBACK_KEY.to_string(), Value::String(original));
                *map = replacement;
            }
        }
        Value::Array(items) => items.iter_mut().for_each(sanitize),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
    }
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Renders a sanitized value as one document under `root`.
///
/// # Errors
///
/// Returns [`BridgeError::OutputDecode`] when the writer fails.
pub fn document_to_xml(value: &Value, root: &str) -> Result<String, BridgeError> {
    let mut emitter = XmlEmitter::new();
    emitter.value(value, root)?;
    emitter.finish()
}

/// Renders sanitized values as `item` elements wrapped in `root`.
///
/// # Errors
///
/// Returns [`BridgeError::OutputDecode`] when the writer fails.
pub fn collection_to_xml(items: &[Value], root: &str, item: &str) -> Result<String, BridgeError> {
    let mut emitter = XmlEmitter::new();
    emitter.start(root)?;
    for entry in items {
        emitter.value(entry, item)?;
    }
    emitter.end(root)?;
    emitter.finish()
}

/// Text form of a scalar.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Returns true when XML 1.0 allows `ch` in character data.
#[must_use]
pub const fn is_xml_char(ch: char) -> bool {
    matches!(ch, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..)
}

/// Escapes markup and carriage returns, replacing forbidden characters.
fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\r' => escaped.push_str("&#13;"),
            ch if is_xml_char(ch) => escaped.push(ch),
            _ => escaped.push(REPLACEMENT_CHAR),
        }
    }
    escaped
}

/// Event writer accumulating a document in memory.
struct XmlEmitter {
    /// Underlying quick-xml writer.
    writer: Writer<Vec<u8>>,
}

impl XmlEmitter {
    /// Creates an empty emitter.
    fn new() -> Self {
        Self {
            writer: Writer::new(Vec::new()),
        }
    }

    /// Writes one event.
    fn write(&mut self, event: Event<'_>) -> Result<(), BridgeError> {
        self.writer
            .write_event(event)
            .map_err(|err| BridgeError::OutputDecode(format!("Unable to write XML: {err}")))
    }

    /// Opens `tag`.
    fn start(&mut self, tag: &str) -> Result<(), BridgeError> {
        self.write(Event::Start(BytesStart::new(tag)))
    }

    /// Closes `tag`.
    fn end(&mut self, tag: &str) -> Result<(), BridgeError> {
        self.write(Event::End(BytesEnd::new(tag)))
    }

    /// Writes `<tag/>`.
    fn empty(&mut self, tag: &str) -> Result<(), BridgeError> {
        self.write(Event::Empty(BytesStart::new(tag)))
    }

    /// Writes escaped text.
    fn text(&mut self, text: &str) -> Result<(), BridgeError> {
        if text.is_empty() {
            return Ok(());
        }
        self.write(Event::Text(BytesText::from_escaped(escape_text(text))))
    }

    /// Renders `value` under `tag`; arrays repeat `tag` per entry.
    fn value(&mut self, value: &Value, tag: &str) -> Result<(), BridgeError> {
        match value {
            Value::Object(map) => {
                self.start(tag)?;
                for (key, member) in map {
                    self.member(key, member)?;
                }
                self.end(tag)
            }
            Value::Array(items) => {
                for entry in items {
                    self.value(entry, tag)?;
                }
                Ok(())
            }
            scalar => {
                self.start(tag)?;
                self.text(&scalar_text(scalar))?;
                self.end(tag)
            }
        }
    }

    /// Renders one object member.
    fn member(&mut self, key: &str, member: &Value) -> Result<(), BridgeError> {
        match member {
            Value::Array(items) => {
                for entry in items {
                    if let Value::Array(nested) = entry {
                        self.start(key)?;
                        for inner in nested {
                            self.value(inner, NESTED_ARRAY_TAG)?;
                        }
                        self.end(key)?;
                    } else {
                        self.value(entry, key)?;
                    }
                }
                Ok(())
            }
            Value::String(text) if text.is_empty() => self.empty(key),
            other => self.value(other, key),
        }
    }

    /// Returns the rendered document.
    fn finish(self) -> Result<String, BridgeError> {
        String::from_utf8(self.writer.into_inner())
            .map_err(|err| BridgeError::OutputDecode(format!("Rendered XML is not UTF-8: {err}")))
    }
}
