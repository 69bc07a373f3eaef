//! XML response bodies as [`serde_json::Value`] trees.
//!
//! The conversion mirrors what a JSON body would look like, with one quirk the
//! JSON encoding does not have: a tag that occurs once becomes a bare value,
//! and only a repeated tag becomes an array. [`crate::envelope::normalize`]
//! undoes that for record lists.

use roxmltree::{Document, Node};
use serde_json::{Map, Value};

use crate::error::Result;

/// Parses `text` and returns `{ <root tag>: <root content> }`.
///
/// - an element holding only text becomes a string (trimmed), an empty one `null`;
/// - an element with child elements becomes an object keyed by tag name;
/// - attributes become `@name` keys, text next to child elements becomes `#text`.
pub fn to_value(text: &str) -> Result<Value> {
    let doc = Document::parse(text)?;
    let root = doc.root_element();

    let mut top = Map::new();
    top.insert(root.tag_name().name().to_string(), element_value(root));
    Ok(Value::Object(top))
}

fn element_value(node: Node) -> Value {
    let mut map = Map::new();
    for attr in node.attributes() {
        map.insert(
            format!("@{}", attr.name()),
            Value::String(attr.value().to_string()),
        );
    }

    let mut text = String::new();
    for child in node.children() {
        if child.is_element() {
            let name = child.tag_name().name().to_string();
            let value = element_value(child);
            match map.get_mut(&name) {
                Some(Value::Array(items)) => items.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
                None => {
                    map.insert(name, value);
                }
            }
        } else if child.is_text() {
            text.push_str(child.text().unwrap_or_default());
        }
    }

    let text = text.trim();
    if map.is_empty() {
        if text.is_empty() {
            Value::Null
        } else {
            Value::String(text.to_string())
        }
    } else {
        if !text.is_empty() {
            map.insert("#text".to_string(), Value::String(text.to_string()));
        }
        Value::Object(map)
    }
}
