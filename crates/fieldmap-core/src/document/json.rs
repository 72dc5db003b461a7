//! JSON document adapter
//!
//! Object keys starting with `@` become attribute keys so that paths such as
//! `/item/@id` work the same for JSON and XML. Integral numbers are read as
//! `Long`, everything else numeric as `Double`.
//!
//! Copyright (c) 2025 Fieldmap Team
//! Licensed under the Apache-2.0 license

use super::{Document, DocumentAdapter, DocumentFormat, Node, NodeKey, ObjectNode};
use crate::types::ScalarValue;
use crate::{Error, Result};
use serde_json::{Map, Value};

/// Key under which an object's simple content is kept when it also has children
pub const TEXT_KEY: &str = "#text";

/// JSON text adapter
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonAdapter {
    pretty: bool,
}

impl JsonAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Build a document from an already-parsed JSON value
    pub fn from_value(value: Value) -> Document {
        Document::from_node(DocumentFormat::Json, node_from_value(value))
    }

    /// Convert a document tree to a JSON value
    pub fn to_value(document: &Document) -> Value {
        value_from_node(document.root())
    }
}

impl DocumentAdapter for JsonAdapter {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Json
    }

    fn parse(&self, input: &str) -> Result<Document> {
        if input.trim().is_empty() {
            return Err(Error::EmptyDocument {
                format: DocumentFormat::Json,
            });
        }
        let value: Value = serde_json::from_str(input).map_err(|e| Error::Parse {
            format: DocumentFormat::Json,
            message: e.to_string(),
        })?;
        Ok(Self::from_value(value))
    }

    fn render(&self, document: &Document) -> Result<String> {
        let value = Self::to_value(document);
        let rendered = if self.pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        };
        Ok(rendered)
    }
}

pub(crate) fn node_from_value(value: Value) -> Node {
    match value {
        Value::Null => Node::Null,
        Value::Bool(b) => Node::Value(ScalarValue::Boolean(b)),
        Value::Number(n) => match n.as_i64() {
            Some(v) => Node::Value(ScalarValue::Long(v)),
            None => Node::Value(ScalarValue::Double(n.as_f64().unwrap_or(f64::NAN))),
        },
        Value::String(s) => Node::Value(ScalarValue::String(s)),
        Value::Array(items) => Node::Array(items.into_iter().map(node_from_value).collect()),
        Value::Object(map) => {
            let mut object = ObjectNode::new();
            for (key, value) in map {
                if key == TEXT_KEY {
                    object.set_text(node_from_value(value).as_scalar().cloned());
                    continue;
                }
                let key = match key.strip_prefix('@') {
                    Some(name) => NodeKey::attribute(name),
                    None => NodeKey::element(key),
                };
                object.insert(key, node_from_value(value));
            }
            Node::Object(object)
        }
    }
}

pub(crate) fn value_from_node(node: &Node) -> Value {
    match node {
        Node::Null => Value::Null,
        Node::Value(value) => value.to_json(),
        Node::Array(items) => Value::Array(items.iter().map(value_from_node).collect()),
        Node::Object(object) => {
            if object.entries().is_empty() {
                if let Some(text) = object.text() {
                    return text.to_json();
                }
            }
            let mut map = Map::new();
            if let Some(text) = object.text() {
                map.insert(TEXT_KEY.to_string(), text.to_json());
            }
            for (key, child) in object.entries() {
                map.insert(key.to_string(), value_from_node(child));
            }
            Value::Object(map)
        }
    }
}
