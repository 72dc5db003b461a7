//! Format-neutral document tree
//!
//! Every supported format is parsed into the same tree of [`Node`]s so that
//! path navigation, collection counting and incremental construction are
//! written once. Format adapters only translate between text (or Rust values)
//! and this tree.
//!
//! Copyright (c) 2025 Fieldmap Team
//! Licensed under the Apache-2.0 license

pub mod json;
pub mod object;
pub mod tree;
pub mod xml;

pub use json::JsonAdapter;
pub use object::ObjectAdapter;
pub use xml::XmlAdapter;

use crate::config::MapperConfig;
use crate::types::ScalarValue;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Document formats understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Json,
    Xml,
    /// In-memory object graph built through serde
    Object,
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Json => write!(f, "JSON"),
            DocumentFormat::Xml => write!(f, "XML"),
            DocumentFormat::Object => write!(f, "object"),
        }
    }
}

/// Translates between a text format and a [`Document`]
pub trait DocumentAdapter {
    fn format(&self) -> DocumentFormat;

    /// Parse document text; empty or malformed input is a fatal error
    fn parse(&self, input: &str) -> Result<Document>;

    fn render(&self, document: &Document) -> Result<String>;
}

/// Build the text adapter for `format` using the configured options
pub fn text_adapter(format: DocumentFormat, config: &MapperConfig) -> Result<Box<dyn DocumentAdapter>> {
    match format {
        DocumentFormat::Json => Ok(Box::new(JsonAdapter::new().with_pretty(config.json.pretty))),
        DocumentFormat::Xml => Ok(Box::new(XmlAdapter::from_config(config))),
        DocumentFormat::Object => Err(Error::configuration(
            "object documents have no text form; use ObjectAdapter",
        )),
    }
}

/// Key of an object child: a name plus the attribute flag
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeKey {
    pub name: String,
    pub attribute: bool,
}

impl NodeKey {
    pub fn element(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attribute: false,
        }
    }

    pub fn attribute(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attribute: true,
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.attribute {
            write!(f, "@")?;
        }
        write!(f, "{}", self.name)
    }
}

/// Object node: named children in insertion order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectNode {
    type_name: Option<String>,
    text: Option<ScalarValue>,
    entries: Vec<(NodeKey, Node)>,
}

impl ObjectNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Object that carries simple content (XML element text)
    pub fn with_text(text: ScalarValue) -> Self {
        Self {
            text: Some(text),
            ..Self::default()
        }
    }

    pub fn get(&self, key: &NodeKey) -> Option<&Node> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, node)| node)
    }

    pub fn get_mut(&mut self, key: &NodeKey) -> Option<&mut Node> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, node)| node)
    }

    /// Insert or overwrite a child, keeping the original position on overwrite
    pub fn insert(&mut self, key: NodeKey, node: Node) {
        match self.get_mut(&key) {
            Some(existing) => *existing = node,
            None => self.entries.push((key, node)),
        }
    }

    /// Child for `key`, inserting `default` first if absent
    pub fn child_or_insert(&mut self, key: NodeKey, default: Node) -> &mut Node {
        let position = match self.entries.iter().position(|(k, _)| *k == key) {
            Some(position) => position,
            None => {
                self.entries.push((key, default));
                self.entries.len() - 1
            }
        };
        &mut self.entries[position].1
    }

    pub fn entries(&self) -> &[(NodeKey, Node)] {
        &self.entries
    }

    /// Element (non-attribute) children
    pub fn elements(&self) -> impl Iterator<Item = (&NodeKey, &Node)> {
        self.entries
            .iter()
            .filter(|(k, _)| !k.attribute)
            .map(|(k, n)| (k, n))
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&NodeKey, &Node)> {
        self.entries
            .iter()
            .filter(|(k, _)| k.attribute)
            .map(|(k, n)| (k, n))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.text.is_none()
    }

    pub fn text(&self) -> Option<&ScalarValue> {
        self.text.as_ref()
    }

    pub fn set_text(&mut self, text: Option<ScalarValue>) {
        self.text = text;
    }

    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    pub fn set_type_name(&mut self, type_name: impl Into<String>) {
        self.type_name = Some(type_name.into());
    }
}

/// A node of the document tree
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Node {
    Object(ObjectNode),
    Array(Vec<Node>),
    Value(ScalarValue),
    #[default]
    Null,
}

impl Node {
    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Node::Array(_))
    }

    pub fn as_object(&self) -> Option<&ObjectNode> {
        match self {
            Node::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Node]> {
        match self {
            Node::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Scalar content: a value node, or the text of an object node
    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            Node::Value(value) => Some(value),
            Node::Object(object) => object.text(),
            _ => None,
        }
    }

    /// Short name of the node kind, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Object(_) => "object",
            Node::Array(_) => "array",
            Node::Value(_) => "value",
            Node::Null => "null",
        }
    }

    /// Turn this node into an object in place and return it
    ///
    /// A scalar is kept as the object's text; an array is entered at its
    /// first element.
    pub fn ensure_object(&mut self) -> &mut ObjectNode {
        match self {
            Node::Object(object) => object,
            Node::Array(items) => {
                if items.is_empty() {
                    items.push(Node::Null);
                }
                items[0].ensure_object()
            }
            other => {
                let text = other.as_scalar().cloned();
                *other = Node::Object(ObjectNode {
                    text,
                    ..ObjectNode::default()
                });
                other.ensure_object()
            }
        }
    }

    /// Turn this node into an array in place and return its items
    ///
    /// A non-null node becomes the array's first element.
    pub fn ensure_array(&mut self) -> &mut Vec<Node> {
        match self {
            Node::Array(items) => items,
            other => {
                let existing = std::mem::take(other);
                *other = if existing.is_null() {
                    Node::Array(Vec::new())
                } else {
                    Node::Array(vec![existing])
                };
                other.ensure_array()
            }
        }
    }
}

/// Grow `items` with null placeholders until it has at least `len` elements
pub fn grow_array(items: &mut Vec<Node>, len: usize) {
    if items.len() < len {
        items.resize(len, Node::Null);
    }
}

/// A document: the root of a node tree plus its format
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    format: DocumentFormat,
    root: Node,
}

impl Document {
    /// Empty document whose object root is populated by writes
    pub fn new(format: DocumentFormat) -> Self {
        Self {
            format,
            root: Node::Object(ObjectNode::new()),
        }
    }

    pub fn from_node(format: DocumentFormat, root: Node) -> Self {
        Self { format, root }
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Node {
        &mut self.root
    }

    pub fn into_root(self) -> Node {
        self.root
    }

    /// Whether the document is an explicit null (e.g. JSON `null`)
    pub fn is_null(&self) -> bool {
        self.root.is_null()
    }

    /// Whether the document holds anything at all
    pub fn has_content(&self) -> bool {
        match &self.root {
            Node::Object(object) => !object.is_empty(),
            Node::Null => false,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_insert_keeps_order() {
        let mut object = ObjectNode::new();
        object.insert(NodeKey::element("b"), Node::Value("1".into()));
        object.insert(NodeKey::element("a"), Node::Value("2".into()));
        object.insert(NodeKey::element("b"), Node::Value("3".into()));

        let names: Vec<_> = object.entries().iter().map(|(k, _)| k.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(
            object.get(&NodeKey::element("b")),
            Some(&Node::Value("3".into()))
        );
    }

    #[test]
    fn test_attribute_and_element_keys_are_distinct() {
        let mut object = ObjectNode::new();
        object.insert(NodeKey::element("id"), Node::Value("e".into()));
        object.insert(NodeKey::attribute("id"), Node::Value("a".into()));
        assert_eq!(object.len(), 2);
        assert_eq!(object.attributes().count(), 1);
        assert_eq!(object.elements().count(), 1);
    }

    #[test]
    fn test_ensure_object_promotes_scalar_to_text() {
        let mut node = Node::Value("5".into());
        node.ensure_object()
            .insert(NodeKey::attribute("unit"), Node::Value("kg".into()));
        let object = node.as_object().unwrap();
        assert_eq!(object.text(), Some(&ScalarValue::from("5")));
        assert_eq!(node.as_scalar(), Some(&ScalarValue::from("5")));
    }

    #[test]
    fn test_ensure_array_wraps_existing_node() {
        let mut node = Node::Value("only".into());
        let items = node.ensure_array();
        assert_eq!(items.len(), 1);
        grow_array(items, 3);
        assert_eq!(node.as_array().map(|a| a.len()), Some(3));

        let mut empty = Node::Null;
        assert!(empty.ensure_array().is_empty());
    }

    #[test]
    fn test_document_content() {
        assert!(!Document::new(DocumentFormat::Json).has_content());
        assert!(Document::from_node(DocumentFormat::Json, Node::Array(vec![])).has_content());
        assert!(Document::from_node(DocumentFormat::Json, Node::Null).is_null());
    }
}
