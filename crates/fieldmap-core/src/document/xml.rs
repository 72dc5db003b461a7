//! XML document adapter
//!
//! Elements map onto the shared tree as follows:
//!
//! - an element with neither attributes nor child elements is a `Value`
//!   holding its text, or `Null` when it is empty
//! - any other element is an object with one attribute key per attribute,
//!   its child elements, and its text
//! - repeated sibling elements with the same name fold into one array
//!
//! Namespace prefixes are rewritten to the configured prefix bound to the
//! same URI, so paths can be written against the configured prefixes no
//! matter what the document itself declares. Declarations for URIs that are
//! not configured are kept as plain attributes.
//!
//! Copyright (c) 2025 Fieldmap Team
//! Licensed under the Apache-2.0 license

use super::{Document, DocumentAdapter, DocumentFormat, Node, NodeKey, ObjectNode};
use crate::config::MapperConfig;
use crate::types::ScalarValue;
use crate::{Error, Result};
use log::debug;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;

/// XML text adapter
#[derive(Debug, Clone, Default)]
pub struct XmlAdapter {
    /// prefix -> namespace URI
    namespaces: BTreeMap<String, String>,
    declaration: bool,
    pretty: bool,
}

/// An element whose end tag has not been read yet
struct OpenElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<(String, Node)>,
    text: String,
}

fn parse_error(err: impl Display) -> Error {
    Error::Parse {
        format: DocumentFormat::Xml,
        message: err.to_string(),
    }
}

fn render_error(err: impl Display) -> Error {
    Error::Render {
        format: DocumentFormat::Xml,
        message: err.to_string(),
    }
}

impl XmlAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &MapperConfig) -> Self {
        Self {
            namespaces: config.namespaces.clone(),
            declaration: config.xml.declaration,
            pretty: config.xml.pretty,
        }
    }

    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.insert(prefix.into(), uri.into());
        self
    }

    pub fn with_declaration(mut self, declaration: bool) -> Self {
        self.declaration = declaration;
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Configured prefix bound to `uri`
    fn configured_prefix(&self, uri: &str) -> Option<&str> {
        self.namespaces
            .iter()
            .find(|(_, bound)| bound.as_str() == uri)
            .map(|(prefix, _)| prefix.as_str())
    }

    /// Rewrite a document name onto the configured prefixes
    ///
    /// Unprefixed attributes never take the default namespace.
    fn resolve_name(&self, raw: &str, scopes: &[HashMap<String, String>], element: bool) -> String {
        let (prefix, local) = match raw.split_once(':') {
            Some((prefix, local)) => (prefix, local),
            None if element => ("", raw),
            None => return raw.to_string(),
        };
        let uri = scopes.iter().rev().find_map(|scope| scope.get(prefix));
        match uri.and_then(|uri| self.configured_prefix(uri)) {
            Some("") => local.to_string(),
            Some(configured) => format!("{}:{}", configured, local),
            None => raw.to_string(),
        }
    }

    fn open_element(
        &self,
        start: &BytesStart<'_>,
        scopes: &mut Vec<HashMap<String, String>>,
    ) -> Result<OpenElement> {
        let raw_name = std::str::from_utf8(start.name().as_ref())
            .map_err(parse_error)?
            .to_string();

        let mut scope = HashMap::new();
        let mut raw_attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(parse_error)?;
            let key = std::str::from_utf8(attribute.key.as_ref())
                .map_err(parse_error)?
                .to_string();
            let value = attribute.unescape_value().map_err(parse_error)?.into_owned();

            let declared = if key == "xmlns" {
                Some(String::new())
            } else {
                key.strip_prefix("xmlns:").map(str::to_string)
            };
            match declared {
                Some(prefix) => {
                    if self.configured_prefix(&value).is_none() {
                        raw_attributes.push((key, value.clone()));
                    }
                    scope.insert(prefix, value);
                }
                None => raw_attributes.push((key, value)),
            }
        }
        scopes.push(scope);

        let attributes = raw_attributes
            .into_iter()
            .map(|(key, value)| {
                if key == "xmlns" || key.starts_with("xmlns:") {
                    (key, value)
                } else {
                    (self.resolve_name(&key, scopes, false), value)
                }
            })
            .collect();

        Ok(OpenElement {
            name: self.resolve_name(&raw_name, scopes, true),
            attributes,
            children: Vec::new(),
            text: String::new(),
        })
    }

    fn write_element(
        &self,
        writer: &mut Writer<Vec<u8>>,
        name: &str,
        node: &Node,
        root: bool,
    ) -> Result<()> {
        match node {
            Node::Array(items) => {
                for item in items {
                    self.write_element(writer, name, item, root)?;
                }
            }
            Node::Null => {
                let start = self.start_tag(name, None, root);
                emit(writer, Event::Empty(start))?;
            }
            Node::Value(value) => {
                let start = self.start_tag(name, None, root);
                emit(writer, Event::Start(start))?;
                emit(writer, Event::Text(BytesText::new(&value.to_string())))?;
                emit(writer, Event::End(BytesEnd::new(name)))?;
            }
            Node::Object(object) => {
                let start = self.start_tag(name, Some(object), root);
                let has_content = object.text().is_some() || object.elements().next().is_some();
                if !has_content {
                    return emit(writer, Event::Empty(start));
                }
                emit(writer, Event::Start(start))?;
                if let Some(text) = object.text() {
                    emit(writer, Event::Text(BytesText::new(&text.to_string())))?;
                }
                for (key, child) in object.elements() {
                    self.write_element(writer, &key.name, child, false)?;
                }
                emit(writer, Event::End(BytesEnd::new(name)))?;
            }
        }
        Ok(())
    }

    fn start_tag<'a>(&self, name: &'a str, object: Option<&ObjectNode>, root: bool) -> BytesStart<'a> {
        let mut start = BytesStart::new(name);
        if root {
            for (prefix, uri) in &self.namespaces {
                let key = if prefix.is_empty() {
                    "xmlns".to_string()
                } else {
                    format!("xmlns:{}", prefix)
                };
                start.push_attribute((key.as_str(), uri.as_str()));
            }
        }
        for (key, value) in object.into_iter().flat_map(ObjectNode::attributes) {
            let value = match value {
                Node::Value(scalar) => scalar.to_string(),
                Node::Null => String::new(),
                // structured attribute values have no XML form
                _ => continue,
            };
            start.push_attribute((key.name.as_str(), value.as_str()));
        }
        start
    }
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer.write_event(event).map_err(render_error)
}

/// Turn a closed element into a node
fn close_element(element: OpenElement) -> Node {
    if element.attributes.is_empty() && element.children.is_empty() {
        return if element.text.is_empty() {
            Node::Null
        } else {
            Node::Value(ScalarValue::String(element.text))
        };
    }

    let mut object = ObjectNode::new();
    for (name, value) in element.attributes {
        object.insert(NodeKey::attribute(name), Node::Value(ScalarValue::String(value)));
    }
    for (name, child) in element.children {
        append_child(&mut object, name, child);
    }
    if !element.text.is_empty() {
        object.set_text(Some(ScalarValue::String(element.text)));
    }
    Node::Object(object)
}

/// Add a child element, folding repeats of the same name into an array
fn append_child(object: &mut ObjectNode, name: String, child: Node) {
    let key = NodeKey::element(name);
    match object.get_mut(&key) {
        Some(Node::Array(items)) => items.push(child),
        Some(existing) => {
            let first = std::mem::take(existing);
            *existing = Node::Array(vec![first, child]);
        }
        None => object.insert(key, child),
    }
}

impl DocumentAdapter for XmlAdapter {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Xml
    }

    fn parse(&self, input: &str) -> Result<Document> {
        if input.trim().is_empty() {
            return Err(Error::EmptyDocument {
                format: DocumentFormat::Xml,
            });
        }

        let mut reader = Reader::from_str(input);
        reader.config_mut().trim_text(true);

        let mut scopes: Vec<HashMap<String, String>> = Vec::new();
        let mut open: Vec<OpenElement> = Vec::new();
        let mut roots: Vec<(String, Node)> = Vec::new();

        loop {
            let event = reader.read_event().map_err(|e| {
                parse_error(format!("{} at position {}", e, reader.buffer_position()))
            })?;
            let closed = match event {
                Event::Start(start) => {
                    let element = self.open_element(&start, &mut scopes)?;
                    open.push(element);
                    None
                }
                Event::Empty(start) => {
                    let element = self.open_element(&start, &mut scopes)?;
                    scopes.pop();
                    Some(element)
                }
                Event::End(_) => {
                    scopes.pop();
                    open.pop()
                }
                Event::Text(text) => {
                    if let Some(current) = open.last_mut() {
                        current.text.push_str(&text.unescape().map_err(parse_error)?);
                    }
                    None
                }
                Event::CData(data) => {
                    if let Some(current) = open.last_mut() {
                        current
                            .text
                            .push_str(std::str::from_utf8(&data).map_err(parse_error)?);
                    }
                    None
                }
                Event::Eof => break,
                _ => None,
            };

            if let Some(element) = closed {
                let name = element.name.clone();
                let node = close_element(element);
                match open.last_mut() {
                    Some(parent) => parent.children.push((name, node)),
                    None => roots.push((name, node)),
                }
            }
        }

        if let Some(unclosed) = open.last() {
            return Err(parse_error(format!("unclosed element '{}'", unclosed.name)));
        }
        match roots.len() {
            0 => Err(Error::EmptyDocument {
                format: DocumentFormat::Xml,
            }),
            1 => {
                debug!("Parsed XML document with root '{}'", roots[0].0);
                let mut root = ObjectNode::new();
                for (name, node) in roots {
                    root.insert(NodeKey::element(name), node);
                }
                Ok(Document::from_node(DocumentFormat::Xml, Node::Object(root)))
            }
            n => Err(parse_error(format!("found {} root elements", n))),
        }
    }

    fn render(&self, document: &Document) -> Result<String> {
        let Node::Object(root) = document.root() else {
            return Err(render_error(format!(
                "document root must be an element container, found {}",
                document.root().kind()
            )));
        };
        let elements: Vec<_> = root.elements().collect();
        let [(name, node)] = elements.as_slice() else {
            return Err(render_error(format!(
                "expected exactly one root element, found {}",
                elements.len()
            )));
        };
        if let Node::Array(items) = node {
            if items.len() != 1 {
                return Err(render_error(format!(
                    "root element '{}' repeats {} times",
                    name.name,
                    items.len()
                )));
            }
        }

        let mut writer = if self.pretty {
            Writer::new_with_indent(Vec::new(), b' ', 2)
        } else {
            Writer::new(Vec::new())
        };
        if self.declaration {
            emit(
                &mut writer,
                Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
            )?;
        }
        self.write_element(&mut writer, &name.name, node, true)?;

        String::from_utf8(writer.into_inner()).map_err(render_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::FieldPath;
    use pretty_assertions::assert_eq;

    fn text_at(document: &Document, path: &str) -> Option<String> {
        document
            .navigate(&FieldPath::parse(path))
            .and_then(Node::as_scalar)
            .map(|v| v.to_string())
    }

    #[test]
    fn test_parse_elements_and_attributes() {
        let xml = r#"<order id="7"><contact><name>Ann</name></contact><note/></order>"#;
        let document = XmlAdapter::new().parse(xml).unwrap();
        assert_eq!(text_at(&document, "/order/@id").as_deref(), Some("7"));
        assert_eq!(text_at(&document, "/order/contact/name").as_deref(), Some("Ann"));
        assert_eq!(
            document.navigate(&FieldPath::parse("/order/note")),
            Some(&Node::Null)
        );
    }

    #[test]
    fn test_repeated_siblings_fold_into_array() {
        let xml = "<items><item>a</item><item>b</item><item>c</item></items>";
        let document = XmlAdapter::new().parse(xml).unwrap();
        assert_eq!(text_at(&document, "/items/item<2>").as_deref(), Some("c"));
        assert_eq!(
            document.collection_count(&FieldPath::parse("/items/item<>"), "item"),
            Some(3)
        );
    }

    #[test]
    fn test_text_with_attributes() {
        let xml = r#"<weight unit="kg">5</weight>"#;
        let document = XmlAdapter::new().parse(xml).unwrap();
        assert_eq!(text_at(&document, "/weight").as_deref(), Some("5"));
        assert_eq!(text_at(&document, "/weight/@unit").as_deref(), Some("kg"));
    }

    #[test]
    fn test_empty_and_malformed_input() {
        let adapter = XmlAdapter::new();
        assert!(matches!(adapter.parse(""), Err(Error::EmptyDocument { .. })));
        assert!(matches!(
            adapter.parse("<?xml version=\"1.0\"?>"),
            Err(Error::EmptyDocument { .. })
        ));
        assert!(matches!(adapter.parse("<a><b></a>"), Err(Error::Parse { .. })));
        assert!(matches!(adapter.parse("<a>"), Err(Error::Parse { .. })));
        assert!(matches!(adapter.parse("<a/><b/>"), Err(Error::Parse { .. })));

        let err = adapter.parse("<a><b></a>").unwrap_err();
        assert!(matches!(
            err,
            Error::Parse {
                format: DocumentFormat::Xml,
                ..
            }
        ));
        assert!(err.is_document_error());
    }

    #[test]
    fn test_namespace_prefix_rewrite() {
        let xml = r#"<a:order xmlns:a="urn:orders"><a:id>1</a:id></a:order>"#;
        let adapter = XmlAdapter::new().with_namespace("ns1", "urn:orders");
        let document = adapter.parse(xml).unwrap();
        assert_eq!(text_at(&document, "/ns1:order/ns1:id").as_deref(), Some("1"));
        assert_eq!(
            adapter.render(&document).unwrap(),
            r#"<ns1:order xmlns:ns1="urn:orders"><ns1:id>1</ns1:id></ns1:order>"#
        );
    }

    #[test]
    fn test_default_namespace_rewrite() {
        let xml = r#"<order xmlns="urn:orders"><id>1</id></order>"#;
        let adapter = XmlAdapter::new().with_namespace("o", "urn:orders");
        let document = adapter.parse(xml).unwrap();
        assert_eq!(text_at(&document, "/o:order/o:id").as_deref(), Some("1"));
    }

    #[test]
    fn test_unconfigured_declaration_is_kept() {
        let xml = r#"<x:root xmlns:x="urn:other"><x:v>1</x:v></x:root>"#;
        let adapter = XmlAdapter::new();
        let document = adapter.parse(xml).unwrap();
        assert_eq!(text_at(&document, "/x:root/x:v").as_deref(), Some("1"));
        assert_eq!(adapter.render(&document).unwrap(), xml);
    }

    #[test]
    fn test_render_round_trip() {
        let xml = r#"<items><item id="1">a</item><item id="2"/><total>2</total></items>"#;
        let adapter = XmlAdapter::new();
        let document = adapter.parse(xml).unwrap();
        assert_eq!(adapter.render(&document).unwrap(), xml);
    }

    #[test]
    fn test_render_escapes_text() {
        let document = XmlAdapter::new().parse("<a>x &amp; y</a>").unwrap();
        assert_eq!(text_at(&document, "/a").as_deref(), Some("x & y"));
        assert_eq!(XmlAdapter::new().render(&document).unwrap(), "<a>x &amp; y</a>");
    }

    #[test]
    fn test_render_declaration() {
        let document = XmlAdapter::new().parse("<a>1</a>").unwrap();
        let rendered = XmlAdapter::new()
            .with_declaration(true)
            .render(&document)
            .unwrap();
        assert!(rendered.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(rendered.ends_with("<a>1</a>"));
    }

    #[test]
    fn test_render_requires_single_root() {
        let mut root = ObjectNode::new();
        root.insert(NodeKey::element("a"), Node::Value("1".into()));
        root.insert(NodeKey::element("b"), Node::Value("2".into()));
        let document = Document::from_node(DocumentFormat::Xml, Node::Object(root));
        assert!(matches!(
            XmlAdapter::new().render(&document),
            Err(Error::Render { .. })
        ));
    }
}
