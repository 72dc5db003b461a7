//! Path-addressed field reader
//!
//! Resolves a requested field path against a document and returns either a
//! single value or, when the path fans out over a collection, a group of
//! values each carrying its concrete path.
//!
//! Copyright (c) 2025 Fieldmap Team
//! Licensed under the Apache-2.0 license

use crate::audit::{Audit, AuditSink};
use crate::convert::{Converter, DefaultConverter};
use crate::document::{Document, Node};
use crate::path::{FieldPath, PathSegment};
use crate::types::{Field, FieldGroup, FieldStatus, FieldType, FieldValue};
use crate::{Error, Result};
use log::{debug, trace};

/// Reads fields out of documents
///
/// The reader holds no per-document state and can be shared.
#[derive(Debug, Clone, Default)]
pub struct FieldReader<C = DefaultConverter> {
    converter: C,
}

impl<C: Converter> FieldReader<C> {
    pub fn new(converter: C) -> Self {
        Self { converter }
    }

    pub fn converter(&self) -> &C {
        &self.converter
    }

    /// Read the field described by `request`
    ///
    /// A path containing an unindexed collection segment (`[]`, `<>`) always
    /// yields a [`FieldGroup`], empty when nothing resolves. Otherwise a
    /// missing node yields a null value with status `NotFound`.
    pub fn read(
        &self,
        document: &Document,
        request: &FieldValue,
        audits: &mut dyn AuditSink,
    ) -> Result<Field> {
        if !document.has_content() {
            return Err(Error::EmptyDocument {
                format: document.format(),
            });
        }
        let path = FieldPath::parse(&request.path);
        if path.is_empty() {
            return Err(Error::invalid_path(&request.path, "path has no segments"));
        }

        if !path.unindexed_positions().is_empty() {
            let members = document.expand(&path);
            debug!("Path {} expanded to {} member(s)", path, members.len());
            let mut group = FieldGroup::new(path.to_string());
            for (concrete, node) in members {
                group.fields.push(self.read_node(&concrete, node, request, audits));
            }
            return Ok(Field::Group(group));
        }

        match document.navigate(&path) {
            Some(node) => Ok(self.read_node(&path, node, request, audits)),
            None => {
                trace!("No node at {}", path);
                Ok(Field::Single(FieldValue {
                    path: path.to_string(),
                    field_type: request.field_type,
                    value: None,
                    status: FieldStatus::NotFound,
                    doc_id: request.doc_id.clone(),
                }))
            }
        }
    }

    /// Member count of the first collection named `segment_name` on `path`
    pub fn collection_count(
        &self,
        document: &Document,
        path: &FieldPath,
        segment_name: &str,
    ) -> Option<usize> {
        document.collection_count(path, segment_name)
    }

    fn read_node(
        &self,
        path: &FieldPath,
        node: &Node,
        request: &FieldValue,
        audits: &mut dyn AuditSink,
    ) -> Field {
        match node {
            Node::Object(object)
                if object.text().is_some() && request.field_type != FieldType::Complex =>
            {
                self.read_scalar(path, node, request, audits)
            }
            Node::Object(object) => {
                let mut group = FieldGroup::new(path.to_string());
                for (key, child) in object.entries() {
                    let child_path = path.clone().child(PathSegment::parse(&key.to_string()));
                    group
                        .fields
                        .push(self.read_node(&child_path, child, &complex_member(request), audits));
                }
                Field::Group(group)
            }
            Node::Array(items) => {
                let mut group = FieldGroup::new(path.to_string());
                let parent = path.parent_path();
                for (index, item) in items.iter().enumerate() {
                    let member_path = match path.last_segment() {
                        Some(last) => parent.clone().child(last.with_index(index)),
                        None => parent.clone(),
                    };
                    group.fields.push(self.read_node(&member_path, item, request, audits));
                }
                Field::Group(group)
            }
            Node::Value(_) | Node::Null => self.read_scalar(path, node, request, audits),
        }
    }

    fn read_scalar(
        &self,
        path: &FieldPath,
        node: &Node,
        request: &FieldValue,
        audits: &mut dyn AuditSink,
    ) -> Field {
        let path_text = path.to_string();
        let Some(raw) = node.as_scalar() else {
            return FieldValue {
                path: path_text,
                field_type: request.field_type,
                value: None,
                status: FieldStatus::Supported,
                doc_id: request.doc_id.clone(),
            }
            .into();
        };

        let target = match request.field_type {
            FieldType::Any | FieldType::Complex => raw.field_type(),
            requested => requested,
        };
        match self.converter.convert(raw, raw.field_type(), target) {
            Ok(value) => FieldValue {
                path: path_text,
                field_type: target,
                value: Some(value),
                status: FieldStatus::Supported,
                doc_id: request.doc_id.clone(),
            }
            .into(),
            Err(err) => {
                debug!("Conversion failed at {}: {}", path_text, err);
                audits.add_audit(
                    Audit::conversion_failure(&path_text, &raw.to_string(), target)
                        .with_doc_id(request.doc_id.clone()),
                );
                FieldValue {
                    path: path_text,
                    field_type: target,
                    value: None,
                    status: FieldStatus::Error,
                    doc_id: request.doc_id.clone(),
                }
                .into()
            }
        }
    }
}

/// Request used for the children of an object terminal: types are kept as found
fn complex_member(request: &FieldValue) -> FieldValue {
    FieldValue {
        field_type: FieldType::Any,
        ..request.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditLog, AuditStatus};
    use crate::document::{DocumentAdapter, JsonAdapter};
    use crate::types::ScalarValue;

    fn reader() -> FieldReader {
        FieldReader::new(DefaultConverter::new())
    }

    fn doc(json: &str) -> Document {
        JsonAdapter::new().parse(json).unwrap()
    }

    #[test]
    fn test_read_single_value() {
        let document = doc(r#"{"order":{"id":"o-1","qty":"12"}}"#);
        let mut audits = AuditLog::new();

        let field = reader()
            .read(&document, &FieldValue::new("/order/id"), &mut audits)
            .unwrap();
        let value = field.as_single().unwrap();
        assert_eq!(value.value, Some(ScalarValue::from("o-1")));
        assert_eq!(value.field_type, FieldType::String);

        let request = FieldValue::new("/order/qty").with_type(FieldType::Integer);
        let field = reader().read(&document, &request, &mut audits).unwrap();
        assert_eq!(field.as_single().unwrap().value, Some(ScalarValue::Integer(12)));
        assert!(audits.is_empty());
    }

    #[test]
    fn test_conversion_failure_is_soft() {
        let document = doc(r#"{"qty":"12x"}"#);
        let mut audits = AuditLog::new();
        let request = FieldValue::new("/qty")
            .with_type(FieldType::Integer)
            .with_doc_id("doc-1");

        let field = reader().read(&document, &request, &mut audits).unwrap();
        let value = field.as_single().unwrap();
        assert_eq!(value.value, None);
        assert_eq!(value.status, FieldStatus::Error);

        assert_eq!(audits.len(), 1);
        let audit = &audits.audits()[0];
        assert_eq!(audit.status, AuditStatus::Error);
        assert_eq!(audit.doc_id.as_deref(), Some("doc-1"));
        assert_eq!(audit.message, "Failed to convert field value '12x' into type 'INTEGER'");
    }

    #[test]
    fn test_missing_node_is_not_found() {
        let document = doc(r#"{"a":{"b":1}}"#);
        let mut audits = AuditLog::new();
        let field = reader()
            .read(&document, &FieldValue::new("/a/c"), &mut audits)
            .unwrap();
        let value = field.as_single().unwrap();
        assert_eq!(value.status, FieldStatus::NotFound);
        assert!(value.is_null());
        assert!(audits.is_empty());
    }

    #[test]
    fn test_fatal_inputs() {
        let mut audits = AuditLog::new();
        let empty = doc("{}");
        assert!(matches!(
            reader().read(&empty, &FieldValue::new("/a"), &mut audits),
            Err(Error::EmptyDocument { .. })
        ));
        let document = doc(r#"{"a":1}"#);
        assert!(matches!(
            reader().read(&document, &FieldValue::new("/"), &mut audits),
            Err(Error::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_unindexed_read_returns_group() {
        let document = doc(r#"{"orders":[{"id":"a"},{"id":"b"}],"none":[]}"#);
        let mut audits = AuditLog::new();

        let field = reader()
            .read(&document, &FieldValue::new("/orders[]/id"), &mut audits)
            .unwrap();
        let group = field.as_group().unwrap();
        let paths: Vec<_> = group.fields.iter().map(|f| f.path().to_string()).collect();
        assert_eq!(paths, vec!["/orders[0]/id", "/orders[1]/id"]);

        let field = reader()
            .read(&document, &FieldValue::new("/none[]/id"), &mut audits)
            .unwrap();
        assert!(field.as_group().unwrap().is_empty());
    }

    #[test]
    fn test_object_terminal_returns_children() {
        let document = doc(r#"{"contact":{"first":"Ann","last":"Lee"}}"#);
        let mut audits = AuditLog::new();
        let field = reader()
            .read(&document, &FieldValue::new("/contact"), &mut audits)
            .unwrap();
        let group = field.as_group().unwrap();
        assert_eq!(group.len(), 2);
        assert_eq!(group.fields[1].path(), "/contact/last");
    }

    #[test]
    fn test_null_value_is_supported_null() {
        let document = doc(r#"{"a":null}"#);
        let mut audits = AuditLog::new();
        let field = reader()
            .read(&document, &FieldValue::new("/a"), &mut audits)
            .unwrap();
        let value = field.as_single().unwrap();
        assert!(value.is_null());
        assert_eq!(value.status, FieldStatus::Supported);
    }
}
