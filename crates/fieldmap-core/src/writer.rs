//! Path-addressed field writer
//!
//! Builds a target document incrementally from field paths. Nodes are
//! created on demand; collection segments written without an index (`[]`,
//! `<>`) append a new element the first time a given parent reaches them and
//! reuse that element afterwards, so sibling fields of one record land in the
//! same element.
//!
//! Copyright (c) 2025 Fieldmap Team
//! Licensed under the Apache-2.0 license

use crate::audit::{Audit, AuditSink};
use crate::convert::{Converter, DefaultConverter};
use crate::document::tree::{AppendCache, DEFAULT_MAX_INDEX};
use crate::document::{Document, DocumentFormat, Node};
use crate::path::FieldPath;
use crate::types::{Field, FieldType, FieldValue};
use crate::{Error, Result};
use log::{debug, trace};

/// Writes fields into one target document
#[derive(Debug)]
pub struct FieldWriter<C = DefaultConverter> {
    converter: C,
    document: Document,
    appended: AppendCache,
    max_index: usize,
}

impl<C: Converter> FieldWriter<C> {
    /// Writer over a fresh, empty document
    pub fn new(converter: C) -> Self {
        Self::with_document(Document::new(DocumentFormat::Json), converter)
    }

    /// Writer that adds to an existing document
    pub fn with_document(document: Document, converter: C) -> Self {
        Self {
            converter,
            document,
            appended: AppendCache::new(),
            max_index: DEFAULT_MAX_INDEX,
        }
    }

    /// Reject writes addressing a collection index above `max_index`
    pub fn with_max_index(mut self, max_index: usize) -> Self {
        self.max_index = max_index;
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    /// Start a new session on the same document
    ///
    /// Unindexed segments append fresh elements again after a reset.
    pub fn reset(&mut self) {
        self.appended.clear();
    }

    pub fn collection_count(&self, path: &FieldPath, segment_name: &str) -> Option<usize> {
        self.document.collection_count(path, segment_name)
    }

    /// Write a field; groups write each member in order
    pub fn write(&mut self, field: &Field, audits: &mut dyn AuditSink) -> Result<()> {
        match field {
            Field::Single(value) => self.write_value(value, audits),
            Field::Group(group) => {
                for member in &group.fields {
                    self.write(member, audits)?;
                }
                Ok(())
            }
        }
    }

    fn write_value(&mut self, value: &FieldValue, audits: &mut dyn AuditSink) -> Result<()> {
        let path = FieldPath::parse(&value.path);
        if path.is_empty() {
            return Err(Error::invalid_path(&value.path, "path has no segments"));
        }
        let leaf = self.leaf_node(value, audits);
        let written = self
            .document
            .ensure_path(&path, leaf, &mut self.appended, self.max_index)?;
        trace!("Wrote {} at {}", value.path, written);
        Ok(())
    }

    /// Convert the value to its declared type, degrading to null on failure
    fn leaf_node(&self, value: &FieldValue, audits: &mut dyn AuditSink) -> Node {
        let Some(raw) = &value.value else {
            return Node::Null;
        };
        let target = match value.field_type {
            FieldType::Complex => FieldType::Any,
            declared => declared,
        };
        match self.converter.convert(raw, raw.field_type(), target) {
            Ok(converted) => Node::Value(converted),
            Err(err) => {
                debug!("Conversion failed at {}: {}", value.path, err);
                audits.add_audit(
                    Audit::conversion_failure(&value.path, &raw.to_string(), target)
                        .with_doc_id(value.doc_id.clone()),
                );
                Node::Null
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditLog, AuditStatus};
    use crate::document::JsonAdapter;
    use crate::types::ScalarValue;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn writer() -> FieldWriter {
        FieldWriter::new(DefaultConverter::new())
    }

    fn write(writer: &mut FieldWriter, path: &str, value: &str) {
        let field = FieldValue::new(path).with_value(value);
        writer.write(&field.into(), &mut AuditLog::new()).unwrap();
    }

    fn json_of(writer: &FieldWriter) -> serde_json::Value {
        JsonAdapter::to_value(writer.document())
    }

    #[test]
    fn test_ancestors_are_reused() {
        let mut w = writer();
        write(&mut w, "/car/brand", "Ford");
        write(&mut w, "/car/doors", "4");
        assert_eq!(json_of(&w), json!({"car": {"brand": "Ford", "doors": "4"}}));
    }

    #[test]
    fn test_indexed_writes() {
        let mut w = writer();
        write(&mut w, "/orders[0]/orderid", "orderid1");
        write(&mut w, "/orders[1]/orderid", "orderid2");
        assert_eq!(
            json_of(&w),
            json!({"orders": [{"orderid": "orderid1"}, {"orderid": "orderid2"}]})
        );
    }

    #[test]
    fn test_sparse_index_fills_with_null() {
        let mut w = writer();
        write(&mut w, "/items[2]/id", "c");
        assert_eq!(json_of(&w), json!({"items": [null, null, {"id": "c"}]}));
    }

    #[test]
    fn test_unindexed_parent_is_appended_once_per_session() {
        let mut w = writer();
        write(&mut w, "/orders[]/id", "a");
        write(&mut w, "/orders[]/name", "first");
        assert_eq!(json_of(&w), json!({"orders": [{"id": "a", "name": "first"}]}));

        w.reset();
        write(&mut w, "/orders[]/id", "b");
        assert_eq!(
            json_of(&w),
            json!({"orders": [{"id": "a", "name": "first"}, {"id": "b"}]})
        );
    }

    #[test]
    fn test_unindexed_terminal_always_appends() {
        let mut w = writer();
        write(&mut w, "/tags[]", "x");
        write(&mut w, "/tags[]", "y");
        assert_eq!(json_of(&w), json!({"tags": ["x", "y"]}));
    }

    #[test]
    fn test_attribute_and_text() {
        let mut w = writer();
        write(&mut w, "/weight", "5");
        write(&mut w, "/weight/@unit", "kg");
        assert_eq!(json_of(&w), json!({"weight": {"#text": "5", "@unit": "kg"}}));

        write(&mut w, "/weight", "6");
        assert_eq!(json_of(&w), json!({"weight": {"#text": "6", "@unit": "kg"}}));
    }

    #[test]
    fn test_typed_write_and_conversion_failure() {
        let mut w = writer();
        let mut audits = AuditLog::new();
        let ok = FieldValue::new("/qty").with_type(FieldType::Integer).with_value("12");
        let bad = FieldValue::new("/price")
            .with_type(FieldType::Double)
            .with_value("abc");
        w.write(&ok.into(), &mut audits).unwrap();
        w.write(&bad.into(), &mut audits).unwrap();

        assert_eq!(json_of(&w), json!({"qty": 12, "price": null}));
        assert_eq!(audits.len(), 1);
        assert_eq!(audits.audits()[0].status, AuditStatus::Error);
        assert_eq!(audits.audits()[0].path, "/price");
    }

    #[test]
    fn test_empty_path_is_fatal() {
        let mut w = writer();
        let field = FieldValue::new("").with_value("x");
        assert!(matches!(
            w.write(&field.into(), &mut AuditLog::new()),
            Err(Error::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_oversized_index_is_rejected() {
        let mut w = writer().with_max_index(100);
        let mut audits = AuditLog::new();
        for path in ["/a[18446744073709551615]/b", "/a[101]/b"] {
            let field = FieldValue::new(path).with_value("x");
            assert!(matches!(
                w.write(&field.into(), &mut audits),
                Err(Error::InvalidPath { .. })
            ));
        }
        assert!(!w.document().has_content());
    }

    #[test]
    fn test_top_level_array() {
        let mut w = writer();
        *w.document.root_mut() = Node::Null;
        write(&mut w, "/[1]/name", "second");
        assert_eq!(json_of(&w), json!([null, {"name": "second"}]));
    }

    #[test]
    fn test_group_writes_members() {
        let mut group = crate::types::FieldGroup::new("/a[]");
        group.fields.push(FieldValue::new("/a[0]").with_value(1_i64).into());
        group.fields.push(FieldValue::new("/a[1]").with_value(2_i64).into());
        let mut w = writer();
        w.write(&group.into(), &mut AuditLog::new()).unwrap();
        assert_eq!(json_of(&w), json!({"a": [1, 2]}));
        assert_eq!(
            w.collection_count(&FieldPath::parse("/a[]"), "a"),
            Some(2)
        );
        let first = w.document().navigate(&FieldPath::parse("/a[0]"));
        assert_eq!(first.and_then(Node::as_scalar), Some(&ScalarValue::Long(1)));
    }
}
