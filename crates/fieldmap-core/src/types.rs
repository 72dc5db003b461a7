//! Core types and data structures for the fieldmap engine
//!
//! This module defines the field model exchanged between the mapping engine
//! and the reader/writer: typed scalars, field values and field groups.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    /// No declared type; values keep their native representation
    #[default]
    Any,
    String,
    Boolean,
    Byte,
    Char,
    Short,
    Integer,
    Long,
    Float,
    Double,
    /// Any numeric type, resolved to `Long` or `Double`
    Number,
    DateTime,
    /// Object-valued field with sub-fields
    Complex,
}

impl FieldType {
    /// Whether this type is one of the numeric types
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FieldType::Byte
                | FieldType::Short
                | FieldType::Integer
                | FieldType::Long
                | FieldType::Float
                | FieldType::Double
                | FieldType::Number
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Any => "ANY",
            FieldType::String => "STRING",
            FieldType::Boolean => "BOOLEAN",
            FieldType::Byte => "BYTE",
            FieldType::Char => "CHAR",
            FieldType::Short => "SHORT",
            FieldType::Integer => "INTEGER",
            FieldType::Long => "LONG",
            FieldType::Float => "FLOAT",
            FieldType::Double => "DOUBLE",
            FieldType::Number => "NUMBER",
            FieldType::DateTime => "DATE_TIME",
            FieldType::Complex => "COMPLEX",
        };
        write!(f, "{}", name)
    }
}

/// Processing status attached to a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldStatus {
    #[default]
    Supported,
    Unsupported,
    Cached,
    Error,
    NotFound,
    BlackList,
}

/// A typed scalar value held by a leaf node or a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScalarValue {
    String(String),
    Boolean(bool),
    Byte(i8),
    Char(char),
    Short(i16),
    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    DateTime(DateTime<FixedOffset>),
}

impl ScalarValue {
    /// The field type this scalar natively represents
    pub fn field_type(&self) -> FieldType {
        match self {
            ScalarValue::String(_) => FieldType::String,
            ScalarValue::Boolean(_) => FieldType::Boolean,
            ScalarValue::Byte(_) => FieldType::Byte,
            ScalarValue::Char(_) => FieldType::Char,
            ScalarValue::Short(_) => FieldType::Short,
            ScalarValue::Integer(_) => FieldType::Integer,
            ScalarValue::Long(_) => FieldType::Long,
            ScalarValue::Float(_) => FieldType::Float,
            ScalarValue::Double(_) => FieldType::Double,
            ScalarValue::DateTime(_) => FieldType::DateTime,
        }
    }

    /// Borrow the string content, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Widen any integral scalar to i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ScalarValue::Byte(v) => Some(*v as i64),
            ScalarValue::Short(v) => Some(*v as i64),
            ScalarValue::Integer(v) => Some(*v as i64),
            ScalarValue::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Widen any numeric scalar to f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Float(v) => Some(*v as f64),
            ScalarValue::Double(v) => Some(*v),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    /// Convert into the JSON representation used by the JSON adapter
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            ScalarValue::String(s) => Value::String(s.clone()),
            ScalarValue::Boolean(b) => Value::Bool(*b),
            ScalarValue::Char(c) => Value::String(c.to_string()),
            ScalarValue::Float(v) => serde_json::Number::from_f64(*v as f64)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ScalarValue::Double(v) => serde_json::Number::from_f64(*v)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ScalarValue::DateTime(dt) => Value::String(dt.to_rfc3339()),
            other => other.as_i64().map(Value::from).unwrap_or(Value::Null),
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::String(s) => write!(f, "{}", s),
            ScalarValue::Boolean(b) => write!(f, "{}", b),
            ScalarValue::Byte(v) => write!(f, "{}", v),
            ScalarValue::Char(c) => write!(f, "{}", c),
            ScalarValue::Short(v) => write!(f, "{}", v),
            ScalarValue::Integer(v) => write!(f, "{}", v),
            ScalarValue::Long(v) => write!(f, "{}", v),
            ScalarValue::Float(v) => write!(f, "{}", v),
            ScalarValue::Double(v) => write!(f, "{}", v),
            ScalarValue::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(s: &str) -> Self {
        ScalarValue::String(s.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(s: String) -> Self {
        ScalarValue::String(s)
    }
}

impl From<bool> for ScalarValue {
    fn from(b: bool) -> Self {
        ScalarValue::Boolean(b)
    }
}

impl From<i32> for ScalarValue {
    fn from(v: i32) -> Self {
        ScalarValue::Integer(v)
    }
}

impl From<i64> for ScalarValue {
    fn from(v: i64) -> Self {
        ScalarValue::Long(v)
    }
}

impl From<f64> for ScalarValue {
    fn from(v: f64) -> Self {
        ScalarValue::Double(v)
    }
}

/// A single field: a path plus an optional typed value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    /// Slash-delimited field path
    pub path: String,

    /// Declared type of the field
    #[serde(default)]
    pub field_type: FieldType,

    /// Value, `None` when absent or when it could not be produced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ScalarValue>,

    /// Processing status
    #[serde(default)]
    pub status: FieldStatus,

    /// Identifier of the document this field belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
}

impl FieldValue {
    /// Create an untyped field for the given path
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            field_type: FieldType::Any,
            value: None,
            status: FieldStatus::Supported,
            doc_id: None,
        }
    }

    /// Set the declared field type
    pub fn with_type(mut self, field_type: FieldType) -> Self {
        self.field_type = field_type;
        self
    }

    /// Set the value
    pub fn with_value(mut self, value: impl Into<ScalarValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set the owning document id
    pub fn with_doc_id(mut self, doc_id: impl Into<String>) -> Self {
        self.doc_id = Some(doc_id.into());
        self
    }

    /// Whether a value is present
    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }
}

/// An ordered bundle of fields produced by fanning out over a collection
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldGroup {
    /// Path as requested (may contain unindexed segments)
    pub path: String,

    /// Members in document order
    pub fields: Vec<Field>,
}

impl FieldGroup {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            fields: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Result of a read: either a single value or a group of values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Field {
    Single(FieldValue),
    Group(FieldGroup),
}

impl Field {
    /// Path of the field or group
    pub fn path(&self) -> &str {
        match self {
            Field::Single(value) => &value.path,
            Field::Group(group) => &group.path,
        }
    }

    pub fn as_single(&self) -> Option<&FieldValue> {
        match self {
            Field::Single(value) => Some(value),
            Field::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&FieldGroup> {
        match self {
            Field::Group(group) => Some(group),
            Field::Single(_) => None,
        }
    }

    /// Every leaf value in document order, descending into groups
    pub fn leaves(&self) -> Vec<&FieldValue> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a FieldValue>) {
        match self {
            Field::Single(value) => out.push(value),
            Field::Group(group) => {
                for field in &group.fields {
                    field.collect_leaves(out);
                }
            }
        }
    }
}

impl From<FieldValue> for Field {
    fn from(value: FieldValue) -> Self {
        Field::Single(value)
    }
}

impl From<FieldGroup> for Field {
    fn from(group: FieldGroup) -> Self {
        Field::Group(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_display_matches_serde() {
        assert_eq!(FieldType::Integer.to_string(), "INTEGER");
        assert_eq!(FieldType::DateTime.to_string(), "DATE_TIME");
        let json = serde_json::to_string(&FieldType::DateTime).unwrap();
        assert_eq!(json, "\"DATE_TIME\"");
    }

    #[test]
    fn test_scalar_field_type() {
        assert_eq!(ScalarValue::from("x").field_type(), FieldType::String);
        assert_eq!(ScalarValue::Short(3).field_type(), FieldType::Short);
        assert_eq!(ScalarValue::Float(1.5).as_f64(), Some(1.5));
        assert_eq!(ScalarValue::Byte(-2).as_i64(), Some(-2));
    }

    #[test]
    fn test_scalar_to_json() {
        assert_eq!(ScalarValue::Integer(7).to_json(), serde_json::json!(7));
        assert_eq!(ScalarValue::Char('z').to_json(), serde_json::json!("z"));
        assert_eq!(ScalarValue::Double(f64::NAN).to_json(), serde_json::Value::Null);
    }

    #[test]
    fn test_field_leaves_flatten_groups() {
        let mut inner = FieldGroup::new("/a[]/b[]");
        inner.fields.push(FieldValue::new("/a[0]/b[0]").with_value("x").into());
        inner.fields.push(FieldValue::new("/a[0]/b[1]").with_value("y").into());
        let mut outer = FieldGroup::new("/a[]/b[]");
        outer.fields.push(inner.into());
        outer.fields.push(FieldValue::new("/a[1]/b[0]").with_value("z").into());

        let field = Field::Group(outer);
        let paths: Vec<_> = field.leaves().iter().map(|v| v.path.as_str()).collect();
        assert_eq!(paths, vec!["/a[0]/b[0]", "/a[0]/b[1]", "/a[1]/b[0]"]);
    }

    #[test]
    fn test_field_value_serde() {
        let value = FieldValue::new("/order/id")
            .with_type(FieldType::Integer)
            .with_value(5_i32);
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["field_type"], "INTEGER");
        assert_eq!(json["value"]["type"], "INTEGER");
        let back: FieldValue = serde_json::from_value(json).unwrap();
        assert_eq!(back, value);
    }
}
