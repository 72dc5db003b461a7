//! Object-graph adapter
//!
//! Rust values are brought into the tree through serde: anything that
//! implements `Serialize` can be read from, and anything that implements
//! `DeserializeOwned` can be built from a written document.
//!
//! Copyright (c) 2025 Fieldmap Team
//! Licensed under the Apache-2.0 license

use super::json::{node_from_value, value_from_node};
use super::{Document, DocumentFormat, Node};
use crate::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Converts between Rust values and documents
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectAdapter;

impl ObjectAdapter {
    /// Build a document from a value
    ///
    /// The root object records the value's type name.
    pub fn from_object<T: Serialize + ?Sized>(value: &T) -> Result<Document> {
        let mut root = node_from_value(serde_json::to_value(value)?);
        if let Node::Object(object) = &mut root {
            object.set_type_name(std::any::type_name::<T>());
        }
        Ok(Document::from_node(DocumentFormat::Object, root))
    }

    /// Materialize a document as a value
    pub fn to_object<T: DeserializeOwned>(document: &Document) -> Result<T> {
        let value = value_from_node(document.root());
        Ok(serde_json::from_value(value)?)
    }
}
