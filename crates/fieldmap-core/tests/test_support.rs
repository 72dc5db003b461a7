//! Shared test support utilities for integration tests

#![allow(dead_code)]

use fieldmap_core::{
    AuditLog, DefaultConverter, Document, DocumentAdapter, Field, FieldReader, FieldType,
    FieldValue, FieldWriter, JsonAdapter, XmlAdapter,
};
use serde_json::Value;

/// Menu document with a three-member `menuitem` collection
pub const MENU_JSON: &str = r#"{
  "menu": {
    "id": "file",
    "popup": {
      "menuitem": [
        {"value": "New", "onclick": "CreateNewDoc()"},
        {"value": "Open", "onclick": "OpenDoc()"},
        {"value": "Close", "onclick": "CloseDoc()"}
      ]
    }
  }
}"#;

/// Bakery items: four batters on the first item, none on the second
pub const ITEMS_JSON: &str = r#"{
  "items": {
    "item": [
      {
        "id": "0001",
        "type": "donut",
        "ppu": 0.55,
        "batters": {
          "batter": [
            {"id": "1001", "type": "Regular"},
            {"id": "1002", "type": "Chocolate"},
            {"id": "1003", "type": "Blueberry"},
            {"id": "1004", "type": "Devil's Food"}
          ]
        },
        "topping": [
          {"id": "5001", "type": "None"},
          {"id": "5002", "type": "Glazed"}
        ]
      },
      {
        "id": "0002",
        "type": "bar",
        "ppu": 0.75,
        "batters": {"batter": []},
        "topping": [
          {"id": "5001", "type": "None"},
          {"id": "5002", "type": "Glazed"},
          {"id": "5005", "type": "Sugar"},
          {"id": "5003", "type": "Chocolate"},
          {"id": "5004", "type": "Maple"}
        ]
      }
    ]
  }
}"#;

/// Same bakery data as XML
pub const ITEMS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<items>
  <item id="0001" type="donut">
    <ppu>0.55</ppu>
    <batters>
      <batter id="1001">Regular</batter>
      <batter id="1002">Chocolate</batter>
      <batter id="1003">Blueberry</batter>
      <batter id="1004">Devil's Food</batter>
    </batters>
    <topping id="5001">None</topping>
    <topping id="5002">Glazed</topping>
  </item>
  <item id="0002" type="bar">
    <ppu>0.75</ppu>
    <batters/>
  </item>
</items>"#;

pub fn json_doc(input: &str) -> Document {
    JsonAdapter::new().parse(input).expect("Failed to parse JSON fixture")
}

pub fn xml_doc(input: &str) -> Document {
    XmlAdapter::new().parse(input).expect("Failed to parse XML fixture")
}

pub fn reader() -> FieldReader {
    FieldReader::new(DefaultConverter::new())
}

pub fn writer() -> FieldWriter {
    FieldWriter::new(DefaultConverter::new())
}

/// Read `path` untyped and return the field plus the audits it produced
pub fn read(document: &Document, path: &str) -> (Field, AuditLog) {
    read_typed(document, path, FieldType::Any)
}

pub fn read_typed(document: &Document, path: &str, field_type: FieldType) -> (Field, AuditLog) {
    let mut audits = AuditLog::new();
    let request = FieldValue::new(path).with_type(field_type);
    let field = reader()
        .read(document, &request, &mut audits)
        .expect("Read should not fail");
    (field, audits)
}

/// Read `path` and return its value as a string, if any
pub fn read_string(document: &Document, path: &str) -> Option<String> {
    let (field, _) = read(document, path);
    field
        .as_single()
        .and_then(|v| v.value.as_ref())
        .map(|v| v.to_string())
}

/// Write a string value at `path`, panicking on fatal errors
pub fn write_string(writer: &mut FieldWriter, path: &str, value: &str) -> AuditLog {
    let mut audits = AuditLog::new();
    writer
        .write(&FieldValue::new(path).with_value(value).into(), &mut audits)
        .expect("Write should not fail");
    audits
}

pub fn as_json(document: &Document) -> Value {
    JsonAdapter::to_value(document)
}
