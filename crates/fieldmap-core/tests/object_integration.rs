//! Mapping between Rust values and documents

mod test_support;

use fieldmap_core::{
    AuditLog, DefaultConverter, Document, DocumentFormat, FieldMapping, FieldType, FieldValue,
    FieldWriter, MapperConfig, MappingSession, ObjectAdapter,
};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use test_support::read_string;

#[derive(Debug, Serialize)]
struct PurchaseOrder {
    number: String,
    customer: Customer,
    lines: Vec<Line>,
}

#[derive(Debug, Serialize)]
struct Customer {
    name: String,
    vip: bool,
}

#[derive(Debug, Serialize)]
struct Line {
    sku: String,
    quantity: u32,
}

#[derive(Debug, PartialEq, Deserialize)]
struct Invoice {
    reference: String,
    vip: bool,
    items: Vec<InvoiceItem>,
}

#[derive(Debug, PartialEq, Deserialize)]
struct InvoiceItem {
    code: String,
    count: i32,
}

fn purchase_order() -> PurchaseOrder {
    PurchaseOrder {
        number: "PO-7".to_string(),
        customer: Customer {
            name: "Acme".to_string(),
            vip: true,
        },
        lines: vec![
            Line {
                sku: "A".to_string(),
                quantity: 3,
            },
            Line {
                sku: "B".to_string(),
                quantity: 1,
            },
        ],
    }
}

#[test]
fn test_read_from_object_graph() {
    let document = ObjectAdapter::from_object(&purchase_order()).unwrap();
    assert_eq!(read_string(&document, "/customer/name").as_deref(), Some("Acme"));
    assert_eq!(read_string(&document, "/lines[1]/quantity").as_deref(), Some("1"));
}

#[test]
fn test_map_object_to_object() {
    let source = ObjectAdapter::from_object(&purchase_order()).unwrap();
    let mappings = [
        FieldMapping::new("/number", "/reference"),
        FieldMapping::new("/customer/vip", "/vip"),
        FieldMapping::new("/lines[]/sku", "/items[]/code"),
        FieldMapping::new("/lines[]/quantity", "/items[]/count")
            .with_types(FieldType::Any, FieldType::Integer),
    ];
    let output = MappingSession::new(MapperConfig::default())
        .execute_into(&source, Document::new(DocumentFormat::Object), &mappings)
        .unwrap();
    assert!(output.audits.is_empty());

    let invoice: Invoice = ObjectAdapter::to_object(&output.document).unwrap();
    assert_eq!(
        invoice,
        Invoice {
            reference: "PO-7".to_string(),
            vip: true,
            items: vec![
                InvoiceItem {
                    code: "A".to_string(),
                    count: 3,
                },
                InvoiceItem {
                    code: "B".to_string(),
                    count: 1,
                },
            ],
        }
    );
}

#[test]
fn test_written_types_survive_materialization() {
    let mut writer = FieldWriter::with_document(Document::new(DocumentFormat::Object), DefaultConverter::new());
    let mut audits = AuditLog::new();
    writer
        .write(
            &FieldValue::new("/count").with_type(FieldType::Integer).with_value("42").into(),
            &mut audits,
        )
        .unwrap();

    #[derive(Deserialize)]
    struct Counter {
        count: i32,
    }
    let counter: Counter = ObjectAdapter::to_object(writer.document()).unwrap();
    assert_eq!(counter.count, 42);
}
