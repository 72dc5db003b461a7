//! Fuzzing target for path resolution
//!
//! Arbitrary paths are read from fixed and fuzzed documents and written into
//! a fresh writer. Neither side may panic.

#![no_main]

use fieldmap_core::{
    AuditLog, DefaultConverter, FieldPath, FieldReader, FieldValue, FieldWriter, JsonAdapter,
};
use libfuzzer_sys::fuzz_target;
use serde_json::{json, Value};

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    // First byte picks the split between path and document
    let split_point = (data[0] as usize) % data.len();
    let (path_bytes, doc_bytes) = data.split_at(split_point);
    let Ok(path) = std::str::from_utf8(path_bytes) else {
        return;
    };

    let parsed = FieldPath::parse(path);
    let _ = FieldPath::parse(&parsed.to_string());

    let reader = FieldReader::new(DefaultConverter::new());
    let mut audits = AuditLog::new();
    let request = FieldValue::new(path);

    let mut documents = vec![
        json!(null),
        json!([1, 2, 3]),
        json!({"a": [{"b": 1}, {"b": [2, 3]}]}),
        json!([[[[[]]]]]),
    ];
    if let Ok(value) = serde_json::from_slice::<Value>(doc_bytes) {
        documents.push(value);
    }
    for value in documents {
        let document = JsonAdapter::from_value(value);
        let _ = reader.read(&document, &request, &mut audits);
    }

    // sparse writes allocate up to the index; larger ones must be rejected
    let mut writer = FieldWriter::new(DefaultConverter::new()).with_max_index(10_000);
    let field = FieldValue::new(path).with_value("x");
    let _ = writer.write(&field.clone().into(), &mut audits);
    let _ = writer.write(&field.into(), &mut audits);
});
