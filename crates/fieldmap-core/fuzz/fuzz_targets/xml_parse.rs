//! Fuzzing target for the XML adapter
//!
//! Whatever parses must render, and the rendering must parse again.

#![no_main]

use fieldmap_core::{DocumentAdapter, XmlAdapter};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let adapter = XmlAdapter::new().with_namespace("ns", "urn:fuzz");
    if let Ok(document) = adapter.parse(input) {
        if let Ok(rendered) = adapter.render(&document) {
            let _ = adapter.parse(&rendered);
        }
    }
});
