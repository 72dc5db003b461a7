//! Fieldmap Core - Path-addressed field read/write engine
//!
//! This crate reads typed field values out of a source document (JSON, XML or
//! an in-memory object graph), converts them, and writes them into a target
//! document, handling nested objects and repeating collections.
//!
//! # Main Components
//!
//! - **Paths**: `/`-delimited field paths with `[n]`/`<n>` collection markers
//! - **Documents**: one tree model shared by the JSON, XML and object adapters
//! - **Reader**: resolves paths into single values or fanned-out field groups
//! - **Writer**: builds target documents incrementally from field paths
//! - **Mapping**: drives reader and writer over a list of field mappings
//! - **Audits**: field-level failures degrade to null and are recorded, never thrown
//!
//! # Example
//!
//! ```no_run
//! use fieldmap_core::{FieldMapping, MapperConfig, MappingSession, DocumentFormat, Result};
//!
//! fn example() -> Result<()> {
//!     let session = MappingSession::new(MapperConfig::default());
//!     let (json, audits) = session.execute_text(
//!         DocumentFormat::Json,
//!         r#"{"orders":[{"id":"a"},{"id":"b"}]}"#,
//!         DocumentFormat::Json,
//!         &[FieldMapping::new("/orders[]/id", "/refs<>/value")],
//!     )?;
//!     assert!(!audits.has_errors());
//!     println!("{}", json);
//!     Ok(())
//! }
//! ```

pub mod audit;
pub mod config;
pub mod convert;
pub mod document;
pub mod error;
pub mod mapping;
pub mod path;
pub mod reader;
pub mod types;
pub mod writer;

// Re-export main types for convenience
pub use audit::{Audit, AuditLog, AuditSink, AuditStatus};
pub use config::{ConfigFormat, FieldGroupPolicy, MapperConfig, MapperConfigBuilder, WriteOptions};
pub use convert::{ConversionError, Converter, DefaultConverter};
pub use document::{
    Document, DocumentAdapter, DocumentFormat, JsonAdapter, Node, NodeKey, ObjectAdapter,
    ObjectNode, XmlAdapter,
};
pub use error::{Error, Result};
pub use mapping::{FieldMapping, MappingOutput, MappingSession};
pub use path::{FieldPath, PathError, PathSegment};
pub use reader::FieldReader;
pub use types::{Field, FieldGroup, FieldStatus, FieldType, FieldValue, ScalarValue};
pub use writer::FieldWriter;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
