//! Error types for field path manipulation
//!
//! Parsing a path never fails; these errors only come from explicit
//! mutations and derivations on an already parsed path.
//!
//! Copyright (c) 2025 Fieldmap Team
//! Licensed under the Apache-2.0 license

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// Collection indexes must be non-negative
    #[error("Collection index must not be negative: {index}")]
    NegativeIndex { index: i64 },

    /// The segment has no `[]` or `<>` notation
    #[error("Segment '{segment}' is not a collection")]
    NotACollection { segment: String },

    /// `{}` qualifiers never carry an index
    #[error("Segment '{segment}' uses a '{{}}' qualifier and cannot be indexed")]
    QualifiedSegment { segment: String },

    /// No segment of the path matches the given token
    #[error("Segment '{segment}' not found in path '{path}'")]
    SegmentNotFound { segment: String, path: String },
}
