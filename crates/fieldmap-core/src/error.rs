//! Error types for the fieldmap core library
//!
//! Only document-level (fatal) failures are represented here. Field-level
//! problems such as a missing path or a failed conversion never surface as an
//! `Error`; they degrade the field to null and are reported through an
//! [`AuditSink`](crate::audit::AuditSink).

use crate::document::DocumentFormat;
use crate::path::PathError;
use thiserror::Error;

/// Main error type for fieldmap operations
#[derive(Error, Debug)]
pub enum Error {
    /// The document has no content to read from
    #[error("Empty {format} document")]
    EmptyDocument { format: DocumentFormat },

    /// The document text could not be parsed
    #[error("Failed to parse {format} document: {message}")]
    Parse {
        format: DocumentFormat,
        message: String,
    },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// The document tree cannot be rendered in the requested format
    #[error("Failed to render {format} document: {message}")]
    Render {
        format: DocumentFormat,
        message: String,
    },

    /// A field path that cannot be used at all (e.g. empty)
    #[error("Invalid field path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    /// Path manipulation errors
    #[error(transparent)]
    Path(#[from] PathError),

    /// A field group could not be mapped under the strict group policy
    #[error("Field group of {size} values cannot be written to non-collection path '{path}'")]
    FieldGroup { path: String, size: usize },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an invalid path error
    pub fn invalid_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error without an underlying cause
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Whether this error was caused by the input document itself
    pub fn is_document_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyDocument { .. } | Self::Parse { .. } | Self::Json { .. }
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}
