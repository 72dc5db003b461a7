//! Audit trail for soft, field-level failures
//!
//! The reader, writer and mapping session never fail a whole document because
//! of one bad field. Instead they record an [`Audit`] through an
//! [`AuditSink`] and carry on with a null value.
//!
//! Copyright (c) 2025 Fieldmap Team
//! Licensed under the Apache-2.0 license

use crate::types::FieldType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of an audit entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditStatus {
    Info,
    Warn,
    Error,
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditStatus::Info => write!(f, "INFO"),
            AuditStatus::Warn => write!(f, "WARN"),
            AuditStatus::Error => write!(f, "ERROR"),
        }
    }
}

/// One audit record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audit {
    /// Document the entry belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
    pub message: String,
    /// Field path the entry refers to
    pub path: String,
    pub status: AuditStatus,
    /// Literal offending value, when there is one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Audit {
    pub fn new(status: AuditStatus, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            doc_id: None,
            message: message.into(),
            path: path.into(),
            status,
            value: None,
        }
    }

    pub fn with_doc_id(mut self, doc_id: Option<String>) -> Self {
        self.doc_id = doc_id;
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Standard entry for a value that could not be converted
    pub fn conversion_failure(path: impl Into<String>, input: &str, target: FieldType) -> Self {
        Self::new(
            AuditStatus::Error,
            path,
            format!("Failed to convert field value '{}' into type '{}'", input, target),
        )
        .with_value(input)
    }
}

impl fmt::Display for Audit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.status, self.path, self.message)
    }
}

/// Receiver of audit entries
pub trait AuditSink {
    fn add_audit(&mut self, audit: Audit);
}

/// In-memory audit log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditLog {
    audits: Vec<Audit>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn audits(&self) -> &[Audit] {
        &self.audits
    }

    pub fn into_audits(self) -> Vec<Audit> {
        self.audits
    }

    pub fn len(&self) -> usize {
        self.audits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.audits.is_empty()
    }

    /// Number of entries with the given status
    pub fn count(&self, status: AuditStatus) -> usize {
        self.audits.iter().filter(|a| a.status == status).count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(AuditStatus::Error) > 0
    }

    /// Entries recorded for a path
    pub fn for_path<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a Audit> + 'a {
        self.audits.iter().filter(move |a| a.path == path)
    }
}

impl AuditSink for AuditLog {
    fn add_audit(&mut self, audit: Audit) {
        self.audits.push(audit);
    }
}

impl AuditSink for Vec<Audit> {
    fn add_audit(&mut self, audit: Audit) {
        self.push(audit);
    }
}
