//! Mapping session
//!
//! Drives a [`FieldReader`] and a [`FieldWriter`] over a list of field
//! mappings. When a source path fans out over a collection, each resolved
//! member is written to a freshly vacant element of the target collection:
//! the first source element seen takes the slot after whatever the target
//! already holds, the next one the slot after that. Vacant slots are handed
//! out per source element, so several mappings reading from the same source
//! collection fill the same target elements.
//!
//! Copyright (c) 2025 Fieldmap Team
//! Licensed under the Apache-2.0 license

use crate::audit::{Audit, AuditLog, AuditSink, AuditStatus};
use crate::config::{FieldGroupPolicy, MapperConfig};
use crate::convert::{Converter, DefaultConverter};
use crate::document::{text_adapter, Document, DocumentFormat};
use crate::path::{FieldPath, PathSegment};
use crate::reader::FieldReader;
use crate::types::{Field, FieldType, FieldValue};
use crate::writer::FieldWriter;
use crate::{Error, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug_span;

/// One source-to-target field mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub source_type: FieldType,
    #[serde(default)]
    pub target_type: FieldType,
}

impl FieldMapping {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            source_type: FieldType::Any,
            target_type: FieldType::Any,
        }
    }

    pub fn with_types(mut self, source_type: FieldType, target_type: FieldType) -> Self {
        self.source_type = source_type;
        self.target_type = target_type;
        self
    }
}

/// Result of a mapping session
#[derive(Debug, Clone, PartialEq)]
pub struct MappingOutput {
    pub document: Document,
    pub audits: AuditLog,
}

/// Target slots handed out during one session
#[derive(Debug, Default)]
struct VacantSlots {
    /// (target parent path, segment name) -> allocation
    collections: HashMap<(String, String), SlotRun>,
}

#[derive(Debug)]
struct SlotRun {
    next: usize,
    /// concrete source collection path -> target index
    assigned: HashMap<String, usize>,
}

impl VacantSlots {
    /// Target index for the source element `source_key` under `parent`
    ///
    /// The first request for a collection starts at its current length in
    /// `target`; each new source element takes the next index.
    fn index_for(
        &mut self,
        target: &Document,
        parent: &FieldPath,
        segment: &PathSegment,
        source_key: String,
    ) -> usize {
        let run = self
            .collections
            .entry((parent.to_string(), segment.name().to_string()))
            .or_insert_with(|| SlotRun {
                next: target.collection_len(parent, segment),
                assigned: HashMap::new(),
            });
        let SlotRun { next, assigned } = run;
        *assigned.entry(source_key).or_insert_with(|| {
            let index = *next;
            *next += 1;
            index
        })
    }
}

/// Executes mappings from one source document into one target document
#[derive(Debug)]
pub struct MappingSession<C = DefaultConverter> {
    config: MapperConfig,
    converter: C,
}

impl MappingSession<DefaultConverter> {
    pub fn new(config: MapperConfig) -> Self {
        Self::with_converter(config, DefaultConverter::new())
    }
}

impl<C: Converter + Clone> MappingSession<C> {
    pub fn with_converter(config: MapperConfig, converter: C) -> Self {
        Self { config, converter }
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Map `source` into a new document of the source's format
    pub fn execute(&self, source: &Document, mappings: &[FieldMapping]) -> Result<MappingOutput> {
        self.execute_into(source, Document::new(source.format()), mappings)
    }

    /// Map `source` into `target`, adding to whatever it already holds
    pub fn execute_into(
        &self,
        source: &Document,
        target: Document,
        mappings: &[FieldMapping],
    ) -> Result<MappingOutput> {
        let span = debug_span!("mapping_session", mappings = mappings.len(), doc_id = ?self.config.doc_id);
        let _guard = span.enter();

        let mut audits = AuditLog::new();
        let mut writer = FieldWriter::with_document(target, self.converter.clone())
            .with_max_index(self.config.write.max_index);

        if !source.has_content() {
            audits.add_audit(
                Audit::new(AuditStatus::Warn, "/", "Source document is empty")
                    .with_doc_id(self.config.doc_id.clone()),
            );
            return Ok(MappingOutput {
                document: writer.into_document(),
                audits,
            });
        }

        let reader = FieldReader::new(self.converter.clone());
        let mut slots = VacantSlots::default();
        for mapping in mappings {
            self.map_field(&reader, source, &mut writer, &mut slots, mapping, &mut audits)?;
        }

        Ok(MappingOutput {
            document: writer.into_document(),
            audits,
        })
    }

    /// Parse `input`, map it, and render the result in `target_format`
    pub fn execute_text(
        &self,
        source_format: DocumentFormat,
        input: &str,
        target_format: DocumentFormat,
        mappings: &[FieldMapping],
    ) -> Result<(String, AuditLog)> {
        let source = text_adapter(source_format, &self.config)?.parse(input)?;
        let output = self.execute_into(&source, Document::new(target_format), mappings)?;
        let rendered = text_adapter(target_format, &self.config)?.render(&output.document)?;
        Ok((rendered, output.audits))
    }

    fn map_field(
        &self,
        reader: &FieldReader<C>,
        source: &Document,
        writer: &mut FieldWriter<C>,
        slots: &mut VacantSlots,
        mapping: &FieldMapping,
        audits: &mut AuditLog,
    ) -> Result<()> {
        let mut request = FieldValue::new(&mapping.source).with_type(mapping.source_type);
        request.doc_id = self.config.doc_id.clone();

        match reader.read(source, &request, audits)? {
            Field::Single(value) => {
                debug!("Mapping {} -> {}", value.path, mapping.target);
                writer.write(&retarget(&value, &mapping.target, mapping.target_type).into(), audits)
            }
            Field::Group(group) => {
                let target = FieldPath::parse(&mapping.target);
                let target_slots = target.unindexed_positions();
                let source_slots = FieldPath::parse(&mapping.source).unindexed_positions();
                let members: Vec<&FieldValue> = group.fields.iter().flat_map(Field::leaves).collect();
                debug!(
                    "Mapping group {} ({} members) -> {}",
                    mapping.source,
                    members.len(),
                    mapping.target
                );

                if members.is_empty() {
                    return Ok(());
                }

                if target_slots.is_empty() {
                    return self.map_group_to_single(writer, mapping, &members, audits);
                }

                for member in members {
                    let concrete = FieldPath::parse(&member.path);
                    let mut pinned = target.clone();
                    for (&source_position, &target_position) in source_slots.iter().zip(&target_slots) {
                        let source_key = concrete.prefix(source_position + 1).to_string();
                        let parent = pinned.prefix(target_position);
                        let segment = &pinned.segments()[target_position];
                        let index = slots.index_for(writer.document(), &parent, segment, source_key);
                        pinned.set_index_at(target_position, index);
                    }
                    writer.write(
                        &retarget(member, &pinned.to_string(), mapping.target_type).into(),
                        audits,
                    )?;
                }
                Ok(())
            }
        }
    }

    fn map_group_to_single(
        &self,
        writer: &mut FieldWriter<C>,
        mapping: &FieldMapping,
        members: &[&FieldValue],
        audits: &mut AuditLog,
    ) -> Result<()> {
        match self.config.group_policy {
            FieldGroupPolicy::Strict => Err(Error::FieldGroup {
                path: mapping.target.clone(),
                size: members.len(),
            }),
            FieldGroupPolicy::WarnAndSkip => {
                if members.len() > 1 {
                    audits.add_audit(
                        Audit::new(
                            AuditStatus::Warn,
                            &mapping.target,
                            format!(
                                "Field group from '{}' has {} values but target is not a collection; skipped {}",
                                mapping.source,
                                members.len(),
                                members.len() - 1
                            ),
                        )
                        .with_doc_id(self.config.doc_id.clone()),
                    );
                }
                writer.write(&retarget(members[0], &mapping.target, mapping.target_type).into(), audits)
            }
        }
    }
}

/// Copy of `value` addressed at `path` with the target type
fn retarget(value: &FieldValue, path: &str, field_type: FieldType) -> FieldValue {
    FieldValue {
        path: path.to_string(),
        field_type,
        ..value.clone()
    }
}
