//! Field path model
//!
//! A field path is a `/`-delimited sequence of segments such as
//! `/orders[4]/contact/firstName` or `/ns1:items/item<>/@id`. Parsing never
//! fails: anything that does not match the segment grammar is kept as a
//! literal segment name, and lookups against it simply find nothing.
//!
//! Copyright (c) 2025 Fieldmap Team
//! Licensed under the Apache-2.0 license

pub mod error;
pub mod segment;


pub use error::PathError;
pub use segment::{clean_path_segment, index_of_segment, BracketStyle, CollectionMarker, PathSegment};

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Path separator
pub const PATH_SEPARATOR: char = '/';

/// A parsed field path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// Parse a path string into segments
    pub fn parse(path: &str) -> Self {
        let segments = path
            .split(PATH_SEPARATOR)
            .filter(|token| !token.is_empty())
            .map(PathSegment::parse)
            .collect();
        Self { segments }
    }

    /// The empty path, addressing the document root
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// Append a segment and return self (builder pattern)
    pub fn child(mut self, segment: PathSegment) -> Self {
        self.segments.push(segment);
        self
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn last_segment(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Path made of the first `len` segments
    pub fn prefix(&self, len: usize) -> Self {
        Self {
            segments: self.segments[..len.min(self.segments.len())].to_vec(),
        }
    }

    /// Path without its last segment
    pub fn parent_path(&self) -> Self {
        self.prefix(self.segments.len().saturating_sub(1))
    }

    /// Second-to-last segment, i.e. the container of the terminal value
    pub fn last_segment_parent(&self) -> Option<&PathSegment> {
        let len = self.segments.len();
        if len < 2 {
            return None;
        }
        self.segments.get(len - 2)
    }

    /// Sub-path ending at [`last_segment_parent`](Self::last_segment_parent)
    pub fn last_segment_parent_path(&self) -> Self {
        self.parent_path()
    }

    /// Drop the first segment
    pub fn de_parentify(&self) -> Self {
        Self {
            segments: self.segments.iter().skip(1).cloned().collect(),
        }
    }

    /// Drop everything up to and including the collection segment `name`
    ///
    /// The remainder is the path relative to one member of that collection.
    pub fn de_collectionify(&self, name: &str) -> Result<Self, PathError> {
        let position = self
            .segments
            .iter()
            .position(|s| s.is_collection() && s.name() == name)
            .ok_or_else(|| PathError::SegmentNotFound {
                segment: name.to_string(),
                path: self.to_string(),
            })?;
        Ok(Self {
            segments: self.segments[position + 1..].to_vec(),
        })
    }

    /// Whether any segment carries an explicit index
    pub fn is_indexed_collection(&self) -> bool {
        self.segments.iter().any(PathSegment::is_indexed)
    }

    /// Whether any segment carries a collection marker
    pub fn has_collection(&self) -> bool {
        self.segments.iter().any(PathSegment::is_collection)
    }

    pub fn collection_segment_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_collection()).count()
    }

    /// Positions of the segments written as `[]` or `<>`
    pub fn unindexed_positions(&self) -> Vec<usize> {
        self.segments
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_unindexed())
            .map(|(i, _)| i)
            .collect()
    }

    /// Set or replace the index of the first segment matching `token`
    ///
    /// Segments are matched by the text they were parsed from, so repeating
    /// the same call after a successful mutation targets the same segment.
    pub fn set_collection_index(&mut self, token: &str, index: i64) -> Result<(), PathError> {
        if index < 0 {
            return Err(PathError::NegativeIndex { index });
        }
        let path = self.to_string();
        let segment = self
            .segments
            .iter_mut()
            .find(|s| s.expression() == token || s.to_string() == token)
            .ok_or_else(|| PathError::SegmentNotFound {
                segment: token.to_string(),
                path,
            })?;

        if segment.qualifier().is_some() {
            return Err(PathError::QualifiedSegment {
                segment: token.to_string(),
            });
        }
        let Some(style) = segment.marker().style() else {
            return Err(PathError::NotACollection {
                segment: token.to_string(),
            });
        };
        segment.set_marker(CollectionMarker::Indexed(index as usize, style));
        Ok(())
    }

    /// Pin the segment at `position` to `index`
    ///
    /// Panics if `position` is out of bounds.
    pub fn set_index_at(&mut self, position: usize, index: usize) {
        let pinned = self.segments[position].with_index(index);
        self.segments[position] = pinned;
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "{}", PATH_SEPARATOR);
        }
        for segment in &self.segments {
            write!(f, "{}{}", PATH_SEPARATOR, segment)?;
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for FieldPath {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}
