//! Path segment parsing and representation
//!
//! A segment is one `/`-delimited token of a field path. Tokens are cleaned
//! into a name plus an optional collection marker (`[n]`, `[]`, `<n>`, `<>`),
//! an optional inert `{...}` qualifier and an attribute flag (`@`). Tokens that
//! do not match the grammar exactly are kept verbatim.
//!
//! Copyright (c) 2025 Fieldmap Team
//! Licensed under the Apache-2.0 license

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Which bracket pair a collection marker was written with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BracketStyle {
    /// `[n]` / `[]`
    Square,
    /// `<n>` / `<>`
    Angle,
}

impl BracketStyle {
    pub fn open(&self) -> char {
        match self {
            BracketStyle::Square => '[',
            BracketStyle::Angle => '<',
        }
    }

    pub fn close(&self) -> char {
        match self {
            BracketStyle::Square => ']',
            BracketStyle::Angle => '>',
        }
    }
}

/// Collection marker carried by a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionMarker {
    None,
    Unindexed(BracketStyle),
    Indexed(usize, BracketStyle),
}

impl CollectionMarker {
    pub fn is_collection(&self) -> bool {
        !matches!(self, CollectionMarker::None)
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            CollectionMarker::Indexed(index, _) => Some(*index),
            _ => None,
        }
    }

    pub fn style(&self) -> Option<BracketStyle> {
        match self {
            CollectionMarker::None => None,
            CollectionMarker::Unindexed(style) | CollectionMarker::Indexed(_, style) => {
                Some(*style)
            }
        }
    }
}

impl fmt::Display for CollectionMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionMarker::None => Ok(()),
            CollectionMarker::Unindexed(style) => write!(f, "{}{}", style.open(), style.close()),
            CollectionMarker::Indexed(index, style) => {
                write!(f, "{}{}{}", style.open(), index, style.close())
            }
        }
    }
}

fn segment_regex() -> &'static Regex {
    static SEGMENT: OnceLock<Regex> = OnceLock::new();
    SEGMENT.get_or_init(|| {
        Regex::new(r"^(@?)([^\[\]<>{}]*)(?:\[(\d*)\]|<(\d*)>|(\{[^{}]*\}))?$")
            .expect("segment pattern is valid")
    })
}

/// A single segment of a field path
#[derive(Debug, Clone, Eq)]
pub struct PathSegment {
    /// Token exactly as it appeared in the parsed path
    expression: String,
    name: String,
    marker: CollectionMarker,
    attribute: bool,
    qualifier: Option<String>,
}

impl PathSegment {
    /// Parse a single segment token
    pub fn parse(token: &str) -> Self {
        let verbatim = || Self {
            expression: token.to_string(),
            name: token.to_string(),
            marker: CollectionMarker::None,
            attribute: false,
            qualifier: None,
        };

        let Some(caps) = segment_regex().captures(token) else {
            return verbatim();
        };

        let bracket = |group: usize, style: BracketStyle| {
            caps.get(group).map(|m| {
                if m.as_str().is_empty() {
                    Some(CollectionMarker::Unindexed(style))
                } else {
                    m.as_str()
                        .parse::<usize>()
                        .ok()
                        .map(|index| CollectionMarker::Indexed(index, style))
                }
            })
        };

        let marker = match bracket(3, BracketStyle::Square).or_else(|| bracket(4, BracketStyle::Angle)) {
            Some(Some(marker)) => marker,
            // digits that do not fit an index
            Some(None) => return verbatim(),
            None => CollectionMarker::None,
        };

        Self {
            expression: token.to_string(),
            name: caps[2].to_string(),
            marker,
            attribute: !caps[1].is_empty(),
            qualifier: caps.get(5).map(|m| m.as_str().to_string()),
        }
    }

    /// Create a plain element segment
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            expression: name.clone(),
            name,
            marker: CollectionMarker::None,
            attribute: false,
            qualifier: None,
        }
    }

    /// Cleaned name: no marker, no qualifier, no leading `@`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The token this segment was parsed from
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn marker(&self) -> CollectionMarker {
        self.marker
    }

    pub fn index(&self) -> Option<usize> {
        self.marker.index()
    }

    pub fn is_collection(&self) -> bool {
        self.marker.is_collection()
    }

    pub fn is_indexed(&self) -> bool {
        matches!(self.marker, CollectionMarker::Indexed(..))
    }

    pub fn is_unindexed(&self) -> bool {
        matches!(self.marker, CollectionMarker::Unindexed(_))
    }

    pub fn is_attribute(&self) -> bool {
        self.attribute
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    /// Namespace prefix of a `prefix:local` name
    pub fn namespace_prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    /// Name without its namespace prefix
    pub fn local_name(&self) -> &str {
        self.name
            .split_once(':')
            .map(|(_, local)| local)
            .unwrap_or(&self.name)
    }

    /// Copy of this segment pinned to `index`, keeping the bracket style
    ///
    /// Plain segments become `[index]`.
    pub fn with_index(&self, index: usize) -> Self {
        let style = self.marker.style().unwrap_or(BracketStyle::Square);
        let mut segment = self.clone();
        segment.marker = CollectionMarker::Indexed(index, style);
        segment
    }

    pub(crate) fn set_marker(&mut self, marker: CollectionMarker) {
        self.marker = marker;
    }
}

impl PartialEq for PathSegment {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.marker == other.marker
            && self.attribute == other.attribute
            && self.qualifier == other.qualifier
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.attribute {
            write!(f, "@")?;
        }
        write!(f, "{}{}", self.name, self.marker)?;
        if let Some(qualifier) = &self.qualifier {
            write!(f, "{}", qualifier)?;
        }
        Ok(())
    }
}

/// Strip any collection marker, qualifier and leading `@` from a token
///
/// Malformed tokens such as `foo[0` are returned unchanged.
pub fn clean_path_segment(token: &str) -> String {
    PathSegment::parse(token).name
}

/// Extract the index of a `[n]` or `<n>` token
pub fn index_of_segment(token: &str) -> Option<usize> {
    PathSegment::parse(token).index()
}
