//! Path navigation over the document tree
//!
//! Read-side resolution rules shared by every format:
//!
//! - an indexed segment over a non-array node treats the node as a
//!   one-element collection
//! - a plain or unindexed segment over an array takes its first member
//! - a segment with an empty name and a marker addresses the current node,
//!   which is how a top-level JSON array is reached (`/[2]/name`)
//!
//! The write side ([`Document::ensure_path`]) creates whatever a path needs,
//! deciding between objects and arrays from the path alone.
//!
//! Copyright (c) 2025 Fieldmap Team
//! Licensed under the Apache-2.0 license

use super::{grow_array, Document, Node, NodeKey};
use crate::path::{CollectionMarker, FieldPath, PathSegment};
use crate::{Error, Result};
use std::collections::HashMap;

/// Key a segment addresses inside an object
pub fn segment_key(segment: &PathSegment) -> NodeKey {
    NodeKey {
        name: segment.name().to_string(),
        attribute: segment.is_attribute(),
    }
}

/// Whether the segment refers to the node it is applied to
pub(crate) fn addresses_self(segment: &PathSegment) -> bool {
    segment.name().is_empty() && segment.is_collection()
}

/// Named child of `node`, looking through arrays at their first member
fn named_child<'a>(node: &'a Node, segment: &PathSegment) -> Option<&'a Node> {
    match node {
        Node::Object(object) => object.get(&segment_key(segment)),
        Node::Array(items) => items.first().and_then(|first| named_child(first, segment)),
        _ => None,
    }
}

/// Node a segment lands on before its collection marker is applied
fn segment_target<'a>(node: &'a Node, segment: &PathSegment) -> Option<&'a Node> {
    if addresses_self(segment) {
        Some(node)
    } else {
        named_child(node, segment)
    }
}

fn member(node: &Node, index: usize) -> Option<&Node> {
    match node {
        Node::Array(items) => items.get(index),
        single if index == 0 => Some(single),
        _ => None,
    }
}

fn first_member(node: &Node) -> Option<&Node> {
    match node {
        Node::Array(items) => items.first(),
        other => Some(other),
    }
}

/// Apply one segment to a node
pub fn step<'a>(node: &'a Node, segment: &PathSegment) -> Option<&'a Node> {
    let target = segment_target(node, segment)?;
    match segment.marker() {
        CollectionMarker::Indexed(index, _) => member(target, index),
        CollectionMarker::Unindexed(_) | CollectionMarker::None => first_member(target),
    }
}

impl Document {
    /// Resolve `path` to a single node
    ///
    /// The empty path resolves to the root.
    pub fn navigate(&self, path: &FieldPath) -> Option<&Node> {
        path.segments()
            .iter()
            .try_fold(self.root(), |node, segment| step(node, segment))
    }

    /// Resolve `path`, fanning out over every unindexed collection segment
    ///
    /// Each result carries the concrete path of the node, with the fanned
    /// segments pinned to the member index they resolved to. An unindexed
    /// segment over a non-array node resolves to that node at index 0.
    pub fn expand(&self, path: &FieldPath) -> Vec<(FieldPath, &Node)> {
        let mut frontier: Vec<(FieldPath, &Node)> = vec![(FieldPath::root(), self.root())];

        for segment in path.segments() {
            let mut next = Vec::with_capacity(frontier.len());
            for (concrete, node) in frontier {
                let Some(target) = segment_target(node, segment) else {
                    continue;
                };
                match segment.marker() {
                    CollectionMarker::Unindexed(_) => match target {
                        Node::Array(items) => {
                            for (index, item) in items.iter().enumerate() {
                                next.push((concrete.clone().child(segment.with_index(index)), item));
                            }
                        }
                        single => next.push((concrete.child(segment.with_index(0)), single)),
                    },
                    CollectionMarker::Indexed(index, _) => {
                        if let Some(item) = member(target, index) {
                            next.push((concrete.child(segment.clone()), item));
                        }
                    }
                    CollectionMarker::None => {
                        if let Some(item) = first_member(target) {
                            next.push((concrete.child(segment.clone()), item));
                        }
                    }
                }
            }
            frontier = next;
            if frontier.is_empty() {
                break;
            }
        }

        frontier
    }

    /// Number of members of the first collection named `segment_name` on `path`
    ///
    /// `None` when the path has no such segment or the collection itself is
    /// absent; `Some(0)` when it is present but empty (or null). A present
    /// non-array node counts as one member.
    pub fn collection_count(&self, path: &FieldPath, segment_name: &str) -> Option<usize> {
        let position = path
            .segments()
            .iter()
            .position(|segment| segment.name() == segment_name)?;
        let parent = self.navigate(&path.prefix(position))?;
        let collection = segment_target(parent, &path.segments()[position])?;

        Some(match collection {
            Node::Array(items) => items.len(),
            Node::Null => 0,
            _ => 1,
        })
    }

    /// Number of members currently held by `segment` under `parent`
    ///
    /// The position the next appended member would take; 0 when the parent
    /// or the collection is absent.
    pub fn collection_len(&self, parent: &FieldPath, segment: &PathSegment) -> usize {
        match self.navigate(parent).and_then(|node| segment_target(node, segment)) {
            Some(Node::Array(items)) => items.len(),
            Some(Node::Null) | None => 0,
            Some(_) => 1,
        }
    }
}

/// (parent concrete path, segment name) -> index of the element appended for it
pub type AppendCache = HashMap<(String, String), usize>;

/// Largest collection index a write may address unless configured otherwise
pub const DEFAULT_MAX_INDEX: usize = 1 << 20;

impl Document {
    /// Walk `path` from the root, creating what is missing, and store `value`
    /// under its last segment
    ///
    /// Indexed segments grow arrays with null placeholders, up to
    /// `max_index`. An unindexed non-terminal segment appends one element per
    /// (parent, name) pair recorded in `appended` and reuses it afterwards; an
    /// unindexed terminal segment always appends. Returns the concrete path
    /// that was written.
    pub fn ensure_path(
        &mut self,
        path: &FieldPath,
        value: Node,
        appended: &mut AppendCache,
        max_index: usize,
    ) -> Result<FieldPath> {
        let Some((last, parents)) = path.segments().split_last() else {
            return Err(Error::invalid_path(path.to_string(), "path has no segments"));
        };

        let walk = Walk { path, max_index };
        let mut concrete = FieldPath::root();
        let mut node = self.root_mut();
        for segment in parents {
            node = walk.enter(node, segment, &mut concrete, appended)?;
        }
        walk.set_leaf(node, last, &mut concrete, value)?;
        Ok(concrete)
    }
}

/// Node a segment is applied to: the current node for `/[n]`-style
/// segments, otherwise the named child, created as null when absent
fn container<'a>(node: &'a mut Node, segment: &PathSegment) -> &'a mut Node {
    if addresses_self(segment) {
        node
    } else {
        node.ensure_object()
            .child_or_insert(segment_key(segment), Node::Null)
    }
}

struct Walk<'p> {
    path: &'p FieldPath,
    max_index: usize,
}

impl Walk<'_> {
    /// Array length needed to hold `index`
    fn slot_len(&self, index: usize) -> Result<usize> {
        if index > self.max_index {
            return Err(Error::invalid_path(
                self.path.to_string(),
                format!("index {} exceeds the limit of {}", index, self.max_index),
            ));
        }
        index.checked_add(1).ok_or_else(|| {
            Error::invalid_path(self.path.to_string(), format!("index {} is too large", index))
        })
    }

    /// Walk one non-terminal segment, creating what is missing
    fn enter<'a>(
        &self,
        node: &'a mut Node,
        segment: &PathSegment,
        concrete: &mut FieldPath,
        appended: &mut AppendCache,
    ) -> Result<&'a mut Node> {
        let cache_key = (concrete.to_string(), segment.name().to_string());

        match segment.marker() {
            CollectionMarker::Indexed(index, _) => {
                let len = self.slot_len(index)?;
                concrete.push(segment.clone());
                let items = container(node, segment).ensure_array();
                grow_array(items, len);
                Ok(&mut items[index])
            }
            CollectionMarker::Unindexed(_) => {
                let items = container(node, segment).ensure_array();
                let index = *appended.entry(cache_key).or_insert_with(|| {
                    items.push(Node::Null);
                    items.len() - 1
                });
                grow_array(items, index + 1);
                concrete.push(segment.with_index(index));
                Ok(&mut items[index])
            }
            CollectionMarker::None => {
                concrete.push(segment.clone());
                Ok(container(node, segment))
            }
        }
    }

    /// Store the leaf under the terminal segment
    fn set_leaf(
        &self,
        node: &mut Node,
        segment: &PathSegment,
        concrete: &mut FieldPath,
        leaf: Node,
    ) -> Result<()> {
        if segment.is_attribute() {
            concrete.push(segment.clone());
            node.ensure_object().insert(segment_key(segment), leaf);
            return Ok(());
        }

        match segment.marker() {
            CollectionMarker::Indexed(index, _) => {
                let len = self.slot_len(index)?;
                concrete.push(segment.clone());
                let items = container(node, segment).ensure_array();
                grow_array(items, len);
                assign(&mut items[index], leaf);
            }
            CollectionMarker::Unindexed(_) => {
                let items = container(node, segment).ensure_array();
                concrete.push(segment.with_index(items.len()));
                items.push(leaf);
            }
            CollectionMarker::None => {
                concrete.push(segment.clone());
                assign(container(node, segment), leaf);
            }
        }
        Ok(())
    }
}

/// Replace a slot, or set the text of an object already living there
fn assign(slot: &mut Node, leaf: Node) {
    match slot {
        Node::Object(object) => object.set_text(leaf.as_scalar().cloned()),
        other => *other = leaf,
    }
}
