// Copyright 2026 Manual Mirror Contributors
// SPDX-License-Identifier: Apache-2.0

//! Table-of-contents tree model.
//!
//! A manual's ToC is a tree whose leaves are remote document references
//! and whose internal nodes are named, ordered sections. Child order is
//! the ToC's document order and drives traversal order.

pub mod artifacts;
pub mod fetch;
pub mod parse;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A node of the ToC tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TocNode {
    /// A remote reference (URL path component) to one document.
    Leaf(String),
    /// A named section with ordered children.
    Section(Children),
}

/// Ordered mapping of child name to node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Children {
    entries: Vec<(String, TocNode)>,
}

impl Children {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a child. An existing child with the same name is replaced
    /// in place, keeping its original position.
    pub fn insert(&mut self, name: impl Into<String>, node: TocNode) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = node,
            None => self.entries.push((name, node)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&TocNode> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Children in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TocNode)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of leaves beneath this mapping.
    pub fn leaf_count(&self) -> usize {
        self.iter().map(|(_, node)| node.leaf_count()).sum()
    }
}

impl<K: Into<String>> FromIterator<(K, TocNode)> for Children {
    fn from_iter<I: IntoIterator<Item = (K, TocNode)>>(iter: I) -> Self {
        let mut children = Children::new();
        for (name, node) in iter {
            children.insert(name, node);
        }
        children
    }
}

impl TocNode {
    pub fn leaf(reference: impl Into<String>) -> Self {
        TocNode::Leaf(reference.into())
    }

    pub fn section<K: Into<String>>(children: impl IntoIterator<Item = (K, TocNode)>) -> Self {
        TocNode::Section(children.into_iter().collect())
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            TocNode::Leaf(_) => 1,
            TocNode::Section(children) => children.leaf_count(),
        }
    }
}

impl Serialize for TocNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TocNode::Leaf(reference) => serializer.serialize_str(reference),
            TocNode::Section(children) => children.serialize(serializer),
        }
    }
}

impl Serialize for Children {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, node) in self.iter() {
            map.serialize_entry(name, node)?;
        }
        map.end()
    }
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = TocNode;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a document reference string or a map of sections")
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<TocNode, E> {
        Ok(TocNode::Leaf(v.to_string()))
    }

    fn visit_string<E: serde::de::Error>(self, v: String) -> Result<TocNode, E> {
        Ok(TocNode::Leaf(v))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<TocNode, A::Error> {
        let mut children = Children::new();
        while let Some((name, node)) = map.next_entry::<String, TocNode>()? {
            children.insert(name, node);
        }
        Ok(TocNode::Section(children))
    }
}

impl<'de> Deserialize<'de> for TocNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NodeVisitor)
    }
}

impl<'de> Deserialize<'de> for Children {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match TocNode::deserialize(deserializer)? {
            TocNode::Section(children) => Ok(children),
            TocNode::Leaf(_) => Err(serde::de::Error::custom(
                "expected a map of sections at the ToC root",
            )),
        }
    }
}

/// Identifies one manual on the content service, written `KIND/ID`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualRef {
    pub kind: String,
    pub id: String,
}

impl fmt::Display for ManualRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

impl FromStr for ManualRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| format!("expected KIND/ID, got {s:?}"))?;
        if kind.is_empty() || id.is_empty() || id.contains('/') {
            return Err(format!("expected KIND/ID, got {s:?}"));
        }
        Ok(ManualRef {
            kind: kind.to_string(),
            id: id.to_string(),
        })
    }
}
