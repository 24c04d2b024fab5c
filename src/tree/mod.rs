// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Category tree
//!
//! A tree is an ordered map whose values are either nested maps (branches)
//! or lists of leaf entries. On disk a leaf without change status is a
//! plain JSON array; a leaf carrying status becomes
//! `{"entries": [...], "status": ["UPDATED"]}`.

pub mod builder;
pub mod sort;
pub mod status;
pub mod transform;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::Path;

use crate::manifest::{stem_key, ChangeStatus};
use crate::{OrganizerError, Result};

/// One audio file at some pipeline stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LeafEntry {
    /// Relative path, as written by the organizer
    Path(String),
    /// Enriched by the metadata and transcription passes
    Record(LeafRecord),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafRecord {
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voiceline_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
}

impl LeafRecord {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            date: None,
            voiceline_id: None,
            transcription: None,
        }
    }
}

impl LeafEntry {
    /// Path or filename identifying the entry
    pub fn identifier(&self) -> &str {
        match self {
            Self::Path(path) => path,
            Self::Record(record) => &record.filename,
        }
    }

    /// Final path component
    pub fn file_name(&self) -> &str {
        let id = self.identifier();
        id.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(id)
    }

    /// Lowercase file name up to its first dot
    pub fn stem_key(&self) -> String {
        stem_key(self.identifier())
    }

    pub fn as_record(&self) -> Option<&LeafRecord> {
        match self {
            Self::Record(record) => Some(record),
            Self::Path(_) => None,
        }
    }
}

/// Leaf list plus the change statuses observed for its files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeafGroup {
    pub entries: Vec<LeafEntry>,
    /// Unique, in first-seen order
    pub status: Vec<ChangeStatus>,
}

impl LeafGroup {
    pub fn new(entries: Vec<LeafEntry>) -> Self {
        Self {
            entries,
            status: Vec::new(),
        }
    }

    /// Record a status once
    pub fn add_status(&mut self, status: ChangeStatus) -> bool {
        if self.status.contains(&status) {
            return false;
        }
        self.status.push(status);
        true
    }
}

#[derive(Serialize)]
struct GroupOut<'a> {
    entries: &'a [LeafEntry],
    status: &'a [ChangeStatus],
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct GroupIn {
    entries: Vec<LeafEntry>,
    #[serde(default)]
    status: Vec<ChangeStatus>,
}

impl Serialize for LeafGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if self.status.is_empty() {
            self.entries.serialize(serializer)
        } else {
            GroupOut {
                entries: &self.entries,
                status: &self.status,
            }
            .serialize(serializer)
        }
    }
}

/// A tree value: nested categories or a leaf list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    Branch(IndexMap<String, TreeNode>),
    Leaf(LeafGroup),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NodeIn {
    List(Vec<LeafEntry>),
    Group(GroupIn),
    Branch(IndexMap<String, TreeNode>),
}

impl Serialize for TreeNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Branch(children) => children.serialize(serializer),
            Self::Leaf(group) => group.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for TreeNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(match NodeIn::deserialize(deserializer)? {
            NodeIn::List(entries) => Self::Leaf(LeafGroup::new(entries)),
            NodeIn::Group(group) => Self::Leaf(LeafGroup {
                entries: group.entries,
                status: group.status,
            }),
            NodeIn::Branch(children) => Self::Branch(children),
        })
    }
}

impl TreeNode {
    pub fn branch() -> Self {
        Self::Branch(IndexMap::new())
    }

    pub fn leaf() -> Self {
        Self::Leaf(LeafGroup::default())
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    /// Number of leaf entries below this node
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf(group) => group.entries.len(),
            Self::Branch(children) => children.values().map(TreeNode::leaf_count).sum(),
        }
    }
}

/// Root of a category tree: speaker -> subject -> topic ...
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryTree {
    root: IndexMap<String, TreeNode>,
}

impl CategoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_root(root: IndexMap<String, TreeNode>) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &IndexMap<String, TreeNode> {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut IndexMap<String, TreeNode> {
        &mut self.root
    }

    pub fn into_root(self) -> IndexMap<String, TreeNode> {
        self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn leaf_count(&self) -> usize {
        self.root.values().map(TreeNode::leaf_count).sum()
    }

    /// Read a tree written by any pipeline stage
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| OrganizerError::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| {
            OrganizerError::Config(format!("Failed to parse tree {}: {}", path.display(), e))
        })
    }

    /// Write the tree as pretty-printed JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| OrganizerError::io(parent, e))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| OrganizerError::io(path, e))?;
        Ok(())
    }
}
