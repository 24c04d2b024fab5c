// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Ordering of the topics under each speaker's `Self` node

use indexmap::IndexMap;

use super::builder::{PINGS_KEY, SELF_KEY};
use super::{CategoryTree, TreeNode};
use crate::phase_log::PhaseLog;

/// Priority and special-category ordering for `Self` children
#[derive(Debug, Clone, Default)]
pub struct TopicSorter {
    priority: Vec<String>,
    trailing: Vec<String>,
}

impl TopicSorter {
    /// `priority` keys lead in list order; `trailing` keys (special
    /// categories) follow the ordinary topics in list order, then `Pings`
    pub fn new(priority: Vec<String>, trailing: Vec<String>) -> Self {
        Self { priority, trailing }
    }

    /// Ordered keys for one `Self` mapping
    pub fn order<'a>(&self, keys: impl IntoIterator<Item = &'a str>, log: &mut PhaseLog) -> Vec<&'a str> {
        let keys: Vec<&str> = keys.into_iter().collect();
        log.push(format!("Topics before sorting: {:?}", keys));

        let mut ordered: Vec<&str> = Vec::with_capacity(keys.len());
        for wanted in &self.priority {
            if let Some(key) = keys.iter().find(|k| **k == wanted.as_str()) {
                ordered.push(*key);
            }
        }
        ordered.extend(
            keys.iter()
                .copied()
                .filter(|k| *k != PINGS_KEY && !self.is_priority(k) && !self.is_trailing(k)),
        );
        for wanted in &self.trailing {
            if let Some(key) = keys.iter().find(|k| **k == wanted.as_str() && !self.is_priority(k)) {
                ordered.push(*key);
            }
        }
        if keys.contains(&PINGS_KEY) {
            ordered.push(PINGS_KEY);
        }

        log.push(format!("Topics after sorting: {:?}", ordered));
        ordered
    }

    /// Reorder the children of every speaker's `Self` node in place
    pub fn sort_tree(&self, tree: &mut CategoryTree, log: &mut PhaseLog) {
        for (speaker, node) in tree.root_mut() {
            let TreeNode::Branch(subjects) = node else {
                continue;
            };
            if let Some(TreeNode::Branch(topics)) = subjects.get_mut(SELF_KEY) {
                log.push(format!("Sorting Self topics of '{}'", speaker));
                *topics = self.sorted(std::mem::take(topics), log);
            }
        }
    }

    fn sorted(&self, mut topics: IndexMap<String, TreeNode>, log: &mut PhaseLog) -> IndexMap<String, TreeNode> {
        let order: Vec<String> = self
            .order(topics.keys().map(String::as_str), log)
            .into_iter()
            .map(String::from)
            .collect();

        let mut out = IndexMap::with_capacity(topics.len());
        for key in order {
            if let Some(node) = topics.shift_remove(&key) {
                out.insert(key, node);
            }
        }
        out
    }

    fn is_priority(&self, key: &str) -> bool {
        self.priority.iter().any(|p| p == key)
    }

    fn is_trailing(&self, key: &str) -> bool {
        self.trailing.iter().any(|t| t == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{LeafEntry, LeafGroup};

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn sorter() -> TopicSorter {
        TopicSorter::new(
            strings(&["Select", "Unselect", "Pre game", "Post game"]),
            strings(&["Killstreaks", "Emotions", "Combat"]),
        )
    }

    #[test]
    fn test_priority_then_insertion_then_pings() {
        let mut log = PhaseLog::new("sorting");
        let order = sorter().order(["Pings", "Post game", "Select", "Random"], &mut log);
        assert_eq!(order, vec!["Select", "Post game", "Random", "Pings"]);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_unlisted_keys_keep_insertion_order() {
        let mut log = PhaseLog::new("sorting");
        let order = sorter().order(["Zeta", "Combat", "Alpha", "Emotions", "Unselect"], &mut log);
        assert_eq!(order, vec!["Unselect", "Zeta", "Alpha", "Emotions", "Combat"]);
    }

    #[test]
    fn test_sort_tree_touches_only_self_nodes() {
        let leaf = || TreeNode::Leaf(LeafGroup::new(vec![LeafEntry::Path("x.mp3".to_string())]));

        let mut self_topics = IndexMap::new();
        self_topics.insert("Pings".to_string(), TreeNode::branch());
        self_topics.insert("Random".to_string(), leaf());
        self_topics.insert("Select".to_string(), leaf());

        let mut other = IndexMap::new();
        other.insert("Pings".to_string(), TreeNode::branch());
        other.insert("Select".to_string(), leaf());

        let mut subjects = IndexMap::new();
        subjects.insert("Haze".to_string(), TreeNode::Branch(other));
        subjects.insert("Self".to_string(), TreeNode::Branch(self_topics));

        let mut root = IndexMap::new();
        root.insert("Lash".to_string(), TreeNode::Branch(subjects));
        let mut tree = CategoryTree::from_root(root);

        sorter().sort_tree(&mut tree, &mut PhaseLog::new("sorting"));

        let TreeNode::Branch(subjects) = &tree.root()["Lash"] else {
            panic!("speaker should be a branch");
        };
        assert_eq!(subjects.keys().collect::<Vec<_>>(), vec!["Haze", "Self"]);
        let TreeNode::Branch(self_topics) = &subjects["Self"] else {
            panic!("Self should be a branch");
        };
        assert_eq!(self_topics.keys().collect::<Vec<_>>(), vec!["Select", "Random", "Pings"]);
        let TreeNode::Branch(other) = &subjects["Haze"] else {
            panic!("Haze should be a branch");
        };
        assert_eq!(other.keys().collect::<Vec<_>>(), vec!["Pings", "Select"]);
    }
}
