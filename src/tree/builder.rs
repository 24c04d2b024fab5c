// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Inserting classified voice lines into a category tree

use indexmap::IndexMap;

use super::{CategoryTree, LeafEntry, TreeNode};
use crate::classify::Classification;
use crate::phase_log::PhaseLog;

/// Key grouping ping lines under a subject
pub const PINGS_KEY: &str = "Pings";

/// Key of the speaker's self-referential subject
pub const SELF_KEY: &str = "Self";

/// Primary path of a record: speaker, subject, then `Pings`, the special
/// category and the topic where they apply
pub fn placement(record: &Classification) -> Vec<String> {
    let mut path = vec![record.speaker.clone(), record.subject_display()];
    path.extend(topic_path(record));
    path
}

/// Additional path under `Self > Pings` for pings a speaker makes about
/// themselves by name. Pings whose subject is already `self` are stored
/// there directly and are not mirrored.
pub fn mirror_placement(record: &Classification) -> Option<Vec<String>> {
    if !record.is_ping || record.is_self() || !record.subject.eq_ignore_ascii_case(&record.speaker) {
        return None;
    }
    let mut path = vec![record.speaker.clone(), SELF_KEY.to_string()];
    path.extend(topic_path(record));
    Some(path)
}

fn topic_path(record: &Classification) -> Vec<String> {
    let mut path = Vec::with_capacity(3);
    if record.is_ping {
        path.push(PINGS_KEY.to_string());
    }
    if let Some(category) = &record.category {
        path.push(category.clone());
    }
    path.push(record.topic_display());
    path
}

/// Append `entry` at the record's placement, and at its mirror if any.
///
/// Duplicate records append duplicate leaves. Returns the number of leaves
/// written.
pub fn insert(tree: &mut CategoryTree, record: &Classification, entry: LeafEntry, log: &mut PhaseLog) -> usize {
    insert_at(tree.root_mut(), &placement(record), entry.clone(), log);
    match mirror_placement(record) {
        Some(mirror) => {
            insert_at(tree.root_mut(), &mirror, entry, log);
            2
        }
        None => 1,
    }
}

/// Walk or create branches along `path` and append to the leaf at its end.
///
/// A key already holding the other node kind is never merged; the value is
/// placed under the sibling key `"<key> (more)"` instead.
pub fn insert_at(
    root: &mut IndexMap<String, TreeNode>,
    path: &[String],
    entry: LeafEntry,
    log: &mut PhaseLog,
) {
    let Some((last, branches)) = path.split_last() else {
        return;
    };

    let mut level = root;
    for key in branches {
        let key = free_key(level, key, false, log);
        let TreeNode::Branch(children) = level.entry(key).or_insert_with(TreeNode::branch) else {
            return;
        };
        level = children;
    }

    let key = free_key(level, last, true, log);
    if let TreeNode::Leaf(group) = level.entry(key).or_insert_with(TreeNode::leaf) {
        group.entries.push(entry);
    }
}

/// `key` if it is absent or already the wanted kind, otherwise the first
/// `(more)` sibling that is
fn free_key(level: &IndexMap<String, TreeNode>, key: &str, want_leaf: bool, log: &mut PhaseLog) -> String {
    let mut candidate = key.to_string();
    while let Some(node) = level.get(&candidate) {
        if node.is_leaf() == want_leaf {
            break;
        }
        let next = format!("{} (more)", candidate);
        log.push(format!(
            "'{}' already holds a {}; using '{}'",
            candidate,
            if node.is_leaf() { "leaf list" } else { "branch" },
            next
        ));
        candidate = next;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::SELF_SUBJECT;

    fn record(speaker: &str, subject: &str, topic: &str, is_ping: bool, category: Option<&str>) -> Classification {
        Classification {
            speaker: speaker.to_string(),
            subject: subject.to_string(),
            relationship: None,
            topic: topic.to_string(),
            variation: None,
            is_ping,
            category: category.map(String::from),
            route: "test".to_string(),
            speaker_resolved: true,
            subject_resolved: true,
        }
    }

    fn path(entry: &str) -> LeafEntry {
        LeafEntry::Path(entry.to_string())
    }

    fn leaf<'a>(tree: &'a CategoryTree, keys: &[&str]) -> Option<&'a [LeafEntry]> {
        let mut level = tree.root();
        let (last, branches) = keys.split_last()?;
        for key in branches {
            match level.get(*key)? {
                TreeNode::Branch(children) => level = children,
                TreeNode::Leaf(_) => return None,
            }
        }
        match level.get(*last)? {
            TreeNode::Leaf(group) => Some(&group.entries),
            TreeNode::Branch(_) => None,
        }
    }

    #[test]
    fn test_placement_paths() {
        let mut r = record("Lash", "Atlas", "interrupt", false, Some("Combat"));
        r.relationship = Some("enemy".to_string());
        assert_eq!(placement(&r), vec!["Lash", "Atlas (enemy)", "Combat", "Interrupt"]);

        let p = record("Bebop", SELF_SUBJECT, "need heal", true, Some("Requests and Alerts"));
        assert_eq!(placement(&p), vec!["Bebop", "Self", "Pings", "Requests and Alerts", "Need heal"]);
        assert!(mirror_placement(&p).is_none());
    }

    #[test]
    fn test_ping_about_self_by_name_is_mirrored() {
        let mut tree = CategoryTree::new();
        let mut log = PhaseLog::new("build");
        let r = record("Bebop", "Bebop", "general", true, None);

        assert_eq!(insert(&mut tree, &r, path("bebop/bebop_ping_bebop.mp3"), &mut log), 2);
        assert_eq!(leaf(&tree, &["Bebop", "Bebop", "Pings", "General"]).unwrap().len(), 1);
        assert_eq!(leaf(&tree, &["Bebop", "Self", "Pings", "General"]).unwrap().len(), 1);

        let TreeNode::Branch(subjects) = &tree.root()["Bebop"] else {
            panic!("speaker should be a branch");
        };
        assert_eq!(subjects.keys().collect::<Vec<_>>(), vec!["Bebop", "Self"]);
    }

    #[test]
    fn test_duplicates_are_appended() {
        let mut tree = CategoryTree::new();
        let mut log = PhaseLog::new("build");
        let r = record("Lash", SELF_SUBJECT, "select", false, None);

        insert(&mut tree, &r, path("lash_select_01.mp3"), &mut log);
        insert(&mut tree, &r, path("lash_select_01.mp3"), &mut log);
        assert_eq!(leaf(&tree, &["Lash", "Self", "Select"]).unwrap().len(), 2);
    }

    #[test]
    fn test_kind_conflict_uses_sibling_key() {
        let mut tree = CategoryTree::new();
        let mut log = PhaseLog::new("build");

        // A topic literally named like a category
        insert(&mut tree, &record("Lash", SELF_SUBJECT, "combat", false, None), path("a.mp3"), &mut log);
        insert(
            &mut tree,
            &record("Lash", SELF_SUBJECT, "parry", false, Some("Combat")),
            path("b.mp3"),
            &mut log,
        );

        assert_eq!(leaf(&tree, &["Lash", "Self", "Combat"]).unwrap().len(), 1);
        assert_eq!(leaf(&tree, &["Lash", "Self", "Combat (more)", "Parry"]).unwrap().len(), 1);
        assert_eq!(log.len(), 1);
    }
}
