// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Shape-preserving rewrites of every leaf entry

use super::{CategoryTree, LeafEntry, LeafGroup, TreeNode};

/// Rebuild `tree` with `leaf_fn` applied to each entry.
///
/// Every branch key survives in order, including branches with no
/// entries, and each leaf keeps its length and status. `leaf_fn` must
/// return the entry it was given when it has nothing to add.
pub fn transform<F>(tree: CategoryTree, mut leaf_fn: F) -> CategoryTree
where
    F: FnMut(LeafEntry) -> LeafEntry,
{
    let root = tree
        .into_root()
        .into_iter()
        .map(|(key, node)| (key, transform_node(node, &mut leaf_fn)))
        .collect();
    CategoryTree::from_root(root)
}

fn transform_node<F>(node: TreeNode, leaf_fn: &mut F) -> TreeNode
where
    F: FnMut(LeafEntry) -> LeafEntry,
{
    match node {
        TreeNode::Branch(children) => TreeNode::Branch(
            children
                .into_iter()
                .map(|(key, child)| (key, transform_node(child, leaf_fn)))
                .collect(),
        ),
        TreeNode::Leaf(group) => TreeNode::Leaf(LeafGroup {
            entries: group.entries.into_iter().map(&mut *leaf_fn).collect(),
            status: group.status,
        }),
    }
}

/// Every leaf entry in document order
pub fn flatten(tree: &CategoryTree) -> Vec<&LeafEntry> {
    let mut out = Vec::with_capacity(tree.leaf_count());
    for node in tree.root().values() {
        collect(node, &mut out);
    }
    out
}

fn collect<'a>(node: &'a TreeNode, out: &mut Vec<&'a LeafEntry>) {
    match node {
        TreeNode::Branch(children) => children.values().for_each(|child| collect(child, out)),
        TreeNode::Leaf(group) => out.extend(group.entries.iter()),
    }
}

/// Visit every leaf group mutably, with the keys leading to it
pub fn for_each_group<F>(tree: &mut CategoryTree, mut visit: F)
where
    F: FnMut(&[&str], &mut LeafGroup),
{
    let mut path = Vec::new();
    for (key, node) in tree.root_mut() {
        walk_groups(key, node, &mut path, &mut visit);
    }
}

fn walk_groups<'a, F>(key: &'a str, node: &'a mut TreeNode, path: &mut Vec<&'a str>, visit: &mut F)
where
    F: FnMut(&[&str], &mut LeafGroup),
{
    path.push(key);
    match node {
        TreeNode::Branch(children) => {
            for (child_key, child) in children.iter_mut() {
                walk_groups(child_key, child, path, visit);
            }
        }
        TreeNode::Leaf(group) => visit(path, group),
    }
    path.pop();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ChangeStatus;
    use crate::tree::LeafRecord;

    const TREE: &str = r#"{
        "Mirage": {
            "Self": {
                "Select": ["mirage/mirage_select_01.mp3", "mirage/mirage_select_02.mp3"],
                "Pings": {
                    "Objective Commands": { "Take mid": ["mirage/mirage_ping_take_mid.mp3"] }
                },
                "Unused": {}
            },
            "Haze (enemy)": {
                "Kill": { "entries": ["mirage/mirage_enemy_haze_kill.mp3"], "status": ["ADDED"] }
            }
        },
        "Empty": {}
    }"#;

    fn sample() -> CategoryTree {
        serde_json::from_str(TREE).unwrap()
    }

    /// Same keys in the same order at every branch, same leaf lengths and status
    fn same_shape(a: &TreeNode, b: &TreeNode) -> bool {
        match (a, b) {
            (TreeNode::Branch(x), TreeNode::Branch(y)) => {
                x.len() == y.len()
                    && x.iter()
                        .zip(y.iter())
                        .all(|((ka, va), (kb, vb))| ka == kb && same_shape(va, vb))
            }
            (TreeNode::Leaf(x), TreeNode::Leaf(y)) => {
                x.entries.len() == y.entries.len() && x.status == y.status
            }
            _ => false,
        }
    }

    fn to_record(entry: LeafEntry) -> LeafEntry {
        let mut record = LeafRecord::new(entry.file_name());
        record.date = Some("2025-05-01".to_string());
        LeafEntry::Record(record)
    }

    #[test]
    fn test_transform_preserves_shape() {
        let before = sample();
        let after = transform(before.clone(), to_record);

        let a = TreeNode::Branch(before.into_root());
        let b = TreeNode::Branch(after.clone().into_root());
        assert!(same_shape(&a, &b));
        assert!(flatten(&after).iter().all(|e| e.as_record().is_some()));
    }

    #[test]
    fn test_transform_never_drops_entries() {
        let before = sample();
        let count = flatten(&before).len();
        assert_eq!(count, 4);

        // Identity for entries without enrichment data
        let after = transform(before, |entry| {
            if entry.file_name().contains("select") {
                to_record(entry)
            } else {
                entry
            }
        });
        assert_eq!(flatten(&after).len(), count);
        assert_eq!(flatten(&after).iter().filter(|e| e.as_record().is_some()).count(), 2);
    }

    #[test]
    fn test_transform_keeps_status() {
        let after = transform(sample(), to_record);
        let json = serde_json::to_value(&after).unwrap();
        assert_eq!(json["Mirage"]["Haze (enemy)"]["Kill"]["status"][0], "ADDED");
        assert_eq!(json["Mirage"]["Self"]["Unused"], serde_json::json!({}));
        assert_eq!(json["Empty"], serde_json::json!({}));
    }

    #[test]
    fn test_for_each_group_reports_paths() {
        let mut tree = sample();
        let mut seen = Vec::new();
        for_each_group(&mut tree, |path, group| {
            seen.push(path.join("/"));
            group.add_status(ChangeStatus::Updated);
        });
        assert_eq!(
            seen,
            vec![
                "Mirage/Self/Select",
                "Mirage/Self/Pings/Objective Commands/Take mid",
                "Mirage/Haze (enemy)/Kill",
            ]
        );
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["Mirage"]["Haze (enemy)"]["Kill"]["status"], serde_json::json!(["ADDED", "UPDATED"]));
    }
}
