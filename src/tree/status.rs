// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Attaching release change status to leaf groups

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use super::transform::for_each_group;
use super::CategoryTree;
use crate::manifest::StatusRecord;

/// Outcome of applying an overlay
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OverlayReport {
    /// Groups that gained at least one status
    pub groups_updated: usize,
    /// Overlay records that matched some leaf
    pub matched: usize,
    /// Paths of overlay records that matched nothing
    pub unmatched: Vec<String>,
}

/// Match overlay records to leaves by lowercase file stem and attach their
/// statuses to the enclosing groups, unique and in overlay order
pub fn apply_overlay(tree: &mut CategoryTree, records: &[StatusRecord]) -> OverlayReport {
    let mut by_stem: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, record) in records.iter().enumerate() {
        by_stem.entry(record.stem_key()).or_default().push(idx);
    }

    let mut used = BTreeSet::new();
    let mut report = OverlayReport::default();

    for_each_group(tree, |path, group| {
        let mut hits: Vec<usize> = group
            .entries
            .iter()
            .filter_map(|entry| by_stem.get(&entry.stem_key()))
            .flatten()
            .copied()
            .collect();
        if hits.is_empty() {
            return;
        }
        hits.sort_unstable();
        hits.dedup();

        let mut changed = false;
        for idx in hits {
            used.insert(idx);
            changed |= group.add_status(records[idx].status);
        }
        if changed {
            report.groups_updated += 1;
            debug!("{} -> {:?}", path.join(" > "), group.status);
        }
    });

    report.matched = used.len();
    report.unmatched = records
        .iter()
        .enumerate()
        .filter(|(idx, _)| !used.contains(idx))
        .map(|(_, record)| record.path.clone())
        .collect();
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{parse_status_overlay, ChangeStatus};
    use crate::tree::{TreeNode, LeafEntry};

    fn tree() -> CategoryTree {
        serde_json::from_str(
            r#"{
                "Mirage": {
                    "Self": {
                        "Pings": { "X": ["mirage/ping/x.ogg", "mirage/ping/y.ogg"] },
                        "Select": [{"filename": "mirage_select_01.mp3", "date": "2025-05-01"}]
                    }
                }
            }"#,
        )
        .unwrap()
    }

    fn group_status<'a>(tree: &'a CategoryTree, keys: &[&str]) -> &'a [ChangeStatus] {
        let mut node = &tree.root()[keys[0]];
        for key in &keys[1..] {
            let TreeNode::Branch(children) = node else {
                panic!("expected a branch at {}", key);
            };
            node = &children[*key];
        }
        let TreeNode::Leaf(group) = node else {
            panic!("expected a leaf");
        };
        &group.status
    }

    #[test]
    fn test_statuses_are_unique_and_in_overlay_order() {
        let mut t = tree();
        let records = parse_status_overlay(
            "sounds/vo/mirage/ping/x.vsnd_c CRC:001380b678 size:20293 UPDATED\n\
             sounds/vo/mirage/ping/y.vsnd_c CRC:00aa size:10 ADDED\n\
             sounds/vo/mirage/ping/x.vsnd_c CRC:001380b678 size:20293 UPDATED\n",
        );

        let report = apply_overlay(&mut t, &records);
        assert_eq!(
            group_status(&t, &["Mirage", "Self", "Pings", "X"]),
            &[ChangeStatus::Updated, ChangeStatus::Added]
        );
        assert_eq!(report.groups_updated, 1);
        assert_eq!(report.matched, 3);
        assert!(report.unmatched.is_empty());
    }

    #[test]
    fn test_single_overlay_line() {
        let mut t = tree();
        let records = parse_status_overlay("sounds/vo/mirage/ping/x.vsnd_c CRC:001380b678 size:20293 UPDATED");
        apply_overlay(&mut t, &records);
        assert_eq!(group_status(&t, &["Mirage", "Self", "Pings", "X"]), &[ChangeStatus::Updated]);

        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["Mirage"]["Self"]["Pings"]["X"]["status"], serde_json::json!(["UPDATED"]));
        assert!(json["Mirage"]["Self"]["Select"].is_array());
    }

    #[test]
    fn test_matches_enriched_records_and_reports_misses() {
        let mut t = tree();
        let records = parse_status_overlay(
            "sounds/vo/mirage/MIRAGE_SELECT_01.vsnd_c CRC:01 ADDED\n\
             sounds/vo/lash/lash_select_01.vsnd_c CRC:02 ADDED\n",
        );
        let report = apply_overlay(&mut t, &records);

        assert_eq!(group_status(&t, &["Mirage", "Self", "Select"]), &[ChangeStatus::Added]);
        assert_eq!(report.matched, 1);
        assert_eq!(report.unmatched, vec!["sounds/vo/lash/lash_select_01.vsnd_c"]);
        assert_eq!(LeafEntry::Path("A/B.c.d".to_string()).stem_key(), "b");
    }
}
