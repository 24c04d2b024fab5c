// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Stage one: classify a corpus and build the sorted category tree

use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

use crate::classify::Classifier;
use crate::config::OrganizeConfig;
use crate::phase_log::PhaseLog;
use crate::scan::{scan_audio_files, AudioFile};
use crate::tree::builder::{self, PINGS_KEY};
use crate::tree::sort::TopicSorter;
use crate::tree::{CategoryTree, LeafEntry};
use crate::Result;

/// Counts and name lists describing one organizer run
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrganizeReport {
    pub processed: usize,
    pub placed: usize,
    pub disregarded: usize,
    pub excluded_pings: usize,
    /// Leaves written, mirrors included
    pub leaves_written: usize,
    pub unknown_speakers: BTreeSet<String>,
    pub unknown_subjects: BTreeSet<String>,
    pub topics: BTreeSet<String>,
}

impl OrganizeReport {
    /// Share of processed files that were placed in the tree
    pub fn coverage(&self) -> f64 {
        if self.processed == 0 {
            return 0.0;
        }
        self.placed as f64 / self.processed as f64
    }
}

/// Tree, report and the diagnostics of both phases
#[derive(Debug)]
pub struct Organized {
    pub tree: CategoryTree,
    pub report: OrganizeReport,
    pub classification_log: PhaseLog,
    pub sorting_log: PhaseLog,
}

pub struct Organizer<'a> {
    classifier: &'a Classifier,
    config: &'a OrganizeConfig,
}

impl<'a> Organizer<'a> {
    pub fn new(classifier: &'a Classifier, config: &'a OrganizeConfig) -> Self {
        Self { classifier, config }
    }

    /// Scan `root` and organize every audio file found
    pub fn organize_dir(&self, root: &Path) -> Result<Organized> {
        let files = scan_audio_files(root, &self.config.audio_extensions)?;
        info!("Found {} audio files in {:?}", files.len(), root);
        Ok(self.organize_files(&files))
    }

    pub fn organize_files(&self, files: &[AudioFile]) -> Organized {
        let mut tree = CategoryTree::new();
        let mut report = OrganizeReport::default();
        let mut log = PhaseLog::new("classification");

        for file in files {
            report.processed += 1;
            let record = self.classifier.classify(&file.relative, &mut log);

            if !record.speaker_resolved {
                report.unknown_speakers.insert(record.speaker.clone());
                if self.config.disregard_unknown_speakers {
                    log.push(format!("Disregarded speaker '{}' in {}", record.speaker, file.relative));
                    report.disregarded += 1;
                    continue;
                }
            }
            if !record.subject_resolved {
                report.unknown_subjects.insert(record.subject.clone());
                if self.config.disregard_unknown_subjects {
                    log.push(format!("Disregarded subject '{}' in {}", record.subject, file.relative));
                    report.disregarded += 1;
                    continue;
                }
            }
            if record.is_ping && self.config.exclude_regular_pings {
                report.excluded_pings += 1;
                continue;
            }

            report
                .topics
                .extend(builder::placement(&record).into_iter().skip(2).filter(|k| k != PINGS_KEY));
            report.leaves_written +=
                builder::insert(&mut tree, &record, LeafEntry::Path(file.relative.clone()), &mut log);
            report.placed += 1;
        }

        let mut sorting_log = PhaseLog::new("sorting");
        self.sorter().sort_tree(&mut tree, &mut sorting_log);

        info!(
            "Processed {} files: {} placed, {} disregarded, {} pings excluded",
            report.processed, report.placed, report.disregarded, report.excluded_pings
        );

        Organized {
            tree,
            report,
            classification_log: log,
            sorting_log,
        }
    }

    fn sorter(&self) -> TopicSorter {
        TopicSorter::new(
            self.config.self_priority.clone(),
            self.classifier.vocabulary().category_names().map(String::from).collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::AliasTable;
    use crate::classify::rules::RuleSet;
    use crate::classify::vocabulary::Vocabulary;
    use crate::tree::TreeNode;
    use tempfile::TempDir;

    fn classifier() -> Classifier {
        let speakers = AliasTable::from_entries([
            ("Lash", vec!["lash"]),
            ("Atlas", vec!["atlas"]),
            ("Bebop", vec!["bebop"]),
        ])
        .unwrap();
        Classifier::new(speakers, AliasTable::default(), RuleSet::builtin(), Vocabulary::default())
    }

    fn files(names: &[&str]) -> Vec<AudioFile> {
        names
            .iter()
            .map(|n| AudioFile {
                path: n.into(),
                relative: n.to_string(),
            })
            .collect()
    }

    fn self_keys(tree: &CategoryTree, speaker: &str) -> Vec<String> {
        let TreeNode::Branch(subjects) = &tree.root()[speaker] else {
            panic!("speaker should be a branch");
        };
        let TreeNode::Branch(topics) = &subjects["Self"] else {
            panic!("Self should be a branch");
        };
        topics.keys().cloned().collect()
    }

    #[test]
    fn test_organize_builds_sorted_tree() {
        let c = classifier();
        let config = OrganizeConfig::default();
        let out = Organizer::new(&c, &config).organize_files(&files(&[
            "lash/lash_ping_need_heal_01.mp3",
            "lash/lash_angry_01.mp3",
            "lash/lash_random_thing_here.mp3",
            "lash/lash_ping_post_game_01.mp3",
            "lash/lash_select_01.mp3",
            "lash/lash_interrupt_atlas_01.mp3",
            "stranger/stranger_select_01.mp3",
        ]));

        assert_eq!(out.report.processed, 7);
        assert_eq!(out.report.placed, 6);
        assert_eq!(out.report.disregarded, 1);
        assert!(out.report.unknown_speakers.contains("stranger"));
        assert!(out.report.topics.contains("Combat"));
        assert!(!out.report.topics.contains("Pings"));

        assert_eq!(
            self_keys(&out.tree, "Lash"),
            vec!["Select", "Post game", "Emotions", "Pings"]
        );
        assert!(!out.classification_log.is_empty());
        assert!(!out.sorting_log.is_empty());
    }

    #[test]
    fn test_exclude_regular_pings_keeps_pre_game_lines() {
        let c = classifier();
        let config = OrganizeConfig {
            exclude_regular_pings: true,
            ..OrganizeConfig::default()
        };
        let out = Organizer::new(&c, &config).organize_files(&files(&[
            "bebop/bebop_ping_take_mid_01.mp3",
            "bebop/bebop_ping_pre_game_01.mp3",
        ]));

        assert_eq!(out.report.excluded_pings, 1);
        assert_eq!(self_keys(&out.tree, "Bebop"), vec!["Pre game"]);
    }

    #[test]
    fn test_unknown_speakers_kept_when_allowed() {
        let c = classifier();
        let config = OrganizeConfig {
            disregard_unknown_speakers: false,
            ..OrganizeConfig::default()
        };
        let out = Organizer::new(&c, &config).organize_files(&files(&["stranger/stranger_select_01.mp3"]));
        assert_eq!(out.report.placed, 1);
        assert!(out.tree.root().contains_key("stranger"));
        assert!((out.report.coverage() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_organize_dir_scans_source() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("lash")).unwrap();
        std::fs::write(temp.path().join("lash/lash_select_01.mp3"), b"").unwrap();

        let c = classifier();
        let config = OrganizeConfig::default();
        let out = Organizer::new(&c, &config).organize_dir(temp.path()).unwrap();
        assert_eq!(out.tree.leaf_count(), 1);
        assert_eq!(
            serde_json::to_value(&out.tree).unwrap()["Lash"]["Self"]["Select"][0],
            "lash/lash_select_01.mp3"
        );
    }
}
