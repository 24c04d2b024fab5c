// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use libfuzzer_sys::fuzz_target;
use voiceline_organizer::alias::AliasTable;
use voiceline_organizer::classify::rules::RuleSet;
use voiceline_organizer::classify::vocabulary::Vocabulary;
use voiceline_organizer::classify::Classifier;
use voiceline_organizer::phase_log::PhaseLog;
use voiceline_organizer::tree::builder::insert;
use voiceline_organizer::tree::{CategoryTree, LeafEntry};

fuzz_target!(|name: &str| {
    let Ok(speakers) = AliasTable::from_entries([
        ("Lash", vec!["lash"]),
        ("Lady Geist", vec!["geist", "lady_geist"]),
        ("Kelvin", vec!["kelvin"]),
    ]) else {
        return;
    };
    let classifier = Classifier::new(speakers, AliasTable::default(), RuleSet::builtin(), Vocabulary::default());
    let mut log = PhaseLog::new("classification");

    // Classification is total: every input yields a placeable record
    let record = classifier.classify(name, &mut log);
    assert!(!record.topic.is_empty());

    let mut tree = CategoryTree::new();
    let written = insert(&mut tree, &record, LeafEntry::Path(name.to_string()), &mut log);
    assert!(written >= 1);
    assert_eq!(tree.leaf_count(), written);
});
