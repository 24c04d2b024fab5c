// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use libfuzzer_sys::fuzz_target;
use voiceline_organizer::tree::transform::{flatten, transform};
use voiceline_organizer::tree::CategoryTree;

fuzz_target!(|data: &[u8]| {
    let Ok(tree) = serde_json::from_slice::<CategoryTree>(data) else {
        return;
    };
    let before = flatten(&tree).len();
    let after = transform(tree.clone(), |entry| entry);
    assert_eq!(flatten(&after).len(), before);
    assert_eq!(
        serde_json::to_value(&after).ok(),
        serde_json::to_value(&tree).ok()
    );
});
