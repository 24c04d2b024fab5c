// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Handlers for non-player characters whose filenames do not follow the
//! `<speaker>_<topic>_<subject>` grammar. Each handler owns one prefix.

use super::suffix::split_variation;
use super::{Classifier, Draft};

pub(super) const SPIRIT_JAR: &str = "spirit_jar";
pub(super) const NEWSCASTER: &str = "newscaster";
pub(super) const SHOPKEEPER_HOTDOG: &str = "shopkeeper_hotdog";

/// `spirit_jar_<topic>`: always a self line
pub(super) fn spirit_jar(_: &Classifier, stem: &str) -> Option<Draft> {
    let rest = stem.strip_prefix("spirit_jar_")?;
    let (base, variation) = split_variation(rest);
    Some(Draft::npc(SPIRIT_JAR, base).with_variation(variation))
}

/// `newscaster_headline`, `newscaster_seasonal_headline` and
/// `newscaster_seasonal_<hero>_unlock`. Other forms fall through.
pub(super) fn newscaster(_: &Classifier, stem: &str) -> Option<Draft> {
    let rest = stem.strip_prefix("newscaster_")?;
    let (base, variation) = split_variation(rest);
    let tokens: Vec<&str> = base.split('_').collect();

    let draft = match tokens.as_slice() {
        ["headline", ..] => Draft::npc(NEWSCASTER, "headline"),
        ["seasonal", "headline", ..] => Draft::npc(NEWSCASTER, "seasonal_headline"),
        ["seasonal", hero @ .., "unlock"] if !hero.is_empty() => {
            Draft::npc(NEWSCASTER, "seasonal_unlock").with_subject(hero.join("_"))
        }
        _ => return None,
    };
    Some(draft.with_variation(variation))
}

/// `shopkeeper_hotdog_t4_<hero>_<rest>`, `shopkeeper_hotdog_buy_<item>`,
/// anything else under the prefix is a self line
pub(super) fn shopkeeper_hotdog(classifier: &Classifier, stem: &str) -> Option<Draft> {
    let rest = stem.strip_prefix("shopkeeper_hotdog_")?;
    let (base, variation) = split_variation(rest);
    let tokens: Vec<&str> = base.split('_').collect();

    let draft = match tokens.as_slice() {
        ["t4", after @ ..] if !after.is_empty() => {
            let hero_len = classifier
                .speakers
                .resolve_tokens(after)
                .map(|m| m.tokens)
                .unwrap_or(1);
            let mut topic = vec!["t4"];
            topic.extend_from_slice(&after[hero_len..]);
            Draft::npc(SHOPKEEPER_HOTDOG, &topic.join("_")).with_subject(after[..hero_len].join("_"))
        }
        _ => Draft::npc(SHOPKEEPER_HOTDOG, base),
    };
    Some(draft.with_variation(variation))
}

/// `<speaker>_bespoke_ability_line[_<variation>]` for a known speaker
pub(super) fn bespoke_ability_line(classifier: &Classifier, stem: &str) -> Option<Draft> {
    let (speaker, rest) = classifier.split_speaker(stem)?;
    let tail = rest.strip_prefix("bespoke_ability_line")?;
    if !(tail.is_empty() || tail.starts_with('_')) {
        return None;
    }
    classifier.speakers.resolve(speaker)?;

    let variation = tail.trim_start_matches('_');
    let variation = (!variation.is_empty()).then_some(variation);
    Some(Draft::speaker(speaker, "bespoke_ability_line").with_variation(variation))
}
