// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Filename classification
//!
//! A filename stem is offered to an ordered list of handlers; the first
//! handler that recognizes it produces a [`Draft`] holding raw tokens, which
//! is then finished into a [`Classification`] by suffix normalization and
//! alias resolution. Nothing here fails: a stem no handler accepts becomes
//! a generic self line and a diagnostic is recorded.

mod npc;
pub mod rules;
pub mod suffix;
pub mod vocabulary;

use serde::Serialize;

use crate::alias::AliasTable;
use crate::config::AppConfig;
use crate::phase_log::PhaseLog;
use crate::Result;
use rules::{Field, RuleSet};
use suffix::{capitalize_first, humanize, split_variation, strip_variation};
use vocabulary::Vocabulary;

/// Subject value for lines the speaker says about themselves
pub const SELF_SUBJECT: &str = "self";

/// Topic used when a line names no topic
pub const GENERAL_TOPIC: &str = "general";

/// Structured description of one voice line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub speaker: String,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
    pub topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variation: Option<String>,
    pub is_ping: bool,
    /// Special category tag, looked up from the topic
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Handler or rule that recognized the filename
    pub route: String,
    pub speaker_resolved: bool,
    pub subject_resolved: bool,
}

impl Classification {
    pub fn is_self(&self) -> bool {
        self.subject == SELF_SUBJECT
    }

    /// Key under the speaker node: `Self`, `Subject` or `Subject (relationship)`
    pub fn subject_display(&self) -> String {
        if self.is_self() {
            return "Self".to_string();
        }
        match &self.relationship {
            Some(rel) => format!("{} ({})", self.subject, rel),
            None => self.subject.clone(),
        }
    }

    pub fn topic_display(&self) -> String {
        capitalize_first(&self.topic)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SpeakerToken {
    /// Fixed NPC name, never resolved
    Npc(&'static str),
    Raw(String),
}

/// Raw fields produced by a handler, before normalization
#[derive(Debug, Clone)]
pub(crate) struct Draft {
    speaker: SpeakerToken,
    /// `None` means the speaker talks about themselves
    subject: Option<String>,
    relationship: Option<String>,
    topic: String,
    variation: Option<String>,
    is_ping: bool,
    route: Option<String>,
}

impl Draft {
    fn npc(name: &'static str, topic: &str) -> Self {
        Self::new(SpeakerToken::Npc(name), topic)
    }

    fn speaker(raw: &str, topic: &str) -> Self {
        Self::new(SpeakerToken::Raw(raw.to_string()), topic)
    }

    fn new(speaker: SpeakerToken, topic: &str) -> Self {
        Self {
            speaker,
            subject: None,
            relationship: None,
            topic: topic.to_string(),
            variation: None,
            is_ping: false,
            route: None,
        }
    }

    fn with_subject(mut self, subject: String) -> Self {
        self.subject = Some(subject);
        self
    }

    fn with_variation(mut self, variation: Option<&str>) -> Self {
        self.variation = variation.map(String::from);
        self
    }

    fn ping(mut self) -> Self {
        self.is_ping = true;
        self
    }
}

type Handler = fn(&Classifier, &str) -> Option<Draft>;

/// Evaluated in order, first match wins
const HANDLERS: &[(&str, Handler)] = &[
    ("spirit_jar", npc::spirit_jar),
    ("newscaster", npc::newscaster),
    ("shopkeeper_hotdog", npc::shopkeeper_hotdog),
    ("bespoke_ability_line", npc::bespoke_ability_line),
    ("ping", Classifier::ping),
    ("self_keyword", Classifier::self_keyword),
    ("pattern_rule", Classifier::pattern_rule),
];

/// Filename classifier over one run's immutable tables
#[derive(Debug, Clone)]
pub struct Classifier {
    speakers: AliasTable,
    topics: AliasTable,
    rules: RuleSet,
    vocabulary: Vocabulary,
}

impl Classifier {
    pub fn new(speakers: AliasTable, topics: AliasTable, rules: RuleSet, vocabulary: Vocabulary) -> Self {
        Self {
            speakers,
            topics,
            rules,
            vocabulary,
        }
    }

    /// Load every table named by the configuration
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let speakers = AliasTable::load(&config.tables.aliases)?;
        let topics = AliasTable::load(&config.tables.topic_aliases)?;
        let rules = match &config.tables.pattern_rules {
            Some(path) => RuleSet::load(path)?,
            None => RuleSet::builtin(),
        };
        tracing::debug!(
            "Classifier ready: {} speakers, {} topic aliases, {} rules",
            speakers.len(),
            topics.len(),
            rules.len()
        );
        Ok(Self::new(speakers, topics, rules, Vocabulary::from_config(&config.organize)))
    }

    pub fn speakers(&self) -> &AliasTable {
        &self.speakers
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Classify one filename. Directory components and the extension are
    /// ignored.
    pub fn classify(&self, filename: &str, log: &mut PhaseLog) -> Classification {
        let stem = file_stem(filename).to_lowercase();

        let (route, draft) = HANDLERS
            .iter()
            .find_map(|(name, handler)| handler(self, &stem).map(|draft| (*name, draft)))
            .unwrap_or_else(|| {
                log.push(format!("No pattern matched '{}', using generic fallback", filename));
                ("fallback", fallback(&stem))
            });

        let record = self.finish(draft, route);
        log.push(format!(
            "{} -> [{}] {}/{}/{}{}",
            filename,
            record.route,
            record.speaker,
            record.subject_display(),
            record.topic,
            if record.is_ping { " (ping)" } else { "" }
        ));
        record
    }

    /// `<speaker>_ping_<rest>`
    fn ping(&self, stem: &str) -> Option<Draft> {
        let tokens: Vec<&str> = stem.split('_').collect();
        let marker = tokens.iter().position(|t| *t == "ping")?;
        if marker == 0 {
            return None;
        }
        let speaker = tokens[..marker].join("_");
        let rest = tokens[marker + 1..].join("_");
        let (base, variation) = split_variation(&rest);

        // Pre/post-game lines are ordinary self lines
        if base == "pre_game" || base == "post_game" {
            return Some(Draft::speaker(&speaker, base).with_variation(variation));
        }

        let parts: Vec<&str> = base.split('_').filter(|t| !t.is_empty()).collect();
        let (subject, topic) = self.split_ping_remainder(&parts);
        let mut draft = Draft::speaker(&speaker, &topic).with_variation(variation).ping();
        draft.subject = subject;
        Some(draft)
    }

    /// Locate a hero inside a ping remainder.
    ///
    /// `see_<hero>_<rest>` is checked first, then every trailing segment
    /// longest first, then leading segments longest first.
    fn split_ping_remainder(&self, parts: &[&str]) -> (Option<String>, String) {
        if parts.first() == Some(&"see") && parts.len() > 1 {
            if let Some(m) = self.speakers.resolve_tokens(&parts[1..]) {
                let subject = parts[1..1 + m.tokens].join("_");
                let mut topic = vec!["see"];
                topic.extend_from_slice(&parts[1 + m.tokens..]);
                return (Some(subject), topic.join("_"));
            }
        }

        for start in 0..parts.len() {
            let candidate = parts[start..].join("_");
            if self.speakers.contains(&candidate) {
                return (Some(candidate), parts[..start].join("_"));
            }
        }

        if let Some(m) = self.speakers.resolve_tokens(parts) {
            return (Some(parts[..m.tokens].join("_")), parts[m.tokens..].join("_"));
        }

        (None, parts.join("_"))
    }

    /// `<speaker>_<self keyword>[_<variation>]`
    fn self_keyword(&self, stem: &str) -> Option<Draft> {
        let (speaker, remainder) = self.split_speaker(stem)?;
        let (keyword, variation) = self.vocabulary.match_self_keyword(remainder)?;
        Some(Draft::speaker(speaker, keyword).with_variation(variation))
    }

    fn pattern_rule(&self, stem: &str) -> Option<Draft> {
        let (base, variation) = split_variation(stem);
        let (input, joined_speaker) = self.join_leading_speaker(base);
        let (rule, mut fields) = self.rules.first_match(&input)?;

        let mut speaker = fields.remove(&Field::Speaker)?;
        if let Some((alias, joined)) = joined_speaker {
            if speaker == joined {
                speaker = alias;
            }
        }
        let mut subject = fields.remove(&Field::Subject);
        let mut topic = fields.remove(&Field::Topic);
        if let Some(combined) = fields.remove(&Field::SubjectTopic) {
            let (s, t) = self.split_subject_topic(&combined);
            subject = subject.or(Some(s));
            topic = topic.or(Some(t));
        }

        let mut draft = Draft::speaker(&speaker, topic.as_deref().unwrap_or_default());
        draft.subject = subject.filter(|s| s != SELF_SUBJECT);
        draft.relationship = fields.remove(&Field::Relationship);
        draft.variation = fields
            .remove(&Field::Variation)
            .or_else(|| variation.map(String::from));
        draft.route = Some(format!("rule:{}", rule.name()));
        Some(draft)
    }

    /// Rules see the speaker as a single token, so a leading speaker alias
    /// spanning several tokens is joined up (`lady_geist_ally_x` becomes
    /// `ladygeist_ally_x`). Returns the rule input and `(alias, joined)`.
    fn join_leading_speaker(&self, base: &str) -> (String, Option<(String, String)>) {
        match self.split_speaker(base) {
            Some((speaker, rest)) if speaker.contains('_') => {
                let joined = speaker.replace('_', "");
                (format!("{}_{}", joined, rest), Some((speaker.to_string(), joined)))
            }
            _ => (base.to_string(), None),
        }
    }

    /// Leading alias becomes the subject; without one the first token does
    fn split_subject_topic(&self, combined: &str) -> (String, String) {
        let tokens: Vec<&str> = combined.split('_').filter(|t| !t.is_empty()).collect();
        let n = self
            .speakers
            .resolve_tokens(&tokens)
            .map(|m| m.tokens)
            .unwrap_or(1)
            .min(tokens.len());
        (tokens[..n].join("_"), tokens[n..].join("_"))
    }

    /// Speaker prefix (longest known alias, else the first token) and the
    /// rest of the stem
    fn split_speaker<'a>(&self, stem: &'a str) -> Option<(&'a str, &'a str)> {
        let token_count = stem.split('_').count();
        let n = self
            .speakers
            .resolve_leading(stem)
            .map(|m| m.tokens)
            .filter(|n| *n < token_count)
            .unwrap_or(1);
        let idx = stem.match_indices('_').nth(n - 1)?.0;
        Some((&stem[..idx], &stem[idx + 1..]))
    }

    fn finish(&self, draft: Draft, route: &str) -> Classification {
        let (speaker, speaker_resolved) = match draft.speaker {
            SpeakerToken::Npc(name) => (name.to_string(), true),
            SpeakerToken::Raw(raw) => match self.speakers.resolve(&raw) {
                Some(canonical) => (canonical.to_string(), true),
                None => (raw, false),
            },
        };

        let (subject, subject_resolved) = match draft.subject {
            None => (SELF_SUBJECT.to_string(), true),
            Some(raw) => self.resolve_subject(&raw),
        };

        let key = normalize_key(&draft.topic);
        let topic = match self.topics.resolve(&key) {
            Some(canonical) => canonical.to_string(),
            None => humanize(&key),
        };
        let category = self
            .vocabulary
            .category_for(&key, draft.is_ping)
            .map(String::from);

        Classification {
            speaker,
            subject,
            relationship: draft.relationship,
            topic,
            variation: draft.variation,
            is_ping: draft.is_ping,
            category,
            route: draft.route.unwrap_or_else(|| route.to_string()),
            speaker_resolved,
            subject_resolved,
        }
    }

    /// Exact alias, then longest leading alias; unknown subjects pass through
    fn resolve_subject(&self, raw: &str) -> (String, bool) {
        let key = normalize_key(raw);
        if key.is_empty() || key == SELF_SUBJECT {
            return (SELF_SUBJECT.to_string(), true);
        }
        if let Some(canonical) = self.speakers.resolve(&key) {
            return (canonical.to_string(), true);
        }
        if let Some(m) = self.speakers.resolve_leading(&key) {
            return (m.canonical.to_string(), true);
        }
        (key, false)
    }
}

/// `<speaker>_<rest>` as a self line about `rest`
fn fallback(stem: &str) -> Draft {
    let (base, variation) = split_variation(stem);
    let draft = match base.split_once('_') {
        Some((speaker, rest)) => Draft::speaker(speaker, rest),
        None => Draft::speaker(base, ""),
    };
    draft.with_variation(variation)
}

/// Variation-free, lowercase, underscore-joined key; empty becomes `general`
fn normalize_key(raw: &str) -> String {
    let joined = raw
        .split(|c: char| c == '_' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase();
    let key = strip_variation(&joined);
    if key.is_empty() {
        GENERAL_TOPIC.to_string()
    } else {
        key.to_string()
    }
}

/// Final path component without its extension
fn file_stem(filename: &str) -> &str {
    let name = filename
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(filename);
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}
