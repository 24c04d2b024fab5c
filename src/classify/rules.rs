// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Generic pattern rules
//!
//! A rule is a regular expression plus a map from semantic field to either
//! a capture-group index or a literal value. Rules run against the
//! variation-stripped, lowercased filename stem in table order; the first
//! rule whose expression matches supplies the fields.
//!
//! Rule table format:
//!
//! ```json
//! [
//!   {
//!     "name": "ally/enemy",
//!     "pattern": "^(.+?)_(ally|enemy)_(.+)$",
//!     "fields": { "speaker": 1, "relationship": 2, "subject_topic": 3 }
//!   }
//! ]
//! ```
//!
//! `subject_topic` names a capture holding a subject followed by a topic;
//! the longest leading alias becomes the subject and the rest the topic.
//!
//! A known speaker whose alias spans several tokens reaches the rules as
//! one joined token, so `[^_]+` captures it whole.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::{OrganizerError, Result};

/// Semantic field a rule can fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Speaker,
    Subject,
    Relationship,
    Topic,
    Variation,
    SubjectTopic,
}

/// Where a field's value comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldSource {
    Group(usize),
    Literal(String),
}

/// Serialized form of a rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternRuleSpec {
    #[serde(default)]
    pub name: Option<String>,
    pub pattern: String,
    pub fields: IndexMap<Field, FieldSource>,
}

/// A compiled rule
#[derive(Debug, Clone)]
pub struct PatternRule {
    name: String,
    regex: Regex,
    fields: IndexMap<Field, FieldSource>,
}

/// Field values extracted by a matching rule
pub type RuleFields = HashMap<Field, String>;

impl PatternRule {
    /// Compile and validate a rule
    pub fn compile(spec: PatternRuleSpec) -> Result<Self> {
        let name = spec.name.unwrap_or_else(|| spec.pattern.clone());
        let regex = Regex::new(&spec.pattern).map_err(|e| {
            OrganizerError::Config(format!("rule '{}' has an invalid pattern: {}", name, e))
        })?;

        let groups = regex.captures_len() - 1;
        for (field, source) in &spec.fields {
            if let FieldSource::Group(idx) = source {
                if *idx == 0 || *idx > groups {
                    return Err(OrganizerError::Config(format!(
                        "rule '{}' maps {:?} to group {} but the pattern has {} groups",
                        name, field, idx, groups
                    )));
                }
            }
        }
        if matches!(spec.fields.get(&Field::SubjectTopic), Some(FieldSource::Literal(_))) {
            return Err(OrganizerError::Config(format!(
                "rule '{}' must map subject_topic to a capture group",
                name
            )));
        }
        if !spec.fields.contains_key(&Field::Speaker) {
            return Err(OrganizerError::Config(format!("rule '{}' does not assign a speaker", name)));
        }
        if !spec.fields.contains_key(&Field::Topic) && !spec.fields.contains_key(&Field::SubjectTopic) {
            return Err(OrganizerError::Config(format!("rule '{}' does not assign a topic", name)));
        }

        Ok(Self {
            name,
            regex,
            fields: spec.fields,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Extract fields when the rule matches `stem`
    pub fn apply(&self, stem: &str) -> Option<RuleFields> {
        let caps = self.regex.captures(stem)?;
        let mut out = HashMap::new();

        for (field, source) in &self.fields {
            let value = match source {
                FieldSource::Group(idx) => caps.get(*idx).map(|m| m.as_str().to_string()),
                FieldSource::Literal(value) => Some(value.clone()),
            };
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                out.insert(*field, value);
            }
        }

        Some(out)
    }
}

/// Ordered rule table
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<PatternRule>,
}

impl RuleSet {
    pub fn from_specs(specs: Vec<PatternRuleSpec>) -> Result<Self> {
        let rules = specs
            .into_iter()
            .map(PatternRule::compile)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Load a rule table from JSON; malformed documents are fatal
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| OrganizerError::io(path, e))?;
        let specs: Vec<PatternRuleSpec> = serde_json::from_str(&content).map_err(|e| {
            OrganizerError::Config(format!("Failed to parse pattern rules {}: {}", path.display(), e))
        })?;
        Self::from_specs(specs)
    }

    /// Rules used when no table is configured
    pub fn builtin() -> Self {
        Self::from_specs(builtin_specs()).unwrap_or_else(|e| {
            tracing::error!("Built-in pattern rules failed to compile: {}", e);
            Self { rules: Vec::new() }
        })
    }

    /// First matching rule and its fields
    pub fn first_match(&self, stem: &str) -> Option<(&PatternRule, RuleFields)> {
        self.rules
            .iter()
            .find_map(|rule| rule.apply(stem).map(|fields| (rule, fields)))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Built-in table, also what `config generate` writes out
pub fn builtin_specs() -> Vec<PatternRuleSpec> {
    use Field::*;
    use FieldSource::Group;

    let rule = |name: &str, pattern: &str, fields: Vec<(Field, FieldSource)>| PatternRuleSpec {
        name: Some(name.to_string()),
        pattern: pattern.to_string(),
        fields: fields.into_iter().collect(),
    };

    vec![
        rule(
            "bespoke with relationship",
            r"^(.+?)_bespoke_(ally|enemy)_(.+)_([^_]+)$",
            vec![(Speaker, Group(1)), (Relationship, Group(2)), (Topic, Group(3)), (Subject, Group(4))],
        ),
        rule(
            "bespoke",
            r"^(.+?)_bespoke_(.+)_([^_]+)$",
            vec![(Speaker, Group(1)), (Topic, Group(2)), (Subject, Group(3))],
        ),
        rule(
            "ally/enemy",
            r"^(.+?)_(ally|enemy)_(.+)$",
            vec![(Speaker, Group(1)), (Relationship, Group(2)), (SubjectTopic, Group(3))],
        ),
        rule(
            "topic on subject",
            r"^([^_]+)_(.+?)_on_(.+)$",
            vec![(Speaker, Group(1)), (Topic, Group(2)), (Subject, Group(3))],
        ),
        rule(
            "topic then subject",
            r"^([^_]+)_([^_]+)_(.+)$",
            vec![(Speaker, Group(1)), (Topic, Group(2)), (Subject, Group(3))],
        ),
    ]
}
