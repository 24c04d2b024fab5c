// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Alias tables mapping raw filename tokens to canonical display names
//!
//! A table is a JSON object of `canonical name -> [aliases]`. Aliases are
//! matched case-insensitively and may span several underscore-separated
//! tokens (`kelvin_killed_in`), so lookups against a token sequence try the
//! longest anchored candidate first.

use indexmap::IndexMap;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

use crate::{OrganizerError, Result};

/// Canonical-name lookup built from an alias document
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: IndexMap<String, Vec<String>>,
    index: HashMap<String, String>,
    max_tokens: usize,
}

/// A successful lookup against the start of a token sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AliasMatch<'a> {
    pub canonical: &'a str,
    /// Number of underscore-separated tokens the alias consumed
    pub tokens: usize,
}

impl AliasTable {
    /// Build a table, rejecting aliases claimed by two canonical names
    pub fn from_entries<I, S, A>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, A)>,
        S: Into<String>,
        A: IntoIterator,
        A::Item: AsRef<str>,
    {
        let mut table = Self::default();

        for (canonical, aliases) in entries {
            let canonical = canonical.into();
            let mut normalized = Vec::new();

            for alias in aliases {
                let alias = alias.as_ref().trim().to_lowercase();
                if alias.is_empty() {
                    continue;
                }
                match table.index.get(&alias) {
                    Some(owner) if owner != &canonical => {
                        return Err(OrganizerError::Config(format!(
                            "alias '{}' is claimed by both '{}' and '{}'",
                            alias, owner, canonical
                        )));
                    }
                    Some(_) => continue,
                    None => {}
                }
                table.max_tokens = table.max_tokens.max(alias.split('_').count());
                table.index.insert(alias.clone(), canonical.clone());
                normalized.push(alias);
            }

            table.entries.entry(canonical).or_default().extend(normalized);
        }

        Ok(table)
    }

    /// Load a table from a JSON document; malformed JSON is fatal
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| OrganizerError::io(path, e))?;
        Self::parse(&content).map_err(|e| match e {
            OrganizerError::Config(msg) => {
                OrganizerError::Config(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Parse a JSON alias document. Non-list values are skipped.
    pub fn parse(content: &str) -> Result<Self> {
        let raw: IndexMap<String, serde_json::Value> = serde_json::from_str(content)
            .map_err(|e| OrganizerError::Config(format!("Failed to parse alias table: {}", e)))?;

        let mut entries = Vec::with_capacity(raw.len());
        for (canonical, value) in raw {
            match value {
                serde_json::Value::Array(items) => {
                    let aliases: Vec<String> = items
                        .into_iter()
                        .filter_map(|v| v.as_str().map(String::from))
                        .collect();
                    entries.push((canonical, aliases));
                }
                _ => warn!("Ignoring non-list alias entry for '{}'", canonical),
            }
        }

        let table = Self::from_entries(entries)?;
        debug!(
            "Loaded alias table: {} names, {} aliases",
            table.entries.len(),
            table.index.len()
        );
        Ok(table)
    }

    /// Exact, case-insensitive lookup of a whole token
    pub fn resolve(&self, raw: &str) -> Option<&str> {
        self.index.get(&raw.to_lowercase()).map(String::as_str)
    }

    /// Longest alias anchored at the start of `raw`, on token boundaries
    ///
    /// `kelvin_pass_on` resolves through `kelvin`; a table that also holds
    /// `kelvin_killed_in` prefers it for `kelvin_killed_in_lane`.
    pub fn resolve_leading(&self, raw: &str) -> Option<AliasMatch<'_>> {
        let lowered = raw.to_lowercase();
        let tokens: Vec<&str> = lowered.split('_').filter(|t| !t.is_empty()).collect();
        self.resolve_tokens(&tokens)
    }

    /// Longest alias anchored at the first of `tokens`
    pub fn resolve_tokens(&self, tokens: &[&str]) -> Option<AliasMatch<'_>> {
        let longest = tokens.len().min(self.max_tokens);
        (1..=longest).rev().find_map(|n| {
            let candidate = tokens[..n].join("_").to_lowercase();
            self.index.get(&candidate).map(|canonical| AliasMatch {
                canonical: canonical.as_str(),
                tokens: n,
            })
        })
    }

    /// Whether `raw` is a known alias
    pub fn contains(&self, raw: &str) -> bool {
        self.resolve(raw).is_some()
    }

    /// Canonical names in document order
    pub fn canonical_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heroes() -> AliasTable {
        AliasTable::from_entries([
            ("Kelvin", vec!["kelvin", "kelvin_killed_in"]),
            ("Lady Geist", vec!["geist", "lady_geist"]),
            ("Atlas", vec!["atlas", "Bull"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let table = heroes();
        assert_eq!(table.resolve("BULL"), Some("Atlas"));
        assert_eq!(table.resolve("atlas"), Some("Atlas"));
        assert_eq!(table.resolve("yamato"), None);
    }

    #[test]
    fn test_resolve_leading_prefers_longest_alias() {
        let table = heroes();

        let m = table.resolve_leading("kelvin_pass_on").unwrap();
        assert_eq!(m.canonical, "Kelvin");
        assert_eq!(m.tokens, 1);

        let m = table.resolve_leading("kelvin_killed_in_lane").unwrap();
        assert_eq!(m.canonical, "Kelvin");
        assert_eq!(m.tokens, 3);

        let m = table.resolve_leading("lady_geist_kill").unwrap();
        assert_eq!(m.canonical, "Lady Geist");
        assert_eq!(m.tokens, 2);
    }

    #[test]
    fn test_resolve_leading_respects_token_boundaries() {
        let table = heroes();
        assert!(table.resolve_leading("kelvinish_line").is_none());
        assert!(table.resolve_leading("").is_none());
    }

    #[test]
    fn test_resolution_independent_of_entry_order() {
        let forward = AliasTable::from_entries([
            ("Kelvin", vec!["kelvin"]),
            ("Other", vec!["kelvin_pass"]),
        ])
        .unwrap();
        let backward = AliasTable::from_entries([
            ("Other", vec!["kelvin_pass"]),
            ("Kelvin", vec!["kelvin"]),
        ])
        .unwrap();

        for table in [forward, backward] {
            assert_eq!(table.resolve_leading("kelvin_pass_on").unwrap().canonical, "Other");
            assert_eq!(table.resolve_leading("kelvin_on").unwrap().canonical, "Kelvin");
        }
    }

    #[test]
    fn test_conflicting_aliases_are_rejected() {
        let result = AliasTable::from_entries([("A", vec!["x"]), ("B", vec!["X"])]);
        assert!(matches!(result, Err(OrganizerError::Config(_))));
    }

    #[test]
    fn test_parse_skips_non_list_values() {
        let table = AliasTable::parse(r#"{"Atlas": ["atlas"], "comment": "ignored"}"#).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.contains("atlas"));
        assert_eq!(table.canonical_names().collect::<Vec<_>>(), vec!["Atlas"]);
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        let result = AliasTable::parse("{not json");
        assert!(matches!(result, Err(OrganizerError::Config(_))));
    }
}
