// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Self keywords and special-category tables used during classification

use indexmap::IndexMap;
use std::collections::HashMap;

use super::suffix::is_variation_only;
use crate::config::OrganizeConfig;

/// Keyword tables consulted by the classifier
#[derive(Debug, Clone)]
pub struct Vocabulary {
    /// Longest first, so `use_power4_as_enemy` wins over `use_power4`
    self_keywords: Vec<String>,
    categories: IndexMap<String, Vec<String>>,
    category_index: HashMap<String, String>,
    ping_category_index: HashMap<String, String>,
}

impl Vocabulary {
    pub fn new(
        self_keywords: &[String],
        categories: &IndexMap<String, Vec<String>>,
        ping_categories: &IndexMap<String, Vec<String>>,
    ) -> Self {
        let mut keywords: Vec<String> = self_keywords.iter().map(|k| k.to_lowercase()).collect();
        keywords.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        keywords.dedup();

        Self {
            self_keywords: keywords,
            categories: categories.clone(),
            category_index: build_index(categories),
            ping_category_index: build_index(ping_categories),
        }
    }

    pub fn from_config(config: &OrganizeConfig) -> Self {
        Self::new(
            &config.self_keywords,
            &config.special_categories,
            &config.special_ping_categories,
        )
    }

    /// Longest self keyword anchored at the start of `remainder`.
    ///
    /// The keyword must be the whole remainder or be followed by an
    /// underscore and nothing but variation markers, so `interrupt_05`
    /// matches `interrupt` while `interrupt_atlas_01` does not.
    pub fn match_self_keyword<'a>(&self, remainder: &'a str) -> Option<(&'a str, Option<&'a str>)> {
        self.self_keywords.iter().find_map(|kw| {
            if remainder == kw {
                return Some((&remainder[..kw.len()], None));
            }
            let rest = remainder.strip_prefix(kw.as_str())?.strip_prefix('_')?;
            is_variation_only(rest).then(|| (&remainder[..kw.len()], Some(rest)))
        })
    }

    /// Special category for a normalized topic key
    pub fn category_for(&self, topic_key: &str, is_ping: bool) -> Option<&str> {
        let index = if is_ping {
            &self.ping_category_index
        } else {
            &self.category_index
        };
        index.get(topic_key).map(String::as_str)
    }

    /// Non-ping special category names in configured order
    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::from_config(&OrganizeConfig::default())
    }
}

/// keyword -> category, first category listing a keyword wins
fn build_index(categories: &IndexMap<String, Vec<String>>) -> HashMap<String, String> {
    let mut index = HashMap::new();
    for (name, keywords) in categories {
        for keyword in keywords {
            index
                .entry(keyword.to_lowercase())
                .or_insert_with(|| name.clone());
        }
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_keyword_wins() {
        let vocab = Vocabulary::default();
        assert_eq!(
            vocab.match_self_keyword("use_power4_as_enemy_02"),
            Some(("use_power4_as_enemy", Some("02")))
        );
        assert_eq!(vocab.match_self_keyword("use_power4_02"), Some(("use_power4", Some("02"))));
    }

    #[test]
    fn test_keyword_boundary_rule() {
        let vocab = Vocabulary::default();
        assert_eq!(vocab.match_self_keyword("interrupt"), Some(("interrupt", None)));
        assert_eq!(vocab.match_self_keyword("interrupt_05"), Some(("interrupt", Some("05"))));
        assert_eq!(vocab.match_self_keyword("interrupt_05_02"), Some(("interrupt", Some("05_02"))));
        assert_eq!(vocab.match_self_keyword("interrupt_atlas_01"), None);
        assert_eq!(vocab.match_self_keyword("interrupted_01"), None);
    }

    #[test]
    fn test_category_lookup() {
        let vocab = Vocabulary::default();
        assert_eq!(vocab.category_for("angry", false), Some("Emotions"));
        assert_eq!(vocab.category_for("on_top_of_mid", true), Some("Enemy Information and Location"));
        assert_eq!(vocab.category_for("angry", true), None);
        assert_eq!(vocab.category_for("select", false), None);
    }

    #[test]
    fn test_first_category_claims_keyword() {
        let mut categories = IndexMap::new();
        categories.insert("First".to_string(), vec!["shared".to_string()]);
        categories.insert("Second".to_string(), vec!["shared".to_string()]);
        let vocab = Vocabulary::new(&[], &categories, &IndexMap::new());

        assert_eq!(vocab.category_for("shared", false), Some("First"));
        assert_eq!(vocab.category_names().collect::<Vec<_>>(), vec!["First", "Second"]);
    }
}
