// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Per-file transcript cache and the custom vocabulary prompt

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::{Segment, Transcript};
use crate::{OrganizerError, Result};

/// Cached result stored as `<filename>.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedTranscript {
    pub voiceline_id: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

impl CachedTranscript {
    pub fn new(voiceline_id: impl Into<String>, transcript: Transcript) -> Self {
        Self {
            voiceline_id: voiceline_id.into(),
            timestamp: chrono::Local::now().to_rfc3339(),
            text: Some(transcript.text),
            segments: transcript.segments,
        }
    }

    /// Stored text, else the segment texts joined by spaces
    pub fn text(&self) -> String {
        match &self.text {
            Some(text) => text.clone(),
            None => self
                .segments
                .iter()
                .map(|s| s.text.as_str())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

pub fn cache_path(dir: &Path, identifier: &str) -> PathBuf {
    dir.join(format!("{}.json", identifier))
}

pub fn read_cache(path: &Path) -> Result<CachedTranscript> {
    let content = std::fs::read_to_string(path).map_err(|e| OrganizerError::io(path, e))?;
    Ok(serde_json::from_str(&content)?)
}

pub fn write_cache(path: &Path, transcript: &CachedTranscript) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| OrganizerError::io(parent, e))?;
    }
    let content = serde_json::to_string_pretty(transcript)?;
    std::fs::write(path, content).map_err(|e| OrganizerError::io(path, e))
}

/// Read a custom vocabulary file and turn it into a prompt
pub fn load_custom_vocabulary(path: &Path) -> Result<Option<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| OrganizerError::io(path, e))?;
    let value: Value = serde_json::from_str(&content).map_err(|e| {
        OrganizerError::Config(format!("Failed to parse vocabulary {}: {}", path.display(), e))
    })?;
    let prompt = vocabulary_prompt(&value);
    if prompt.is_none() {
        warn!("Vocabulary {} is neither a list nor a map of lists, ignoring", path.display());
    }
    Ok(prompt)
}

/// A list of terms or a map of category to terms
pub fn vocabulary_prompt(value: &Value) -> Option<String> {
    match value {
        Value::Array(terms) => Some(format!("Some terms you may encounter: {}.", join_terms(terms))),
        Value::Object(categories) => {
            let parts: Vec<String> = categories
                .iter()
                .filter_map(|(category, terms)| {
                    terms
                        .as_array()
                        .map(|terms| format!("{}: {}", category, join_terms(terms)))
                })
                .collect();
            Some(format!("You may encounter these terms: {}.", parts.join("; ")))
        }
        _ => None,
    }
}

fn join_terms(terms: &[Value]) -> String {
    terms
        .iter()
        .filter_map(Value::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_vocabulary_prompts() {
        assert_eq!(
            vocabulary_prompt(&json!(["Haze", "Yamato"])).unwrap(),
            "Some terms you may encounter: Haze, Yamato."
        );
        assert_eq!(
            vocabulary_prompt(&json!({"Heroes": ["Haze", "Lash"], "Items": ["Soul"], "bad": 3})).unwrap(),
            "You may encounter these terms: Heroes: Haze, Lash; Items: Soul."
        );
        assert!(vocabulary_prompt(&json!("plain")).is_none());
    }

    #[test]
    fn test_cache_text_falls_back_to_segments() {
        let cached: CachedTranscript = serde_json::from_str(
            r#"{"voiceline_id": "lash_select_01", "timestamp": "t",
                "segments": [{"start": 0, "end": 1, "text": "Here", "part": 1},
                             {"start": 1, "end": 2, "text": "we go", "part": 2}]}"#,
        )
        .unwrap();
        assert_eq!(cached.text(), "Here we go");
    }

    #[test]
    fn test_cache_written_under_nested_identifier() {
        let temp = TempDir::new().unwrap();
        let path = cache_path(temp.path(), "lash/lash_select_01.mp3");
        let cached = CachedTranscript::new(
            "lash_select_01",
            Transcript {
                text: "Here we go.".to_string(),
                segments: Vec::new(),
            },
        );

        write_cache(&path, &cached).unwrap();
        assert!(temp.path().join("lash/lash_select_01.mp3.json").is_file());
        assert_eq!(read_cache(&path).unwrap().text(), "Here we go.");
    }

    #[test]
    fn test_vocabulary_file_must_parse() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("vocab.json");
        std::fs::write(&path, "[oops").unwrap();
        assert!(matches!(load_custom_vocabulary(&path), Err(OrganizerError::Config(_))));
    }
}
