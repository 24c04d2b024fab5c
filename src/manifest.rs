// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Release manifest and status overlay line formats
//!
//! A manifest lists one file per line with its checksum:
//!
//! ```text
//! sounds/vo/mirage/ping/x.vsnd_c CRC:001380b678 size:20293
//! ```
//!
//! Diffing two manifests yields the same lines with a trailing `ADDED` or
//! `UPDATED`, which is the status overlay format consumed by the tree.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use crate::{OrganizerError, Result};

/// Default path prefix of voice-line entries in a manifest
pub const VOICE_LINE_PREFIX: &str = "sounds/vo/";

/// How a file changed between two releases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeStatus {
    Added,
    Updated,
}

impl ChangeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "ADDED",
            Self::Updated => "UPDATED",
        }
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeStatus {
    type Err = OrganizerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADDED" => Ok(Self::Added),
            "UPDATED" => Ok(Self::Updated),
            other => Err(OrganizerError::Config(format!("unknown change status '{}'", other))),
        }
    }
}

/// One parsed overlay line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRecord {
    pub path: String,
    pub status: ChangeStatus,
}

impl StatusRecord {
    /// Lowercase file name up to its first dot, used to match tree leaves
    pub fn stem_key(&self) -> String {
        stem_key(&self.path)
    }
}

/// Parse a status overlay.
///
/// The path runs up to ` CRC:` or ` size:` so paths containing spaces
/// survive; the status is the last word. Blank lines, `#` comments and
/// lines with an unknown status are skipped.
pub fn parse_status_overlay(content: &str) -> Vec<StatusRecord> {
    let mut records = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let path = if let Some((path, _)) = line.split_once(" CRC:") {
            path
        } else if let Some((path, _)) = line.split_once(" size:") {
            path
        } else {
            match line.split_whitespace().collect::<Vec<_>>().as_slice() {
                [path, _, ..] => *path,
                _ => {
                    debug!("Overlay line {} has no status, skipping", idx + 1);
                    continue;
                }
            }
        };

        let word = line.split_whitespace().last().unwrap_or_default();
        match word.parse::<ChangeStatus>() {
            Ok(status) => records.push(StatusRecord {
                path: path.trim().to_string(),
                status,
            }),
            Err(_) => debug!("Overlay line {} has unknown status '{}'", idx + 1, word),
        }
    }

    records
}

/// Read and parse an overlay file
pub fn load_status_overlay(path: &Path) -> Result<Vec<StatusRecord>> {
    let content = std::fs::read_to_string(path).map_err(|e| OrganizerError::io(path, e))?;
    Ok(parse_status_overlay(&content))
}

/// Path -> checksum for every entry under a prefix
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    entries: IndexMap<String, String>,
}

impl Snapshot {
    pub fn parse(content: &str, prefix: &str) -> Self {
        let entries = content
            .lines()
            .filter_map(|line| manifest_entry(line.trim(), prefix))
            .map(|(path, crc)| (path.to_string(), crc.to_string()))
            .collect();
        Self { entries }
    }

    pub fn load(path: &Path, prefix: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| OrganizerError::io(path, e))?;
        Ok(Self::parse(&content, prefix))
    }

    pub fn crc(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A manifest line from the newer release that differs from the baseline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedLine {
    pub line: String,
    pub status: ChangeStatus,
}

impl fmt::Display for ChangedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.line, self.status)
    }
}

/// Lines of `after` that are absent from `before` or carry a new checksum,
/// in `after` order
pub fn diff_manifests(before: &Snapshot, after: &str, prefix: &str) -> Vec<ChangedLine> {
    after
        .lines()
        .map(str::trim)
        .filter_map(|line| {
            let (path, crc) = manifest_entry(line, prefix)?;
            let status = match before.crc(path) {
                None => ChangeStatus::Added,
                Some(old) if old != crc => ChangeStatus::Updated,
                Some(_) => return None,
            };
            Some(ChangedLine {
                line: line.to_string(),
                status,
            })
        })
        .collect()
}

fn manifest_entry<'a>(line: &'a str, prefix: &str) -> Option<(&'a str, &'a str)> {
    if !line.starts_with(prefix) {
        return None;
    }
    let mut parts = line.split_whitespace();
    let path = parts.next()?;
    let crc = parts.find_map(|p| p.strip_prefix("CRC:"))?;
    Some((path, crc))
}

/// Lowercase file name up to its first dot
pub fn stem_key(path: &str) -> String {
    let name = path.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(path);
    let stem = name.split('.').next().unwrap_or(name);
    stem.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_text() {
        assert_eq!("ADDED".parse::<ChangeStatus>().unwrap(), ChangeStatus::Added);
        assert_eq!("updated".parse::<ChangeStatus>().unwrap(), ChangeStatus::Updated);
        assert!("REMOVED".parse::<ChangeStatus>().is_err());
        assert_eq!(serde_json::to_string(&ChangeStatus::Updated).unwrap(), "\"UPDATED\"");
    }

    #[test]
    fn test_parse_overlay_lines() {
        let content = "\
# generated overlay
sounds/vo/mirage/ping/x.vsnd_c CRC:001380b678 size:20293 UPDATED

sounds/vo/some dir/y z.vsnd_c size:12 ADDED
sounds/vo/plain.vsnd_c ADDED
lonely
sounds/vo/odd.vsnd_c CRC:01 REMOVED
";
        let records = parse_status_overlay(content);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].path, "sounds/vo/mirage/ping/x.vsnd_c");
        assert_eq!(records[0].status, ChangeStatus::Updated);
        assert_eq!(records[1].path, "sounds/vo/some dir/y z.vsnd_c");
        assert_eq!(records[1].stem_key(), "y z");
        assert_eq!(records[2].path, "sounds/vo/plain.vsnd_c");
    }

    #[test]
    fn test_diff_reports_added_and_updated() {
        let before = Snapshot::parse(
            "header line\nsounds/vo/a.vsnd_c CRC:01 size:1\nsounds/vo/b.vsnd_c CRC:02 size:1\n",
            VOICE_LINE_PREFIX,
        );
        assert_eq!(before.len(), 2);

        let after = "sounds/vo/a.vsnd_c CRC:01 size:1\n\
                     sounds/vo/b.vsnd_c CRC:03 size:1\n\
                     sounds/vo/c.vsnd_c CRC:04 size:1\n\
                     sounds/music/d.vsnd_c CRC:05 size:1\n\
                     sounds/vo/e.vsnd_c size:1\n";
        let changed = diff_manifests(&before, after, VOICE_LINE_PREFIX);
        let rendered: Vec<String> = changed.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "sounds/vo/b.vsnd_c CRC:03 size:1 UPDATED",
                "sounds/vo/c.vsnd_c CRC:04 size:1 ADDED",
            ]
        );
    }

    #[test]
    fn test_stem_key() {
        assert_eq!(stem_key("sounds/vo/Mirage/X.vsnd_c"), "x");
        assert_eq!(stem_key("mirage/ping/x.ogg"), "x");
        assert_eq!(stem_key("a.b.c"), "a");
    }
}
