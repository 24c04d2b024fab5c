// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Discovery of audio files under a corpus root

use glob::{MatchOptions, Pattern};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::{OrganizerError, Result};

/// An audio file found below the corpus root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFile {
    pub path: PathBuf,
    /// Path relative to the root, `/`-separated
    pub relative: String,
}

impl AudioFile {
    pub fn file_name(&self) -> &str {
        self.relative.rsplit('/').next().unwrap_or(&self.relative)
    }
}

/// Check if file should be processed (not hidden, temp, etc.)
pub fn should_process(path: &Path) -> bool {
    let filename = match path.file_name().and_then(|n| n.to_str()) {
        Some(n) => n,
        None => return false,
    };

    // Skip hidden files
    if filename.starts_with('.') {
        return false;
    }

    // Skip temporary files
    let temp_extensions = [".tmp", ".part", ".crdownload", ".partial", ".download"];
    if temp_extensions.iter().any(|ext| filename.ends_with(ext)) {
        return false;
    }

    // Skip system files
    let skip_names = ["desktop.ini", "thumbs.db", ".ds_store"];
    !skip_names.iter().any(|n| filename.eq_ignore_ascii_case(n))
}

/// Every file below `root` with one of `extensions` (case-insensitive),
/// sorted by relative path
pub fn scan_audio_files(root: &Path, extensions: &[String]) -> Result<Vec<AudioFile>> {
    if !root.is_dir() {
        return Err(OrganizerError::io(
            root,
            std::io::Error::new(std::io::ErrorKind::NotFound, "source folder is not a directory"),
        ));
    }

    let options = MatchOptions {
        case_sensitive: false,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };
    let base = Pattern::escape(&root.to_string_lossy());

    let mut found = BTreeMap::new();
    for ext in extensions {
        let ext = ext.trim_start_matches('.');
        let pattern = format!("{}/**/*.{}", base, Pattern::escape(ext));
        debug!("Scanning {}", pattern);

        for entry in glob::glob_with(&pattern, options)? {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !path.is_file() || !should_process(&path) {
                continue;
            }
            let Some(relative) = relative_path(root, &path) else {
                continue;
            };
            found.entry(relative).or_insert(path);
        }
    }

    debug!("Found {} audio files under {:?}", found.len(), root);
    Ok(found
        .into_iter()
        .map(|(relative, path)| AudioFile { path, relative })
        .collect())
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}
