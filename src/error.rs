// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for the voice-line organizer

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for organizer operations
pub type Result<T> = std::result::Result<T, OrganizerError>;

/// Organizer error types
///
/// Classification itself never fails; only configuration, I/O and
/// transcription-service boundaries produce these.
#[derive(Error, Debug)]
pub enum OrganizerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("API error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),
}

impl OrganizerError {
    /// Wrap an I/O error together with the path that caused it
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
