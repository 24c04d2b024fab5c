// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Stage three: transcribe every file the tree references
//!
//! Unique leaf identifiers become jobs. A fixed pool of tokio tasks, each
//! holding its own [`Transcriber`], pulls jobs from a shared cursor. Once
//! every job has finished, the tree is rewritten in a single sequential
//! [`transform`] pass; a failed file keeps its previous entry.

pub mod store;
pub mod whisper;

use async_trait::async_trait;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::classify::suffix::sentence_case;
use crate::metadata::file_date;
use crate::tree::transform::{flatten, transform};
use crate::tree::{CategoryTree, LeafEntry, LeafRecord};
use crate::{OrganizerError, Result};
use store::{cache_path, read_cache, write_cache, CachedTranscript};

/// One timed piece of a transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    /// 1-based position within the transcript
    #[serde(default)]
    pub part: usize,
}

/// Service output for one file
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub text: String,
    pub segments: Vec<Segment>,
}

/// Speech-to-text backend. Each worker owns one instance.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, path: &Path) -> Result<Transcript>;
}

#[derive(Debug, Clone)]
pub struct TranscribeOptions {
    /// Folder that leaf identifiers are relative to
    pub source: PathBuf,
    /// Where `<filename>.json` caches live; defaults to `source`
    pub cache_dir: Option<PathBuf>,
    /// Ignore existing caches
    pub force: bool,
    pub workers: usize,
}

impl TranscribeOptions {
    fn cache_dir(&self) -> &Path {
        self.cache_dir.as_deref().unwrap_or(&self.source)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TranscribeStats {
    pub successful: usize,
    /// Served from an existing cache
    pub skipped: usize,
    pub failed: usize,
    pub total: usize,
}

#[derive(Debug)]
enum Outcome {
    Transcribed(CachedTranscript),
    Cached(CachedTranscript),
    Failed(String),
}

/// Transcribe every unique file in `tree` and attach the results.
///
/// `make_client` is called once per worker before any job starts, so a
/// client that cannot be built aborts the run up front.
pub async fn transcribe_tree<T, F>(
    tree: CategoryTree,
    options: &TranscribeOptions,
    mut make_client: F,
) -> Result<(CategoryTree, TranscribeStats)>
where
    T: Transcriber + 'static,
    F: FnMut() -> Result<T>,
{
    let jobs = unique_identifiers(&tree);
    let mut stats = TranscribeStats {
        total: jobs.len(),
        ..TranscribeStats::default()
    };
    if jobs.is_empty() {
        info!("No files to transcribe");
        return Ok((tree, stats));
    }

    let cache_dir = options.cache_dir().to_path_buf();
    std::fs::create_dir_all(&cache_dir).map_err(|e| OrganizerError::io(&cache_dir, e))?;

    let worker_count = options.workers.clamp(1, jobs.len());
    info!(
        "Transcribing {} unique files with {} workers",
        jobs.len(),
        worker_count
    );

    let jobs = Arc::new(jobs);
    let cursor = Arc::new(AtomicUsize::new(0));
    let context = Arc::new(JobContext {
        source: options.source.clone(),
        cache_dir,
        force: options.force,
    });

    let clients = (0..worker_count)
        .map(|_| make_client())
        .collect::<Result<Vec<T>>>()?;

    let mut handles = Vec::with_capacity(worker_count);
    for (worker, client) in clients.into_iter().enumerate() {
        let jobs = Arc::clone(&jobs);
        let cursor = Arc::clone(&cursor);
        let context = Arc::clone(&context);

        handles.push(tokio::spawn(async move {
            let mut done = Vec::new();
            loop {
                let idx = cursor.fetch_add(1, Ordering::Relaxed);
                let Some(identifier) = jobs.get(idx) else {
                    break;
                };
                debug!("Worker {} processing {}/{}: {}", worker, idx + 1, jobs.len(), identifier);
                done.push((idx, context.run(&client, identifier).await));
            }
            done
        }));
    }

    let mut results: HashMap<String, CachedTranscript> = HashMap::new();
    for handle in join_all(handles).await {
        let done = handle.map_err(|e| OrganizerError::Transcription(format!("Worker task failed: {}", e)))?;
        for (idx, outcome) in done {
            match outcome {
                Outcome::Transcribed(cached) => {
                    stats.successful += 1;
                    results.insert(jobs[idx].clone(), cached);
                }
                Outcome::Cached(cached) => {
                    stats.skipped += 1;
                    results.insert(jobs[idx].clone(), cached);
                }
                Outcome::Failed(reason) => {
                    stats.failed += 1;
                    warn!("{}", reason);
                }
            }
        }
    }

    let tree = transform(tree, |entry| match results.get(entry.identifier()) {
        Some(cached) => with_transcription(entry, cached, &options.source),
        None => entry,
    });

    info!(
        "Transcription complete: {} transcribed, {} skipped (cached), {} failed, {} total",
        stats.successful, stats.skipped, stats.failed, stats.total
    );
    Ok((tree, stats))
}

struct JobContext {
    source: PathBuf,
    cache_dir: PathBuf,
    force: bool,
}

impl JobContext {
    async fn run<T: Transcriber>(&self, client: &T, identifier: &str) -> Outcome {
        let cache = cache_path(&self.cache_dir, identifier);

        if !self.force && cache.is_file() {
            match read_cache(&cache) {
                Ok(cached) => {
                    debug!("Skipping {} (already transcribed)", identifier);
                    return Outcome::Cached(cached);
                }
                Err(e) => warn!(
                    "Error reading existing transcription for {}, will reprocess: {}",
                    identifier, e
                ),
            }
        }

        let audio = self.source.join(identifier);
        if !audio.is_file() {
            return Outcome::Failed(format!("File not found: {}", audio.display()));
        }

        let transcript = match client.transcribe(&audio).await {
            Ok(transcript) => transcript,
            Err(e) => return Outcome::Failed(format!("Error transcribing {}: {}", identifier, e)),
        };

        let cached = CachedTranscript::new(voiceline_id(identifier), transcript);
        if let Err(e) = write_cache(&cache, &cached) {
            warn!("Could not write transcript cache for {}: {}", identifier, e);
        }
        Outcome::Transcribed(cached)
    }
}

/// Leaf identifiers in document order, first occurrence only
fn unique_identifiers(tree: &CategoryTree) -> Vec<String> {
    let mut seen = HashSet::new();
    flatten(tree)
        .into_iter()
        .map(LeafEntry::identifier)
        .filter(|id| seen.insert(*id))
        .map(String::from)
        .collect()
}

/// File name without its last extension
fn voiceline_id(identifier: &str) -> String {
    let name = identifier.rsplit('/').next().unwrap_or(identifier);
    match name.rfind('.') {
        Some(idx) if idx > 0 => name[..idx].to_string(),
        _ => name.to_string(),
    }
}

fn with_transcription(entry: LeafEntry, cached: &CachedTranscript, source: &Path) -> LeafEntry {
    let date = match &entry {
        LeafEntry::Record(record) if record.date.is_some() => record.date.clone(),
        _ => file_date(&source.join(entry.identifier())),
    };
    let mut record = LeafRecord::new(entry.identifier());
    record.date = date;
    record.voiceline_id = Some(cached.voiceline_id.clone());
    record.transcription = Some(sentence_case_if_all_caps(&cached.text()));
    LeafEntry::Record(record)
}

/// `"HELLO THERE"` becomes `"Hello there"`; leading whitespace and any
/// text with lowercase letters are left alone
pub fn sentence_case_if_all_caps(text: &str) -> String {
    let trimmed = text.trim_start();
    let has_cased = trimmed.chars().any(char::is_alphabetic);
    if !has_cased || trimmed.chars().any(char::is_lowercase) {
        return text.to_string();
    }
    let leading = &text[..text.len() - trimmed.len()];
    format!("{}{}", leading, sentence_case(trimmed))
}
