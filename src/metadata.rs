// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Stage-two pass: file dates and the flat copy folder
//!
//! Every leaf path becomes `{filename, date}`. The date is the file's
//! creation time, or its modification time where the platform has no
//! creation time. Entries whose file cannot be found keep their previous
//! form.
//!
//! `filename` stays relative to the source folder, so a later pass can find
//! the file again. When files are copied into a flat folder, entries whose
//! copy succeeded are renamed to their bare file name, which is relative to
//! that folder instead.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::tree::transform::{flatten, transform};
use crate::tree::{CategoryTree, LeafEntry, LeafRecord};
use crate::{OrganizerError, Result};

#[derive(Debug, Clone)]
pub struct MetadataOptions {
    /// Folder that leaf paths are relative to
    pub source: PathBuf,
    /// Copy each referenced file here once, by filename
    pub copy_to: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetadataReport {
    pub entries: usize,
    pub dated: usize,
    pub copied: usize,
    pub copy_failures: usize,
    /// Leaf identifiers whose file was not found
    pub missing: Vec<String>,
}

/// `YYYY-MM-DD` of the file's creation (else modification) time
pub fn file_date(path: &Path) -> Option<String> {
    let meta = std::fs::metadata(path).ok()?;
    let time = meta.created().or_else(|_| meta.modified()).ok()?;
    let local: DateTime<Local> = time.into();
    Some(local.format("%Y-%m-%d").to_string())
}

/// `<dir>/<stem>_flat.<ext>` next to the input tree
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("tree");
    let name = match input.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}_flat.{}", stem, ext),
        None => format!("{}_flat", stem),
    };
    input.with_file_name(name)
}

/// Attach dates to every leaf, copying files when requested
pub fn attach_metadata(tree: CategoryTree, options: &MetadataOptions) -> Result<(CategoryTree, MetadataReport)> {
    if let Some(dest) = &options.copy_to {
        std::fs::create_dir_all(dest).map_err(|e| OrganizerError::io(dest, e))?;
    }

    let mut report = MetadataReport::default();
    let mut dates: HashMap<String, String> = HashMap::new();
    let mut missing: HashSet<String> = HashSet::new();
    let mut copied: HashSet<String> = HashSet::new();

    for entry in flatten(&tree) {
        report.entries += 1;
        let id = entry.identifier();
        if dates.contains_key(id) || missing.contains(id) {
            continue;
        }

        let source = options.source.join(id);
        let Some(date) = file_date(&source) else {
            debug!("No metadata for {:?}", source);
            missing.insert(id.to_string());
            report.missing.push(id.to_string());
            continue;
        };
        dates.insert(id.to_string(), date);

        if let Some(dest) = &options.copy_to {
            let name = entry.file_name();
            if copied.contains(name) {
                continue;
            }
            match std::fs::copy(&source, dest.join(name)) {
                Ok(_) => {
                    copied.insert(name.to_string());
                    debug!("Copied: {}", name);
                }
                Err(e) => {
                    warn!("Error copying {}: {}", name, e);
                    report.copy_failures += 1;
                }
            }
        }
    }
    report.copied = copied.len();

    let tree = transform(tree, |entry| match dates.get(entry.identifier()) {
        Some(date) => {
            let flat = options.copy_to.is_some() && copied.contains(entry.file_name());
            with_date(entry, date, flat)
        }
        None => entry,
    });
    report.dated = flatten(&tree)
        .iter()
        .filter(|e| e.as_record().is_some_and(|r| r.date.is_some()))
        .count();

    info!(
        "Metadata attached: {} entries, {} dated, {} missing, {} files copied",
        report.entries,
        report.dated,
        report.missing.len(),
        report.copied
    );
    Ok((tree, report))
}

fn with_date(entry: LeafEntry, date: &str, flat: bool) -> LeafEntry {
    let filename = (if flat { entry.file_name() } else { entry.identifier() }).to_string();
    let mut record = match entry {
        LeafEntry::Path(_) => LeafRecord::new(filename),
        LeafEntry::Record(mut record) => {
            record.filename = filename;
            record
        }
    };
    record.date = Some(date.to_string());
    LeafEntry::Record(record)
}
