// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Voice-line organizer
//!
//! Classifies extracted game voice-line files by filename into a nested
//! speaker / subject / topic tree, then enriches the tree's leaves with
//! file dates, transcriptions and release change status.

pub mod alias;
pub mod classify;
pub mod config;
pub mod error;
pub mod manifest;
pub mod metadata;
pub mod organize;
pub mod phase_log;
pub mod scan;
pub mod transcribe;
pub mod tree;

pub use config::AppConfig;
pub use error::{OrganizerError, Result};
