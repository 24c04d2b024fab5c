// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Diagnostic accumulator threaded through a processing phase
//!
//! Each phase (classification, sorting) appends its diagnostics to a
//! `PhaseLog` owned by the caller. Nothing is emitted until the caller
//! flushes it, so a phase's output stays together in the log.

use tracing::debug;

/// Ordered diagnostic lines collected during one phase
#[derive(Debug, Clone, Default)]
pub struct PhaseLog {
    phase: &'static str,
    lines: Vec<String>,
}

impl PhaseLog {
    /// Create an empty log for the named phase
    pub fn new(phase: &'static str) -> Self {
        Self {
            phase,
            lines: Vec::new(),
        }
    }

    /// Append one diagnostic line
    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn phase(&self) -> &'static str {
        self.phase
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Emit every collected line at debug level and empty the log
    pub fn flush(&mut self) {
        if self.lines.is_empty() {
            return;
        }
        debug!("--- {} diagnostics ({} lines) ---", self.phase, self.lines.len());
        for line in self.lines.drain(..) {
            debug!("[{}] {}", self.phase, line);
        }
        debug!("--- end {} diagnostics ---", self.phase);
    }
}
