//! Diagnostic queue for collecting and deduplicating runtime diagnostics.

use crate::{Diagnostic, ErrorMask};

/// Configuration for diagnostic collection.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct DiagnosticConfig {
    /// Maximum number of stored diagnostics (0 = unlimited). Reports past
    /// the limit are counted but dropped.
    pub limit: usize,
    /// Drop a diagnostic whose message equals the previously stored one.
    pub deduplicate: bool,
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        DiagnosticConfig {
            limit: 100,
            deduplicate: true,
        }
    }
}

impl DiagnosticConfig {
    /// No limit, no dedup (tests).
    pub fn unlimited() -> Self {
        DiagnosticConfig {
            limit: 0,
            deduplicate: false,
        }
    }
}

/// Collecting sink for runtime diagnostics.
///
/// The queue itself applies no error-level mask — masking is the execution
/// context's concern, since the mask changes dynamically under `@`.
#[derive(Default, Debug)]
pub struct DiagnosticQueue {
    config: DiagnosticConfig,
    entries: Vec<Diagnostic>,
    /// Total reports seen, including dropped ones.
    reported: usize,
}

impl DiagnosticQueue {
    pub fn new(config: DiagnosticConfig) -> Self {
        DiagnosticQueue {
            config,
            entries: Vec::new(),
            reported: 0,
        }
    }

    /// Record a diagnostic.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.reported = self.reported.saturating_add(1);
        if self.config.deduplicate {
            if let Some(last) = self.entries.last() {
                if last.level == diagnostic.level && last.message == diagnostic.message {
                    return;
                }
            }
        }
        if self.config.limit > 0 && self.entries.len() >= self.config.limit {
            return;
        }
        self.entries.push(diagnostic);
    }

    /// Stored diagnostics in report order.
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Total reports seen (including deduplicated/over-limit drops).
    pub fn reported(&self) -> usize {
        self.reported
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stored diagnostics at the given level.
    pub fn at_level(&self, level: ErrorMask) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.level.intersects(level))
    }

    /// Drain stored diagnostics, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.entries)
    }
}
