//! Batch result types.

use std::path::PathBuf;

use issuegraph_types::Outcome;
use serde::Serialize;

/// Per-status counts for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Reconciliation warnings attached to created rows.
    pub warnings: usize,
    pub failed_titles: Vec<String>,
}

impl RunSummary {
    pub fn record(&mut self, title: &str, outcome: &Outcome) {
        match outcome {
            Outcome::Created { notes, .. } => {
                self.created += 1;
                self.warnings += notes.len();
            }
            Outcome::Skipped { .. } => self.skipped += 1,
            Outcome::Failed { .. } => {
                self.failed += 1;
                self.failed_titles.push(title.to_string());
            }
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.created + self.skipped + self.failed
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Result of [`run_batch`](crate::run_batch).
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub summary: RunSummary,
    pub output_path: PathBuf,
    /// Titles the resume snapshot knew about.
    pub resumed_entries: usize,
    pub duration_secs: f64,
}
