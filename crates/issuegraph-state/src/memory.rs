//! In-memory [`OutcomeSink`], used by tests and dry inspection.

use issuegraph_types::{Outcome, Row};

use crate::backend::OutcomeSink;
use crate::error;

/// Keeps recorded outcomes in insertion order.
#[derive(Debug, Default)]
pub struct MemoryOutcomeSink {
    records: Vec<(String, Outcome)>,
}

impl MemoryOutcomeSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `(title, outcome)` pairs in the order they were recorded.
    #[must_use]
    pub fn records(&self) -> &[(String, Outcome)] {
        &self.records
    }

    /// Most recent outcome recorded for `title`.
    #[must_use]
    pub fn get(&self, title: &str) -> Option<&Outcome> {
        self.records
            .iter()
            .rev()
            .find(|(t, _)| t == title)
            .map(|(_, outcome)| outcome)
    }

    /// Titles in record order.
    #[must_use]
    pub fn titles(&self) -> Vec<&str> {
        self.records.iter().map(|(t, _)| t.as_str()).collect()
    }
}

impl OutcomeSink for MemoryOutcomeSink {
    fn record(&mut self, row: &Row, outcome: &Outcome) -> error::Result<()> {
        self.records.push((row.title.clone(), outcome.clone()));
        Ok(())
    }
}
