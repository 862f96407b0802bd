//! Read-only view of a prior run's outcomes.
//!
//! Loaded once before processing starts and handed to the engine; never
//! re-read mid-run.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use issuegraph_types::outcome::ERROR_PREFIX;
use issuegraph_types::OutcomeStatus;

use crate::error::{self, StateError};
use crate::ledger::{read_records, OutcomeRecord};

/// What a prior run recorded for one title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriorOutcome {
    /// The item exists remotely at `url` (created or resumed earlier).
    Created { url: String },
    Failed { error: String },
}

impl PriorOutcome {
    /// Interpret one output record. Returns `None` for records that carry
    /// no outcome at all.
    fn from_record(record: &OutcomeRecord) -> Option<Self> {
        let cell = record.github_issue_url.as_deref().map(str::trim).unwrap_or_default();
        let status = record.status.as_deref().and_then(OutcomeStatus::parse);

        if cell.starts_with("http") && status != Some(OutcomeStatus::Failed) {
            return Some(Self::Created {
                url: cell.to_string(),
            });
        }
        if let Some(error) = cell.strip_prefix(ERROR_PREFIX.trim_end()) {
            return Some(Self::Failed {
                error: error.trim().to_string(),
            });
        }
        if status == Some(OutcomeStatus::Failed) {
            return Some(Self::Failed {
                error: cell.to_string(),
            });
        }
        None
    }
}

/// Title-keyed prior outcomes.
#[derive(Debug, Clone, Default)]
pub struct ResumeSnapshot {
    entries: HashMap<String, PriorOutcome>,
}

impl ResumeSnapshot {
    /// Snapshot with no prior outcomes (fresh run).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load a prior output table.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] if the file cannot be read, is not valid CSV,
    /// or has no `title` / `github_issue_url` column.
    pub fn load(path: &Path) -> error::Result<Self> {
        let file = std::fs::File::open(path)?;
        let snapshot = Self::from_reader(file, &path.display().to_string())?;
        tracing::info!(
            path = %path.display(),
            entries = snapshot.len(),
            created = snapshot.created_count(),
            "Loaded resume snapshot"
        );
        Ok(snapshot)
    }

    /// Load from any CSV source. `source` names it in error messages.
    ///
    /// # Errors
    ///
    /// See [`ResumeSnapshot::load`].
    pub fn from_reader<R: Read>(reader: R, source: &str) -> error::Result<Self> {
        let (headers, records) = read_records(reader)?;
        for column in ["title", "github_issue_url"] {
            if !headers.iter().any(|h| h == column) {
                return Err(StateError::MissingColumn {
                    path: source.to_string(),
                    column,
                });
            }
        }
        Ok(Self::from_records(records))
    }

    /// Build from records in file order. A created record for a title is
    /// never displaced by a later non-created one; otherwise the last
    /// record wins.
    #[must_use]
    pub fn from_records<I: IntoIterator<Item = OutcomeRecord>>(records: I) -> Self {
        let mut entries: HashMap<String, PriorOutcome> = HashMap::new();
        for record in records {
            let Some(title) = record.title.as_deref().map(str::trim).filter(|t| !t.is_empty())
            else {
                continue;
            };
            let Some(prior) = PriorOutcome::from_record(&record) else {
                continue;
            };
            let keep_existing = matches!(entries.get(title), Some(PriorOutcome::Created { .. }))
                && matches!(prior, PriorOutcome::Failed { .. });
            if !keep_existing {
                entries.insert(title.to_string(), prior);
            }
        }
        Self { entries }
    }

    /// Record a prior outcome directly (in-memory snapshots for tests).
    pub fn insert(&mut self, title: impl Into<String>, prior: PriorOutcome) {
        self.entries.insert(title.into(), prior);
    }

    #[must_use]
    pub fn get(&self, title: &str) -> Option<&PriorOutcome> {
        self.entries.get(title)
    }

    /// URL of the item a prior run created for `title`, if any.
    #[must_use]
    pub fn created_url(&self, title: &str) -> Option<&str> {
        match self.entries.get(title) {
            Some(PriorOutcome::Created { url }) => Some(url),
            _ => None,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn created_count(&self) -> usize {
        self.entries
            .values()
            .filter(|p| matches!(p, PriorOutcome::Created { .. }))
            .count()
    }
}
