//! Per-row processing outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix written into the `github_issue_url` column for failed rows.
pub const ERROR_PREFIX: &str = "ERR: ";

/// Why a row was skipped without any remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// A prior run already created the item.
    Resumed,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resumed => f.write_str("resumed from prior run"),
        }
    }
}

/// Terminal state of one row in one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Item created in this run. `notes` holds reconciliation warnings
    /// (e.g. the project attach failed) that did not fail the row.
    Created { url: String, notes: Vec<String> },
    /// Item already existed from a prior run; `url` is the prior identity.
    Skipped { url: String, reason: SkipReason },
    Failed { error: String },
}

impl Outcome {
    #[must_use]
    pub fn status(&self) -> OutcomeStatus {
        match self {
            Self::Created { .. } => OutcomeStatus::Created,
            Self::Skipped { .. } => OutcomeStatus::Skipped,
            Self::Failed { .. } => OutcomeStatus::Failed,
        }
    }

    /// Remote identity of the item, for created and resumed rows.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Created { url, .. } | Self::Skipped { url, .. } => Some(url),
            Self::Failed { .. } => None,
        }
    }

    /// Value of the `github_issue_url` output column.
    #[must_use]
    pub fn url_cell(&self) -> String {
        match self {
            Self::Created { url, .. } | Self::Skipped { url, .. } => url.clone(),
            Self::Failed { error } => format!("{ERROR_PREFIX}{error}"),
        }
    }

    /// Value of the `notes` output column.
    #[must_use]
    pub fn notes_cell(&self) -> String {
        match self {
            Self::Created { notes, .. } => notes.join("; "),
            Self::Skipped { reason, .. } => reason.to_string(),
            Self::Failed { .. } => String::new(),
        }
    }
}

/// Outcome discriminant as written to the `status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Created,
    Skipped,
    Failed,
}

impl OutcomeStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "created" => Some(Self::Created),
            "skipped" => Some(Self::Skipped),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
