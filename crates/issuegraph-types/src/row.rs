//! Input row model.
//!
//! [`RawRow`] is the verbatim CSV record (every cell optional so that the
//! preflight validator can report *all* missing fields). [`Row`] is the
//! normalized view the graph and engine work with.

use serde::{Deserialize, Serialize};

/// Header columns every input table must carry.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "repository",
    "title",
    "parent_title",
    "body",
    "project_number",
];

/// One record of the input table, exactly as read.
///
/// Empty cells and absent columns both deserialize to `None`. Unknown
/// columns are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub parent_title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub labels: Option<String>,
    #[serde(default)]
    pub assignees: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub project_number: Option<String>,
}

/// `owner/name` repository coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl Repository {
    /// Parse an `owner/name` string. Returns `None` for anything else,
    /// including whitespace inside either part.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let (owner, name) = value.trim().split_once('/')?;
        let valid = |part: &str| !part.is_empty() && !part.contains(char::is_whitespace);
        if !valid(owner) || !valid(name) || name.contains('/') {
            return None;
        }
        Some(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl std::fmt::Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Normalized input row.
///
/// Text fields are trimmed (except `body`, which is kept verbatim). Fields
/// that were missing are empty here; `raw` keeps the original cells so the
/// validator can tell "missing" from "present but empty" and the ledger can
/// echo the input back unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Zero-based position among the data records.
    pub index: usize,
    pub repository: String,
    pub title: String,
    pub parent_title: Option<String>,
    pub body: String,
    pub labels: Vec<String>,
    pub assignees: Vec<String>,
    pub project_name: Option<String>,
    /// `None` when the cell is missing or not a positive integer.
    pub project_number: Option<u64>,
    pub raw: RawRow,
}

impl Row {
    #[must_use]
    pub fn from_raw(index: usize, raw: RawRow) -> Self {
        let trimmed = |cell: &Option<String>| {
            cell.as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string()
        };
        let parent_title = raw
            .parent_title
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        let project_number = raw
            .project_number
            .as_deref()
            .and_then(|n| n.trim().parse::<u64>().ok())
            .filter(|n| *n >= 1);

        Self {
            index,
            repository: trimmed(&raw.repository),
            title: trimmed(&raw.title),
            parent_title,
            body: raw.body.clone().unwrap_or_default(),
            labels: split_list(raw.labels.as_deref()),
            assignees: split_list(raw.assignees.as_deref()),
            project_name: raw
                .project_name
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            project_number,
            raw,
        }
    }

    /// Spreadsheet-style row number (header is row 1).
    #[must_use]
    pub fn line(&self) -> usize {
        self.index + 2
    }

    /// Parsed repository coordinate, if well-formed.
    #[must_use]
    pub fn repository(&self) -> Option<Repository> {
        Repository::parse(&self.repository)
    }
}

/// Split a comma-separated cell into trimmed, non-empty, de-duplicated
/// entries, keeping first-occurrence order.
#[must_use]
pub fn split_list(cell: Option<&str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in cell.unwrap_or_default().split(',') {
        let item = item.trim();
        if !item.is_empty() && !out.iter().any(|existing| existing == item) {
            out.push(item.to_string());
        }
    }
    out
}
