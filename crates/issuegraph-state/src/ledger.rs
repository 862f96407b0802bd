//! Durable, append-only CSV outcome ledger.
//!
//! One record is written per terminal row transition and synced to disk
//! before [`OutcomeSink::record`] returns, so an interrupted run leaves
//! exactly the records of the rows it finished.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use issuegraph_types::{Outcome, Row};
use serde::{Deserialize, Serialize};

use crate::backend::OutcomeSink;
use crate::error;

/// Column order of the output table.
pub const OUTPUT_COLUMNS: &[&str] = &[
    "repository",
    "title",
    "parent_title",
    "body",
    "labels",
    "assignees",
    "project_name",
    "project_number",
    "github_issue_url",
    "status",
    "notes",
    "processed_at",
];

/// One row of the output table: the input cells echoed back plus the
/// outcome columns.
///
/// Every field is optional so that tables written by older tools (which
/// lack `status`, `notes`, `processed_at`) still read back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRecord {
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
    #[serde(default)]
    pub github_issue_url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub processed_at: Option<String>,
}

impl OutcomeRecord {
    #[must_use]
    pub fn new(row: &Row, outcome: &Outcome, processed_at: String) -> Self {
        let non_empty = |s: String| if s.is_empty() { None } else { Some(s) };
        let raw = row.raw.clone();
        Self {
            repository: raw.repository,
            title: raw.title,
            parent_title: raw.parent_title,
            body: raw.body,
            labels: raw.labels,
            assignees: raw.assignees,
            project_name: raw.project_name,
            project_number: raw.project_number,
            github_issue_url: non_empty(outcome.url_cell()),
            status: Some(outcome.status().to_string()),
            notes: non_empty(outcome.notes_cell()),
            processed_at: Some(processed_at),
        }
    }
}

/// Read an output table with trimmed header names. Columns this crate does
/// not know (e.g. `children`) are ignored; absent ones read as `None`.
pub(crate) fn read_records<R: Read>(
    reader: R,
) -> error::Result<(Vec<String>, Vec<OutcomeRecord>)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect::<Vec<_>>();
    reader.set_headers(csv::StringRecord::from(headers.clone()));

    let records = reader
        .deserialize::<OutcomeRecord>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok((headers, records))
}

/// Rewrite an existing table under [`OUTPUT_COLUMNS`] when its header
/// differs, so appended records line up with their columns. Returns whether
/// the file was rewritten.
fn normalize_columns(path: &Path, dir: &Path) -> error::Result<bool> {
    let existing = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    };
    if existing.metadata()?.len() == 0 {
        return Ok(false);
    }
    let (headers, records) = read_records(existing)?;
    if headers.iter().map(String::as_str).eq(OUTPUT_COLUMNS.iter().copied()) {
        return Ok(false);
    }

    let mut staged = tempfile::NamedTempFile::new_in(dir)?;
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(staged.as_file_mut());
        writer.write_record(OUTPUT_COLUMNS)?;
        for record in &records {
            writer.serialize(record)?;
        }
        writer.flush()?;
    }
    staged.as_file_mut().flush()?;
    staged.as_file().sync_data()?;
    staged.persist(path).map_err(|e| e.error)?;

    tracing::info!(
        path = %path.display(),
        records = records.len(),
        previous_columns = %headers.join(","),
        "Rewrote prior output under the current column layout"
    );
    Ok(true)
}

/// How to open the ledger file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerMode {
    /// Start a fresh table, discarding any existing file.
    Truncate,
    /// Keep existing records and add new ones after them (resumed runs).
    Append,
}

/// CSV-file-backed [`OutcomeSink`].
pub struct CsvOutcomeLedger {
    path: PathBuf,
    writer: csv::Writer<File>,
    written: u64,
}

impl CsvOutcomeLedger {
    /// Open the ledger at `path`. The header row is written when the file
    /// is new or empty. In [`LedgerMode::Append`] an existing table with a
    /// different column layout is first rewritten under [`OUTPUT_COLUMNS`],
    /// keeping every record.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Io`](crate::StateError::Io) if the file or its
    /// parent directory cannot be created.
    pub fn open(path: &Path, mode: LedgerMode) -> error::Result<Self> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                std::fs::create_dir_all(parent)?;
                parent
            }
            _ => Path::new("."),
        };
        let file = match mode {
            LedgerMode::Truncate => File::create(path)?,
            LedgerMode::Append => {
                normalize_columns(path, dir)?;
                OpenOptions::new().create(true).append(true).open(path)?
            }
        };
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            writer.write_record(OUTPUT_COLUMNS)?;
            writer.flush()?;
        }

        tracing::debug!(path = %path.display(), ?mode, "Opened outcome ledger");
        Ok(Self {
            path: path.to_path_buf(),
            writer,
            written: 0,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records written through this handle.
    #[must_use]
    pub fn written(&self) -> u64 {
        self.written
    }

    fn now() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

impl OutcomeSink for CsvOutcomeLedger {
    fn record(&mut self, row: &Row, outcome: &Outcome) -> error::Result<()> {
        let record = OutcomeRecord::new(row, outcome, Self::now());
        self.writer.serialize(&record)?;
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        self.written += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use issuegraph_types::{RawRow, SkipReason};

    fn row(title: &str) -> Row {
        Row::from_raw(
            0,
            RawRow {
                repository: Some("acme/app".into()),
                title: Some(title.into()),
                parent_title: None,
                body: Some("multi\nline, \"quoted\"".into()),
                labels: Some("a, b".into()),
                assignees: None,
                project_name: None,
                project_number: Some("4".into()),
            },
        )
    }

    fn read_back(path: &Path) -> Vec<OutcomeRecord> {
        let mut reader = csv::Reader::from_path(path).unwrap();
        reader.deserialize().map(Result::unwrap).collect()
    }

    #[test]
    fn writes_header_and_echoes_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut ledger = CsvOutcomeLedger::open(&path, LedgerMode::Truncate).unwrap();
        ledger
            .record(
                &row("Epic"),
                &Outcome::Created {
                    url: "https://github.com/acme/app/issues/9".into(),
                    notes: vec![],
                },
            )
            .unwrap();
        assert_eq!(ledger.written(), 1);

        let header = std::fs::read_to_string(&path).unwrap();
        assert!(header.starts_with(&OUTPUT_COLUMNS.join(",")));

        let records = read_back(&path);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].body.as_deref(), Some("multi\nline, \"quoted\""));
        assert_eq!(records[0].labels.as_deref(), Some("a, b"));
        assert_eq!(records[0].status.as_deref(), Some("created"));
        assert!(records[0].notes.is_none());
        assert!(records[0].processed_at.is_some());
    }

    #[test]
    fn failed_rows_carry_error_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut ledger = CsvOutcomeLedger::open(&path, LedgerMode::Truncate).unwrap();
        ledger
            .record(
                &row("Epic"),
                &Outcome::Failed {
                    error: "[not_found] no such repo".into(),
                },
            )
            .unwrap();
        let records = read_back(&path);
        assert_eq!(
            records[0].github_issue_url.as_deref(),
            Some("ERR: [not_found] no such repo")
        );
        assert_eq!(records[0].status.as_deref(), Some("failed"));
    }

    #[test]
    fn append_mode_keeps_prior_records_and_single_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        {
            let mut ledger = CsvOutcomeLedger::open(&path, LedgerMode::Truncate).unwrap();
            ledger
                .record(
                    &row("A"),
                    &Outcome::Created {
                        url: "https://github.com/acme/app/issues/1".into(),
                        notes: vec![],
                    },
                )
                .unwrap();
        }
        {
            let mut ledger = CsvOutcomeLedger::open(&path, LedgerMode::Append).unwrap();
            ledger
                .record(
                    &row("A"),
                    &Outcome::Skipped {
                        url: "https://github.com/acme/app/issues/1".into(),
                        reason: SkipReason::Resumed,
                    },
                )
                .unwrap();
        }
        let records = read_back(&path);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].status.as_deref(), Some("skipped"));
        assert_eq!(records[1].notes.as_deref(), Some("resumed from prior run"));
    }

    #[test]
    fn append_mode_rewrites_foreign_column_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(
            &path,
            "title,repository,parent_title,body,project_number,github_issue_url,children\n\
Leaf,acme/app,Root,l,1,https://github.com/acme/app/issues/50,\n\
Root,acme/app,,r,1,ERR: boom,#50\n",
        )
        .unwrap();

        let mut ledger = CsvOutcomeLedger::open(&path, LedgerMode::Append).unwrap();
        ledger
            .record(
                &row("Root"),
                &Outcome::Created {
                    url: "https://github.com/acme/app/issues/51".into(),
                    notes: vec![],
                },
            )
            .unwrap();
        drop(ledger);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with(&OUTPUT_COLUMNS.join(",")));
        let records = read_back(&path);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].title.as_deref(), Some("Leaf"));
        assert_eq!(records[0].repository.as_deref(), Some("acme/app"));
        assert_eq!(
            records[0].github_issue_url.as_deref(),
            Some("https://github.com/acme/app/issues/50")
        );
        assert!(records[0].status.is_none());
        assert_eq!(records[1].github_issue_url.as_deref(), Some("ERR: boom"));
        assert_eq!(records[2].title.as_deref(), Some("Root"));
        assert_eq!(records[2].status.as_deref(), Some("created"));
    }

    #[test]
    fn append_mode_leaves_current_layout_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let canonical = format!("{}\n", OUTPUT_COLUMNS.join(","));
        std::fs::write(&path, &canonical).unwrap();
        assert!(!normalize_columns(&path, dir.path()).unwrap());
        assert!(!normalize_columns(&dir.path().join("absent.csv"), dir.path()).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), canonical);
    }

    #[test]
    fn truncate_mode_discards_prior_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "stale contents\n").unwrap();
        let ledger = CsvOutcomeLedger::open(&path, LedgerMode::Truncate).unwrap();
        drop(ledger);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.trim_end(), OUTPUT_COLUMNS.join(","));
    }
}
