//! Input table reading.

use std::io::Read;
use std::path::{Path, PathBuf};

use issuegraph_types::{RawRow, REQUIRED_COLUMNS};

use crate::error;

/// Parsed input table: the header row plus every data record.
#[derive(Debug, Clone, Default)]
pub struct InputTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl InputTable {
    /// Required columns absent from the header row.
    #[must_use]
    pub fn missing_columns(&self) -> Vec<&'static str> {
        REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|col| !self.headers.iter().any(|h| h.trim() == *col))
            .collect()
    }

    /// Read a table from any CSV source. Quoted fields keep embedded
    /// newlines, commas, and quotes verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Csv`](crate::StateError::Csv) on malformed CSV
    /// (e.g. a record with a different number of fields than the header).
    pub fn from_reader<R: Read>(reader: R) -> error::Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);
        let headers = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect::<Vec<_>>();
        reader.set_headers(csv::StringRecord::from(headers.clone()));

        let rows = reader
            .deserialize::<RawRow>()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { headers, rows })
    }
}

/// Read the input table at `path`.
///
/// # Errors
///
/// Returns [`StateError`](crate::StateError) if the file cannot be opened or
/// is not valid CSV.
pub fn read_input(path: &Path) -> error::Result<InputTable> {
    let file = std::fs::File::open(path)?;
    let table = InputTable::from_reader(file)?;
    tracing::debug!(
        path = %path.display(),
        rows = table.rows.len(),
        columns = table.headers.len(),
        "Read input table"
    );
    Ok(table)
}

/// Output path for an input file: same directory, file stem plus `suffix`,
/// `.csv` extension (`plan.csv` -> `plan_output.csv`).
#[must_use]
pub fn output_path_for(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{stem}{suffix}.csv"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "repository,title,parent_title,body,labels,assignees,project_name,project_number,extra\n\
acme/app,Epic,,\"Top level, with comma\",epic,,Roadmap,3,ignored\n\
acme/app,Story,Epic,\"line one\nline \"\"two\"\"\",,alice,,3,\n";

    #[test]
    fn reads_multiline_and_quoted_bodies_verbatim() {
        let table = InputTable::from_reader(TABLE.as_bytes()).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].body.as_deref(), Some("Top level, with comma"));
        assert_eq!(table.rows[1].body.as_deref(), Some("line one\nline \"two\""));
        assert_eq!(table.rows[1].parent_title.as_deref(), Some("Epic"));
    }

    #[test]
    fn empty_cells_are_none() {
        let table = InputTable::from_reader(TABLE.as_bytes()).unwrap();
        assert!(table.rows[0].parent_title.is_none());
        assert!(table.rows[0].assignees.is_none());
        assert_eq!(table.rows[1].assignees.as_deref(), Some("alice"));
    }

    #[test]
    fn missing_columns_reported() {
        let table = InputTable::from_reader("title,body\nA,b\n".as_bytes()).unwrap();
        assert_eq!(
            table.missing_columns(),
            vec!["repository", "parent_title", "project_number"]
        );
        assert!(table.rows[0].repository.is_none());
    }

    #[test]
    fn header_whitespace_is_ignored() {
        let table = InputTable::from_reader(
            " repository , title ,parent_title,body,project_number\nacme/app,A,,b,1\n".as_bytes(),
        )
        .unwrap();
        assert!(table.missing_columns().is_empty());
        assert_eq!(table.rows[0].title.as_deref(), Some("A"));
    }

    #[test]
    fn output_path_appends_suffix() {
        let out = output_path_for(Path::new("/work/plans/q3.csv"), "_output");
        assert_eq!(out, PathBuf::from("/work/plans/q3_output.csv"));
        let relative = output_path_for(Path::new("q3.csv"), "_done");
        assert_eq!(relative, PathBuf::from("q3_done.csv"));
    }
}
