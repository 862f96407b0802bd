//! Outcome store error types.

/// Errors produced while reading input tables or persisting outcomes.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// CSV parse or write failure.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// File-system I/O failure (open, flush, sync).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Table lacks a column this store needs to read it back.
    #[error("table '{path}' has no '{column}' column")]
    MissingColumn { path: String, column: &'static str },
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, StateError>;
