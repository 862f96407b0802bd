//! Shared issuegraph model types: input rows, per-row outcomes, and the
//! remote/preflight error taxonomy.
//!
//! This crate has no I/O and is safe to depend on from every other crate in
//! the workspace.

pub mod error;
pub mod outcome;
pub mod row;

pub use error::{BackoffClass, ErrorCategory, RemoteError, ValidationIssue, ViolationKind};
pub use outcome::{Outcome, OutcomeStatus, SkipReason};
pub use row::{RawRow, Repository, Row, REQUIRED_COLUMNS};
