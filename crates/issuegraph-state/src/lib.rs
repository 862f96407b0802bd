//! Outcome persistence for issuegraph runs.
//!
//! Provides the CSV input reader, the [`OutcomeSink`] trait with a durable
//! append-only [`CsvOutcomeLedger`] implementation, and the read-only
//! [`ResumeSnapshot`] consulted once at the start of a resumed run.

#![warn(clippy::pedantic)]

pub mod backend;
pub mod error;
pub mod input;
pub mod ledger;
pub mod memory;
pub mod snapshot;

pub use backend::OutcomeSink;
pub use error::StateError;
pub use input::{output_path_for, read_input, InputTable};
pub use ledger::{CsvOutcomeLedger, LedgerMode, OutcomeRecord, OUTPUT_COLUMNS};
pub use memory::MemoryOutcomeSink;
pub use snapshot::{PriorOutcome, ResumeSnapshot};
