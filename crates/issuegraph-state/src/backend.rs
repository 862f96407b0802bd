//! Outcome sink trait definition.

use issuegraph_types::{Outcome, Row};

use crate::error;

/// Destination for per-row outcomes.
///
/// The engine calls [`record`](Self::record) exactly once per row, as soon as
/// the row reaches a terminal state. Implementations must make the record
/// durable before returning: a crash after the call must not lose it.
pub trait OutcomeSink {
    /// Persist the outcome of one row.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`](crate::error::StateError) when the record
    /// could not be written or flushed.
    fn record(&mut self, row: &Row, outcome: &Outcome) -> error::Result<()>;
}

impl<S: OutcomeSink + ?Sized> OutcomeSink for &mut S {
    fn record(&mut self, row: &Row, outcome: &Outcome) -> error::Result<()> {
        (**self).record(row, outcome)
    }
}
