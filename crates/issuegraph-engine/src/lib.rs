//! Hierarchy resolution and resumable upload engine for issuegraph.
//!
//! Turns a flat table of rows into a validated forest, schedules it
//! bottom-up, and creates each item against an [`IssueTracker`] while
//! recording every outcome through an injected
//! [`OutcomeSink`](issuegraph_state::OutcomeSink).

pub mod checklist;
pub mod config;
pub mod errors;
pub mod graph;
pub mod orchestrator;
pub mod preflight;
pub mod reconcile;
pub mod remote;
pub mod result;
pub mod retry;
pub mod schedule;
pub mod upload;

// Re-export public API for convenience
pub use errors::{ClassificationTable, EngineError};
pub use graph::{Graph, Node, NodeId};
pub use orchestrator::{plan_batch, run_batch, BatchPlan, RunOptions};
pub use preflight::{validate, Forest, ValidatedGraph};
pub use remote::{IssueTracker, LabelSpec, LabelStatus, NewItem};
pub use result::{BatchReport, RunSummary};
pub use retry::RetryPolicy;
pub use schedule::schedule;
pub use upload::UploadEngine;
