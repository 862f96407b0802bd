//! Narrow interface to the remote issue tracker.
//!
//! Authentication is entirely the implementation's concern; no credentials
//! pass through the engine.

use std::future::Future;

use issuegraph_types::{RemoteError, Repository};

/// Attributes of a label to create on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSpec {
    pub name: String,
    /// Six hex digits, no `#`.
    pub color: String,
    pub description: String,
}

/// Result of an idempotent label creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelStatus {
    Created,
    AlreadyExists,
}

/// Item creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub repository: Repository,
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
    pub assignees: Vec<String>,
}

/// Remote operations the engine needs.
///
/// Every call is fallible; `create_label` and `add_item_to_project` must be
/// idempotent (an existing label or membership is success, not an error).
pub trait IssueTracker {
    /// Ensure `label` exists in `repository`.
    fn create_label(
        &self,
        repository: &Repository,
        label: &LabelSpec,
    ) -> impl Future<Output = Result<LabelStatus, RemoteError>>;

    /// Create an item and return its URL.
    fn create_item(&self, item: &NewItem) -> impl Future<Output = Result<String, RemoteError>>;

    /// Attach an item to the organization project `project_number` owned
    /// by `owner`.
    fn add_item_to_project(
        &self,
        owner: &str,
        project_number: u64,
        item_url: &str,
    ) -> impl Future<Output = Result<(), RemoteError>>;
}
