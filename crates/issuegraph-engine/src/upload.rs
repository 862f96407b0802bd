//! Upload engine: drives each scheduled node from pending to a terminal
//! outcome.
//!
//! ```text
//! Pending ──(prior Created in snapshot)──▶ Skipped(resumed)
//! Pending ──▶ Creating ──▶ Created(url) | Failed(error)
//! ```
//!
//! Every terminal transition is recorded through the injected
//! [`OutcomeSink`] before the next node starts. A remote failure is local to
//! its row; only a sink failure stops the batch.

use std::collections::HashSet;

use issuegraph_state::{OutcomeSink, ResumeSnapshot};
use issuegraph_types::{ErrorCategory, Outcome, RemoteError, Repository, Row, SkipReason};

use crate::checklist::{render_body, render_line, ChildRef};
use crate::config::{ChecklistConfig, RunConfig};
use crate::errors::EngineError;
use crate::graph::{Graph, Node, NodeId};
use crate::preflight::ValidatedGraph;
use crate::reconcile::Reconciler;
use crate::remote::{IssueTracker, NewItem};
use crate::result::RunSummary;
use crate::retry::RetryPolicy;

/// Remote identity of an already processed node, as its parent sees it.
#[derive(Debug, Clone)]
enum Resolved {
    Url(String),
    Failed,
}

pub struct UploadEngine<'a, T: IssueTracker, S: OutcomeSink> {
    tracker: &'a T,
    sink: S,
    snapshot: ResumeSnapshot,
    checklist: ChecklistConfig,
    policy: RetryPolicy,
    reconciler: Reconciler,
}

impl<'a, T: IssueTracker, S: OutcomeSink> UploadEngine<'a, T, S> {
    #[must_use]
    pub fn new(tracker: &'a T, sink: S, snapshot: ResumeSnapshot, config: &RunConfig) -> Self {
        Self {
            tracker,
            sink,
            snapshot,
            checklist: config.checklist.clone(),
            policy: RetryPolicy::from_config(&config.retry),
            reconciler: Reconciler::new(config.labels.clone()),
        }
    }

    /// Replace the retry policy derived from the run config.
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Process `order` (which must be a bottom-up order of `validated`).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Ledger`] if an outcome cannot be recorded.
    /// Rows already recorded stay recorded.
    pub async fn run(
        &mut self,
        validated: &ValidatedGraph,
        order: &[NodeId],
    ) -> Result<RunSummary, EngineError> {
        let graph = &validated.graph;
        let mut resolved: Vec<Option<Resolved>> = vec![None; graph.len()];
        let mut summary = RunSummary::default();

        tracing::info!(
            rows = order.len(),
            resumable = self.snapshot.created_count(),
            "Starting upload"
        );

        for &id in order {
            let node = graph.node(id);
            let outcome = match self.snapshot.created_url(&node.row.title) {
                Some(url) => {
                    tracing::info!(
                        title = node.row.title.as_str(),
                        url,
                        "Skipping, created by a prior run"
                    );
                    Outcome::Skipped {
                        url: url.to_string(),
                        reason: SkipReason::Resumed,
                    }
                }
                None => self.create(node, &resolved, graph).await,
            };

            self.sink
                .record(&node.row, &outcome)
                .map_err(|source| EngineError::Ledger {
                    title: node.row.title.clone(),
                    source,
                })?;

            resolved[id.index()] = Some(match outcome.url() {
                Some(url) => Resolved::Url(url.to_string()),
                None => Resolved::Failed,
            });
            summary.record(&node.row.title, &outcome);
        }

        tracing::info!(
            created = summary.created,
            skipped = summary.skipped,
            failed = summary.failed,
            warnings = summary.warnings,
            "Upload finished"
        );
        Ok(summary)
    }

    /// Give the sink back, e.g. to inspect an in-memory one.
    pub fn into_sink(self) -> S {
        self.sink
    }

    async fn create(
        &mut self,
        node: &Node,
        resolved: &[Option<Resolved>],
        graph: &Graph,
    ) -> Outcome {
        let row = &node.row;
        let Some(repository) = row.repository() else {
            return failed(row, &format!("malformed repository '{}'", row.repository));
        };

        let lines: Vec<String> = node
            .children
            .iter()
            .map(|child| {
                let title = graph.node(*child).row.title.as_str();
                let child_ref = match &resolved[child.index()] {
                    Some(Resolved::Url(url)) => ChildRef::Linked { title, url },
                    Some(Resolved::Failed) | None => ChildRef::Failed { title },
                };
                render_line(&repository, child_ref)
            })
            .collect();
        let item = NewItem {
            repository: repository.clone(),
            title: row.title.clone(),
            body: render_body(&row.body, &lines, &self.checklist),
            labels: row.labels.clone(),
            assignees: row.assignees.clone(),
        };

        let mut notes = self
            .reconciler
            .ensure_labels(self.tracker, &self.policy, &repository, &row.labels)
            .await;

        let url = match self.create_item(&item, row.labels.len() + 1).await {
            Ok(url) => url,
            Err(err) => return failed(row, &err.to_string()),
        };

        if let Some(project_number) = row.project_number {
            if let Some(note) = self
                .reconciler
                .attach_to_project(self.tracker, &self.policy, &repository, project_number, &url)
                .await
            {
                notes.push(note);
            }
        }

        tracing::info!(
            title = row.title.as_str(),
            repository = %repository,
            url = url.as_str(),
            children = lines.len(),
            warnings = notes.len(),
            "Created item"
        );
        Outcome::Created { url, notes }
    }

    /// Create the item, healing missing labels the remote reports. Each
    /// distinct label is healed at most once and the whole exchange is
    /// bounded by `max_attempts` creation calls.
    async fn create_item(
        &mut self,
        item: &NewItem,
        max_attempts: usize,
    ) -> Result<String, RemoteError> {
        let tracker = self.tracker;
        let mut healed: HashSet<String> = HashSet::new();
        let mut attempt = 0usize;

        loop {
            attempt += 1;
            let err = match self
                .policy
                .run("create_item", move || tracker.create_item(item))
                .await
            {
                Ok(url) => return Ok(url),
                Err(err) => err,
            };

            let healable = err.missing_label.clone().filter(|label| {
                err.category == ErrorCategory::MissingLabel
                    && attempt < max_attempts
                    && !healed.contains(label)
            });
            let Some(label) = healable else {
                return Err(err);
            };

            tracing::warn!(
                title = item.title.as_str(),
                repository = %item.repository,
                label = label.as_str(),
                attempt,
                "Label missing at creation, creating it and retrying"
            );
            self.heal(&item.repository, &label).await?;
            healed.insert(label);
        }
    }

    async fn heal(&mut self, repository: &Repository, label: &str) -> Result<(), RemoteError> {
        self.reconciler
            .heal_label(self.tracker, &self.policy, repository, label)
            .await
            .map_err(|err| {
                RemoteError::new(
                    err.category,
                    format!("failed to create missing label '{label}': {}", err.message),
                )
            })
    }
}

fn failed(row: &Row, error: &str) -> Outcome {
    tracing::error!(
        title = row.title.as_str(),
        repository = row.repository.as_str(),
        line = row.line(),
        error,
        "Failed to create item"
    );
    Outcome::Failed {
        error: error.to_string(),
    }
}
