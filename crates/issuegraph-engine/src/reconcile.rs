//! Remote side effects around item creation: on-demand labels before,
//! project membership after.
//!
//! Neither ever fails a row on its own. Problems come back as notes that
//! end up on the row's `Created` outcome.

use std::collections::HashSet;

use issuegraph_types::{RemoteError, Repository};
use sha2::{Digest, Sha256};

use crate::config::LabelDefaults;
use crate::remote::{IssueTracker, LabelSpec, LabelStatus};
use crate::retry::RetryPolicy;

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Deterministic six-hex-digit color for a label name.
#[must_use]
pub fn label_color(name: &str) -> String {
    sha256_hex(name.as_bytes())[..6].to_string()
}

/// Tracks which labels are known to exist so each `(repository, label)`
/// pair is ensured at most once per run.
#[derive(Debug, Clone)]
pub struct Reconciler {
    defaults: LabelDefaults,
    known: HashSet<(Repository, String)>,
}

impl Reconciler {
    #[must_use]
    pub fn new(defaults: LabelDefaults) -> Self {
        Self {
            defaults,
            known: HashSet::new(),
        }
    }

    #[must_use]
    pub fn label_spec(&self, name: &str) -> LabelSpec {
        LabelSpec {
            name: name.to_string(),
            color: self
                .defaults
                .color
                .clone()
                .unwrap_or_else(|| label_color(name)),
            description: self.defaults.description.clone(),
        }
    }

    #[must_use]
    pub fn is_known(&self, repository: &Repository, label: &str) -> bool {
        self.known
            .contains(&(repository.clone(), label.to_string()))
    }

    /// Make sure every label in `labels` exists in `repository`. Returns one
    /// warning note per label that could not be ensured.
    pub async fn ensure_labels<T: IssueTracker>(
        &mut self,
        tracker: &T,
        policy: &RetryPolicy,
        repository: &Repository,
        labels: &[String],
    ) -> Vec<String> {
        let mut notes = Vec::new();
        for label in labels {
            if self.is_known(repository, label) {
                continue;
            }
            if let Err(err) = self.heal_label(tracker, policy, repository, label).await {
                tracing::warn!(
                    repository = %repository,
                    label = label.as_str(),
                    category = %err.category,
                    "Could not ensure label"
                );
                notes.push(format!("label '{label}' could not be ensured: {err}"));
            }
        }
        notes
    }

    /// Create `label` in `repository` (or confirm it exists).
    ///
    /// # Errors
    ///
    /// Returns the [`RemoteError`] of the last attempt.
    pub async fn heal_label<T: IssueTracker>(
        &mut self,
        tracker: &T,
        policy: &RetryPolicy,
        repository: &Repository,
        label: &str,
    ) -> Result<(), RemoteError> {
        let spec = self.label_spec(label);
        let spec = &spec;
        let status = policy
            .run("create_label", move || tracker.create_label(repository, spec))
            .await?;
        match status {
            LabelStatus::Created => tracing::info!(
                repository = %repository,
                label,
                color = spec.color.as_str(),
                "Created missing label"
            ),
            LabelStatus::AlreadyExists => {
                tracing::debug!(repository = %repository, label, "Label already exists");
            }
        }
        self.known.insert((repository.clone(), label.to_string()));
        Ok(())
    }

    /// Attach `item_url` to the project `project_number` of the repository
    /// owner. Returns a warning note on failure.
    pub async fn attach_to_project<T: IssueTracker>(
        &self,
        tracker: &T,
        policy: &RetryPolicy,
        repository: &Repository,
        project_number: u64,
        item_url: &str,
    ) -> Option<String> {
        let owner = repository.owner.as_str();
        match policy
            .run("add_item_to_project", move || {
                tracker.add_item_to_project(owner, project_number, item_url)
            })
            .await
        {
            Ok(()) => {
                tracing::debug!(owner, project_number, item_url, "Added item to project");
                None
            }
            Err(err) => {
                tracing::warn!(
                    owner,
                    project_number,
                    item_url,
                    category = %err.category,
                    "Item created but not added to project"
                );
                Some(format!(
                    "created but not added to project {owner}/{project_number}: {err}"
                ))
            }
        }
    }
}
