//! Shared fixtures: an in-memory recording tracker and table helpers.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use issuegraph_engine::{BatchPlan, IssueTracker, LabelSpec, LabelStatus, NewItem};
use issuegraph_state::InputTable;
use issuegraph_types::{ErrorCategory, RemoteError, Repository};

/// One remote call, as the tracker saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Label { repository: String, name: String },
    Item { title: String, body: String },
    Project { owner: String, number: u64, url: String },
}

/// Fake tracker that records every call and numbers items per repository.
#[derive(Default)]
pub struct RecordingTracker {
    pub calls: Mutex<Vec<Call>>,
    pub numbers: Mutex<HashMap<String, u64>>,
    pub labels: Mutex<HashSet<(String, String)>>,
    /// Item titles that always fail with a permanent error.
    pub failing_items: HashSet<String>,
    /// Item title -> number of transient failures before success.
    pub flaky_items: Mutex<HashMap<String, u32>>,
    /// Labels whose first creation is reported as existing without
    /// actually existing.
    pub phantom_labels: Mutex<HashSet<String>>,
    pub failing_projects: bool,
}

impl RecordingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(titles: &[&str]) -> Self {
        Self {
            failing_items: titles.iter().map(ToString::to_string).collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn item_titles(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Item { title, .. } => Some(title),
                _ => None,
            })
            .collect()
    }

    /// Body sent with the last creation attempt for `title`.
    pub fn body_of(&self, title: &str) -> Option<String> {
        self.calls().into_iter().rev().find_map(|call| match call {
            Call::Item { title: t, body } if t == title => Some(body),
            _ => None,
        })
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl IssueTracker for RecordingTracker {
    async fn create_label(
        &self,
        repository: &Repository,
        label: &LabelSpec,
    ) -> Result<LabelStatus, RemoteError> {
        self.push(Call::Label {
            repository: repository.to_string(),
            name: label.name.clone(),
        });
        if self.phantom_labels.lock().unwrap().remove(&label.name) {
            return Ok(LabelStatus::AlreadyExists);
        }
        let key = (repository.to_string(), label.name.clone());
        if self.labels.lock().unwrap().insert(key) {
            Ok(LabelStatus::Created)
        } else {
            Ok(LabelStatus::AlreadyExists)
        }
    }

    async fn create_item(&self, item: &NewItem) -> Result<String, RemoteError> {
        self.push(Call::Item {
            title: item.title.clone(),
            body: item.body.clone(),
        });
        if self.failing_items.contains(&item.title) {
            return Err(RemoteError::new(
                ErrorCategory::Validation,
                "HTTP 422: Validation Failed",
            ));
        }
        if let Some(remaining) = self.flaky_items.lock().unwrap().get_mut(&item.title) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(RemoteError::new(ErrorCategory::Server, "HTTP 502: Bad Gateway"));
            }
        }

        let repository = item.repository.to_string();
        {
            let labels = self.labels.lock().unwrap();
            if let Some(missing) = item
                .labels
                .iter()
                .find(|l| !labels.contains(&(repository.clone(), (*l).clone())))
            {
                return Err(RemoteError::missing_label(
                    missing.clone(),
                    format!("could not add label: '{missing}' not found"),
                ));
            }
        }

        let mut numbers = self.numbers.lock().unwrap();
        let number = numbers.entry(repository.clone()).or_insert(0);
        *number += 1;
        Ok(format!("https://github.com/{repository}/issues/{number}"))
    }

    async fn add_item_to_project(
        &self,
        owner: &str,
        project_number: u64,
        item_url: &str,
    ) -> Result<(), RemoteError> {
        self.push(Call::Project {
            owner: owner.to_string(),
            number: project_number,
            url: item_url.to_string(),
        });
        if self.failing_projects {
            return Err(RemoteError::new(
                ErrorCategory::NotFound,
                "Could not resolve to a ProjectV2 with the number 9.",
            ));
        }
        Ok(())
    }
}

pub const HEADER: &str = "repository,title,parent_title,body,labels,assignees,project_name,project_number";

/// Build a plan from CSV data lines (header is prepended).
pub fn plan(lines: &[&str]) -> BatchPlan {
    let csv = format!("{HEADER}\n{}\n", lines.join("\n"));
    BatchPlan::from_table(InputTable::from_reader(csv.as_bytes()).unwrap()).unwrap()
}
