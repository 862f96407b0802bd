//! [`IssueTracker`] backed by the GitHub CLI.
//!
//! Authentication, hosts, and tokens are entirely `gh`'s business. Failures
//! come back as stderr text and are classified through the run's
//! [`ClassificationTable`].

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use issuegraph_engine::{ClassificationTable, IssueTracker, LabelSpec, LabelStatus, NewItem};
use issuegraph_types::{ErrorCategory, RemoteError, Repository};
use tokio::process::Command;

/// Token scopes needed to create issues and labels and to add items to
/// organization projects.
const REQUIRED_SCOPES: &[&str] = &["project", "read:org", "repo"];

pub struct GhCli {
    program: String,
    classifier: ClassificationTable,
}

impl GhCli {
    pub fn new(classifier: ClassificationTable) -> Self {
        Self {
            program: "gh".to_string(),
            classifier,
        }
    }

    /// Run `gh` with `args`; stdout on success, a classified error otherwise.
    async fn exec(&self, args: &[String]) -> Result<String, RemoteError> {
        tracing::debug!(args = ?args, "Running gh");
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .await
            .map_err(|e| {
                RemoteError::new(
                    ErrorCategory::Unknown,
                    format!("failed to run '{}': {e}", self.program),
                )
            })?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).trim().to_string());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = if stderr.trim().is_empty() {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        } else {
            stderr.trim().to_string()
        };
        Err(self.classifier.classify(&message))
    }
}

fn label_create_args(repository: &Repository, label: &LabelSpec) -> Vec<String> {
    vec![
        "label".into(),
        "create".into(),
        label.name.clone(),
        "--repo".into(),
        repository.to_string(),
        "--color".into(),
        label.color.clone(),
        "--description".into(),
        label.description.clone(),
    ]
}

fn issue_create_args(item: &NewItem, body_file: &Path) -> Vec<String> {
    let mut args = vec![
        "issue".into(),
        "create".into(),
        "--repo".into(),
        item.repository.to_string(),
        "--title".into(),
        item.title.clone(),
        "--body-file".into(),
        body_file.display().to_string(),
    ];
    if !item.labels.is_empty() {
        args.push("--label".into());
        args.push(item.labels.join(","));
    }
    if !item.assignees.is_empty() {
        args.push("--assignee".into());
        args.push(item.assignees.join(","));
    }
    args
}

fn is_already_exists(err: &RemoteError) -> bool {
    err.message.to_lowercase().contains("already exists")
}

/// The created item's URL: the last stdout line that looks like one.
fn item_url(stdout: &str) -> Option<&str> {
    stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| line.starts_with("http"))
}

impl IssueTracker for GhCli {
    async fn create_label(
        &self,
        repository: &Repository,
        label: &LabelSpec,
    ) -> Result<LabelStatus, RemoteError> {
        match self.exec(&label_create_args(repository, label)).await {
            Ok(_) => Ok(LabelStatus::Created),
            Err(err) if is_already_exists(&err) => Ok(LabelStatus::AlreadyExists),
            Err(err) => Err(err),
        }
    }

    async fn create_item(&self, item: &NewItem) -> Result<String, RemoteError> {
        let stage_err = |e: std::io::Error| {
            RemoteError::new(
                ErrorCategory::Unknown,
                format!("failed to stage issue body: {e}"),
            )
        };
        let mut body_file = tempfile::Builder::new()
            .prefix("issuegraph-body-")
            .suffix(".md")
            .tempfile()
            .map_err(stage_err)?;
        body_file
            .write_all(item.body.as_bytes())
            .and_then(|()| body_file.flush())
            .map_err(stage_err)?;

        let stdout = self
            .exec(&issue_create_args(item, body_file.path()))
            .await?;
        item_url(&stdout).map(str::to_string).ok_or_else(|| {
            RemoteError::new(
                ErrorCategory::Unknown,
                format!("gh issue create printed no issue URL: '{stdout}'"),
            )
        })
    }

    async fn add_item_to_project(
        &self,
        owner: &str,
        project_number: u64,
        item_url: &str,
    ) -> Result<(), RemoteError> {
        let args = vec![
            "project".to_string(),
            "item-add".to_string(),
            project_number.to_string(),
            "--owner".to_string(),
            owner.to_string(),
            "--url".to_string(),
            item_url.to_string(),
        ];
        self.exec(&args).await.map(|_| ())
    }
}

/// Scopes listed on the `Token scopes:` line of `gh auth status`, or `None`
/// when the line is absent (e.g. fine-grained tokens).
fn token_scopes(status: &str) -> Option<Vec<String>> {
    let line = status
        .lines()
        .find(|line| line.to_lowercase().contains("token scopes:"))?;
    let (_, scopes) = line.split_once(':')?;
    Some(
        scopes
            .split(',')
            .map(|s| s.trim().trim_matches('\'').to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    )
}

fn missing_scopes(scopes: &[String]) -> Vec<&'static str> {
    REQUIRED_SCOPES
        .iter()
        .copied()
        .filter(|required| !scopes.iter().any(|s| s == required))
        .collect()
}

/// Fail early when `gh` is missing or not logged in. Missing token scopes
/// only warn, since `gh` reports scopes inconsistently across token kinds.
pub async fn check_prerequisites() -> Result<()> {
    let version = Command::new("gh")
        .arg("--version")
        .output()
        .await
        .context("GitHub CLI ('gh') is not installed or not on PATH; see https://cli.github.com/")?;
    let version = String::from_utf8_lossy(&version.stdout);
    tracing::info!(
        version = version.lines().next().unwrap_or_default(),
        "Found GitHub CLI"
    );

    let status = Command::new("gh")
        .args(["auth", "status"])
        .output()
        .await
        .context("Failed to run 'gh auth status'")?;
    if !status.status.success() {
        anyhow::bail!("Not authenticated with the GitHub CLI; run 'gh auth login' first");
    }

    let text = format!(
        "{}\n{}",
        String::from_utf8_lossy(&status.stdout),
        String::from_utf8_lossy(&status.stderr)
    );
    if let Some(scopes) = token_scopes(&text) {
        let missing = missing_scopes(&scopes);
        if !missing.is_empty() {
            tracing::warn!(
                missing = %missing.join(", "),
                "Token may lack scopes; run 'gh auth refresh -s project,read:org,repo'"
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn item(labels: &[&str], assignees: &[&str]) -> NewItem {
        NewItem {
            repository: Repository::parse("acme/app").unwrap(),
            title: "Login form".into(),
            body: "body".into(),
            labels: labels.iter().map(ToString::to_string).collect(),
            assignees: assignees.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn issue_args_include_lists_only_when_present() {
        let path = Path::new("/tmp/body.md");
        let bare = issue_create_args(&item(&[], &[]), path);
        assert!(!bare.contains(&"--label".to_string()));
        assert!(!bare.contains(&"--assignee".to_string()));

        let full = issue_create_args(&item(&["bug", "ui"], &["alice"]), path);
        let tail: Vec<&str> = full[8..].iter().map(String::as_str).collect();
        assert_eq!(tail, vec!["--label", "bug,ui", "--assignee", "alice"]);
        assert_eq!(full[3], "acme/app");
        assert_eq!(full[7], "/tmp/body.md");
    }

    #[rstest]
    #[case("https://github.com/acme/app/issues/12\n", Some("https://github.com/acme/app/issues/12"))]
    #[case("Creating issue in acme/app\n\nhttps://github.com/acme/app/issues/3", Some("https://github.com/acme/app/issues/3"))]
    #[case("", None)]
    fn extracts_item_url(#[case] stdout: &str, #[case] expected: Option<&str>) {
        assert_eq!(item_url(stdout), expected);
    }

    #[test]
    fn existing_label_is_recognized() {
        let err = ClassificationTable::default().classify(
            "label with name \"bug\" already exists; use `--force` to update its color and description",
        );
        assert!(is_already_exists(&err));
    }

    #[test]
    fn scopes_are_parsed_from_auth_status() {
        let status = "github.com\n  ✓ Logged in to github.com account octo (keyring)\n  - Token scopes: 'gist', 'read:org', 'repo'\n";
        let scopes = token_scopes(status).unwrap();
        assert_eq!(scopes, vec!["gist", "read:org", "repo"]);
        assert_eq!(missing_scopes(&scopes), vec!["project"]);
    }

    #[test]
    fn absent_scope_line_is_not_an_error() {
        assert!(token_scopes("Logged in to github.com").is_none());
    }
}
