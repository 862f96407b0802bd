//! Engine error model and remote failure classification.
//!
//! The remote collaborator (the `gh` CLI) only reports failures as text, so
//! the mapping from message text to [`ErrorCategory`] lives here, in one
//! table, instead of being scattered across call sites.

use std::sync::LazyLock;

use issuegraph_state::StateError;
use issuegraph_types::{ErrorCategory, RemoteError, ValidationIssue};
use regex::Regex;

use crate::config::ClassificationRule;

// ---------------------------------------------------------------------------
// EngineError
// ---------------------------------------------------------------------------

/// Batch-level failure. Row-level remote failures never surface here; they
/// become [`Outcome::Failed`](issuegraph_types::Outcome::Failed) records.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Input table could not be read.
    #[error("failed to read input '{path}': {source}")]
    Input {
        path: String,
        #[source]
        source: StateError,
    },

    /// One or more structural or field problems; nothing was sent remotely.
    #[error("preflight validation failed ({} issue(s)):\n  - {}", .0.len(), format_issues(.0))]
    Preflight(Vec<ValidationIssue>),

    /// Resume table could not be read.
    #[error("failed to load resume snapshot '{path}': {source}")]
    Resume {
        path: String,
        #[source]
        source: StateError,
    },

    /// Output table could not be opened.
    #[error("failed to open output '{path}': {source}")]
    Output {
        path: String,
        #[source]
        source: StateError,
    },

    /// A record could not be made durable. The batch stops so no row's
    /// outcome is lost.
    #[error("failed to persist outcome for '{title}': {source}")]
    Ledger {
        title: String,
        #[source]
        source: StateError,
    },
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n  - ")
}

impl EngineError {
    /// Preflight issues, if this is a validation failure.
    #[must_use]
    pub fn issues(&self) -> Option<&[ValidationIssue]> {
        match self {
            Self::Preflight(issues) => Some(issues),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Classification table
// ---------------------------------------------------------------------------

/// Built-in classification rules, checked in order; the first matching
/// (case-insensitive) substring decides the category.
///
/// | pattern                               | category            |
/// |---------------------------------------|---------------------|
/// | rate limit / submitted too quickly / 429 | `rate_limit`     |
/// | 500 / 502 / 503 / 504, gateway, unavailable | `server`      |
/// | reset / refused / timeout / EOF / DNS | `transient_network` |
/// | 401, bad credentials, `gh auth login` | `auth`              |
/// | 403, not accessible, scopes           | `permission`        |
/// | could not resolve, 404, not found     | `not_found`         |
/// | 422, validation failed                | `validation`        |
///
/// Rate-limit rules come first because secondary rate limits are reported
/// with HTTP 403.
pub const BUILTIN_RULES: &[(&str, ErrorCategory)] = &[
    ("api rate limit exceeded", ErrorCategory::RateLimit),
    ("secondary rate limit", ErrorCategory::RateLimit),
    ("rate limit", ErrorCategory::RateLimit),
    ("was submitted too quickly", ErrorCategory::RateLimit),
    ("http 429", ErrorCategory::RateLimit),
    ("http 500", ErrorCategory::Server),
    ("http 502", ErrorCategory::Server),
    ("http 503", ErrorCategory::Server),
    ("http 504", ErrorCategory::Server),
    ("internal server error", ErrorCategory::Server),
    ("bad gateway", ErrorCategory::Server),
    ("service unavailable", ErrorCategory::Server),
    ("gateway timeout", ErrorCategory::Server),
    ("connection reset", ErrorCategory::TransientNetwork),
    ("connection refused", ErrorCategory::TransientNetwork),
    ("i/o timeout", ErrorCategory::TransientNetwork),
    ("timed out", ErrorCategory::TransientNetwork),
    ("tls handshake", ErrorCategory::TransientNetwork),
    ("unexpected eof", ErrorCategory::TransientNetwork),
    ("no such host", ErrorCategory::TransientNetwork),
    ("http 401", ErrorCategory::Auth),
    ("bad credentials", ErrorCategory::Auth),
    ("gh auth login", ErrorCategory::Auth),
    ("not logged in", ErrorCategory::Auth),
    ("authentication", ErrorCategory::Auth),
    ("http 403", ErrorCategory::Permission),
    ("resource not accessible", ErrorCategory::Permission),
    ("missing required scopes", ErrorCategory::Permission),
    ("does not have permission", ErrorCategory::Permission),
    ("could not resolve to", ErrorCategory::NotFound),
    ("http 404", ErrorCategory::NotFound),
    ("not found", ErrorCategory::NotFound),
    ("http 422", ErrorCategory::Validation),
    ("validation failed", ErrorCategory::Validation),
];

static MISSING_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"could not add label: '(.*?)' not found").expect("valid missing label regex")
});

static RETRY_AFTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)retry[- ]after:?\s*(\d+)").expect("valid retry-after regex")
});

/// Ordered substring rules mapping remote error text to a category.
#[derive(Debug, Clone)]
pub struct ClassificationTable {
    rules: Vec<(String, ErrorCategory)>,
}

impl Default for ClassificationTable {
    fn default() -> Self {
        Self::with_rules(&[])
    }
}

impl ClassificationTable {
    /// Built-in table with `extra` rules checked first.
    #[must_use]
    pub fn with_rules(extra: &[ClassificationRule]) -> Self {
        let rules = extra
            .iter()
            .map(|r| (r.pattern.to_lowercase(), r.category))
            .chain(
                BUILTIN_RULES
                    .iter()
                    .map(|(pattern, category)| ((*pattern).to_string(), *category)),
            )
            .collect();
        Self { rules }
    }

    /// Category for a raw error message; [`ErrorCategory::Unknown`] when no
    /// rule matches.
    #[must_use]
    pub fn category_of(&self, message: &str) -> ErrorCategory {
        let lowered = message.to_lowercase();
        self.rules
            .iter()
            .find(|(pattern, _)| lowered.contains(pattern.as_str()))
            .map_or(ErrorCategory::Unknown, |(_, category)| *category)
    }

    /// Turn a raw error message into a [`RemoteError`].
    ///
    /// A missing-label report takes precedence over every rule: it is the
    /// signal the reconciler heals from.
    #[must_use]
    pub fn classify(&self, message: &str) -> RemoteError {
        let message = message.trim();
        if let Some(cap) = MISSING_LABEL_RE.captures(message) {
            return RemoteError::missing_label(&cap[1], message);
        }

        let category = self.category_of(message);
        let mut err = RemoteError::new(category, message);
        if category == ErrorCategory::RateLimit {
            err.retry_after_ms = RETRY_AFTER_RE
                .captures(message)
                .and_then(|cap| cap[1].parse::<u64>().ok())
                .map(|secs| secs.saturating_mul(1_000));
        }
        err
    }
}
