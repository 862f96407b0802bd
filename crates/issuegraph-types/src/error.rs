//! Error taxonomy for remote calls and preflight validation.
//!
//! [`RemoteError`] carries classification and retry metadata for a failed
//! call against the issue tracker. [`ValidationIssue`] describes one
//! structural or field problem found before any remote call is made.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Broad classification of a remote failure.
///
/// Determines retry behavior: only [`RateLimit`](Self::RateLimit),
/// [`TransientNetwork`](Self::TransientNetwork) and [`Server`](Self::Server)
/// are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Credentials missing or rejected.
    Auth,
    /// Authenticated but not allowed.
    Permission,
    /// Repository, project, or user does not exist.
    NotFound,
    /// Payload rejected by the service.
    Validation,
    /// Item creation referenced a label that does not exist yet.
    MissingLabel,
    /// Rate limit exceeded (retryable).
    RateLimit,
    /// Connection-level failure (retryable).
    TransientNetwork,
    /// 5xx from the service (retryable).
    Server,
    /// Anything the classification table does not recognize.
    Unknown,
}

impl ErrorCategory {
    /// Whether failures of this category are worth retrying.
    #[must_use]
    pub fn is_transient(self) -> bool {
        matches!(self, Self::RateLimit | Self::TransientNetwork | Self::Server)
    }

    /// Default backoff strategy for this category.
    #[must_use]
    pub fn backoff_class(self) -> BackoffClass {
        match self {
            Self::RateLimit => BackoffClass::Slow,
            Self::TransientNetwork | Self::Server => BackoffClass::Normal,
            _ => BackoffClass::Fast,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Auth => "auth",
            Self::Permission => "permission",
            Self::NotFound => "not_found",
            Self::Validation => "validation",
            Self::MissingLabel => "missing_label",
            Self::RateLimit => "rate_limit",
            Self::TransientNetwork => "transient_network",
            Self::Server => "server",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Retry backoff strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffClass {
    /// Millisecond-scale retry.
    Fast,
    /// Second-scale retry.
    Normal,
    /// Multi-second retry (rate limits).
    Slow,
}

/// Failure of a single remote call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("[{category}] {message}")]
pub struct RemoteError {
    pub category: ErrorCategory,
    pub message: String,
    /// Server-provided wait hint, if any.
    pub retry_after_ms: Option<u64>,
    /// Label name for [`ErrorCategory::MissingLabel`] failures.
    pub missing_label: Option<String>,
}

impl RemoteError {
    #[must_use]
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            retry_after_ms: None,
            missing_label: None,
        }
    }

    /// Rate limit error with an optional wait hint.
    #[must_use]
    pub fn rate_limit(message: impl Into<String>, retry_after_ms: Option<u64>) -> Self {
        let mut err = Self::new(ErrorCategory::RateLimit, message);
        err.retry_after_ms = retry_after_ms;
        err
    }

    /// Item creation referenced a label the repository does not have.
    #[must_use]
    pub fn missing_label(label: impl Into<String>, message: impl Into<String>) -> Self {
        let mut err = Self::new(ErrorCategory::MissingLabel, message);
        err.missing_label = Some(label.into());
        err
    }

    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category.is_transient()
    }

    #[must_use]
    pub fn backoff_class(&self) -> BackoffClass {
        self.category.backoff_class()
    }
}

/// Kind of preflight violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    DuplicateTitle,
    DanglingParent,
    Cycle,
    DepthExceeded,
    MissingColumn,
    MissingField,
    MalformedRepository,
    InvalidProjectNumber,
}

impl ViolationKind {
    /// Graph-level problems, as opposed to per-row field problems.
    #[must_use]
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            Self::DuplicateTitle | Self::DanglingParent | Self::Cycle | Self::DepthExceeded
        )
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::DuplicateTitle => "duplicate_title",
            Self::DanglingParent => "dangling_parent",
            Self::Cycle => "cycle",
            Self::DepthExceeded => "depth_exceeded",
            Self::MissingColumn => "missing_column",
            Self::MissingField => "missing_field",
            Self::MalformedRepository => "malformed_repository",
            Self::InvalidProjectNumber => "invalid_project_number",
        };
        f.write_str(s)
    }
}

/// One problem found by preflight validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Zero-based data row index; `None` for table-level problems.
    pub row: Option<usize>,
    pub kind: ViolationKind,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row {
            Some(index) => write!(f, "Row {} [{}]: {}", index + 2, self.kind, self.message),
            None => write!(f, "[{}]: {}", self.kind, self.message),
        }
    }
}
