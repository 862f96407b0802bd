//! Run configuration model. Every key is optional; an empty document
//! yields [`RunConfig::default`].

use issuegraph_types::ErrorCategory;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_version")]
    pub version: String,
    /// Appended to the input file stem to name the output table.
    #[serde(default = "default_output_suffix")]
    pub output_suffix: String,
    #[serde(default)]
    pub checklist: ChecklistConfig,
    #[serde(default)]
    pub labels: LabelDefaults,
    #[serde(default)]
    pub retry: RetryConfig,
    /// Extra failure classification rules, checked before the built-in table.
    #[serde(default)]
    pub classification: Vec<ClassificationRule>,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_output_suffix() -> String {
    "_output".to_string()
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            output_suffix: default_output_suffix(),
            checklist: ChecklistConfig::default(),
            labels: LabelDefaults::default(),
            retry: RetryConfig::default(),
            classification: Vec::new(),
        }
    }
}

/// How a parent's body lists its children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistConfig {
    /// Heading placed above the appended checklist.
    #[serde(default = "default_heading")]
    pub heading: String,
    /// When the body contains this marker, the checklist replaces it instead
    /// of being appended.
    #[serde(default = "default_marker")]
    pub marker: String,
}

fn default_heading() -> String {
    "### Child Issues".to_string()
}

fn default_marker() -> String {
    "{{children}}".to_string()
}

impl Default for ChecklistConfig {
    fn default() -> Self {
        Self {
            heading: default_heading(),
            marker: default_marker(),
        }
    }
}

/// Attributes for labels created on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelDefaults {
    #[serde(default = "default_label_description")]
    pub description: String,
    /// Six hex digits, no `#`. When unset the color is derived from the
    /// label name.
    #[serde(default)]
    pub color: Option<String>,
}

fn default_label_description() -> String {
    "Created automatically by issuegraph".to_string()
}

impl Default for LabelDefaults {
    fn default() -> Self {
        Self {
            description: default_label_description(),
            color: None,
        }
    }
}

/// Retry budget and backoff bases for transient remote failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_fast_base_ms")]
    pub fast_base_ms: u64,
    #[serde(default = "default_normal_base_ms")]
    pub normal_base_ms: u64,
    #[serde(default = "default_slow_base_ms")]
    pub slow_base_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}
fn default_fast_base_ms() -> u64 {
    100
}
fn default_normal_base_ms() -> u64 {
    1_000
}
fn default_slow_base_ms() -> u64 {
    5_000
}
fn default_max_backoff_ms() -> u64 {
    60_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            fast_base_ms: default_fast_base_ms(),
            normal_base_ms: default_normal_base_ms(),
            slow_base_ms: default_slow_base_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Maps a case-insensitive substring of a remote error message to a
/// failure category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRule {
    pub pattern: String,
    pub category: ErrorCategory,
}
