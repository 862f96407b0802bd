//! Run configuration YAML parsing with environment variable substitution.

use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::{Captures, Regex};

use crate::config::types::RunConfig;

static ENV_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid env var regex"));

/// Expand `${NAME}` references (label color, description, classification
/// patterns) from the environment. Checklist markers such as
/// `{{children}}` have no `$` and pass through unchanged.
///
/// # Errors
///
/// Lists each unset variable once, in first-reference order.
pub fn substitute_env_vars(input: &str) -> Result<String> {
    let mut unset: Vec<String> = Vec::new();
    let expanded = ENV_VAR_RE.replace_all(input, |caps: &Captures<'_>| {
        std::env::var(&caps[1]).unwrap_or_else(|_| {
            if !unset.iter().any(|name| name == &caps[1]) {
                unset.push(caps[1].to_string());
            }
            String::new()
        })
    });

    if !unset.is_empty() {
        anyhow::bail!(
            "Run config references unset environment variable(s): {}",
            unset.join(", ")
        );
    }
    Ok(expanded.into_owned())
}

/// Parse a run configuration string (after env var substitution).
///
/// # Errors
///
/// Returns an error if env var substitution fails or the YAML is invalid.
pub fn parse_config_str(yaml_str: &str) -> Result<RunConfig> {
    let substituted = substitute_env_vars(yaml_str)?;
    if substituted.trim().is_empty() {
        return Ok(RunConfig::default());
    }
    let config: RunConfig =
        serde_yaml::from_str(&substituted).context("Failed to parse run config YAML")?;
    Ok(config)
}

/// Parse a run configuration file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the YAML is invalid.
pub fn parse_config(path: &Path) -> Result<RunConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read run config file: {}", path.display()))?;
    parse_config_str(&content)
}
