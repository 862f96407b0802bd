//! Semantic validation for parsed run configuration values.

use anyhow::{bail, Result};

use crate::config::types::RunConfig;

const MAX_RETRIES_LIMIT: u32 = 10;

fn is_hex_color(value: &str) -> bool {
    value.len() == 6 && value.chars().all(|c| c.is_ascii_hexdigit())
}

/// Validate a parsed run configuration.
/// Returns `Ok(())` if valid, Err with all validation errors if not.
///
/// # Errors
///
/// Returns an error listing all validation failures found in the config.
pub fn validate_config(config: &RunConfig) -> Result<()> {
    let mut errors = Vec::new();

    if config.version != "1.0" {
        errors.push(format!(
            "Unsupported config version '{}', expected '1.0'",
            config.version
        ));
    }

    if config.output_suffix.trim().is_empty() {
        errors.push("output_suffix must not be empty".to_string());
    }
    if config.output_suffix.contains(['/', '\\']) {
        errors.push(format!(
            "output_suffix '{}' must not contain path separators",
            config.output_suffix
        ));
    }

    if config.checklist.heading.trim().is_empty() {
        errors.push("checklist.heading must not be empty".to_string());
    }
    if config.checklist.marker.trim().is_empty() {
        errors.push("checklist.marker must not be empty".to_string());
    }

    if let Some(color) = &config.labels.color {
        if !is_hex_color(color) {
            errors.push(format!(
                "labels.color '{color}' must be six hex digits without '#'"
            ));
        }
    }

    let retry = &config.retry;
    if retry.max_retries > MAX_RETRIES_LIMIT {
        errors.push(format!(
            "retry.max_retries must be at most {MAX_RETRIES_LIMIT}, got {}",
            retry.max_retries
        ));
    }
    for (name, base) in [
        ("fast_base_ms", retry.fast_base_ms),
        ("normal_base_ms", retry.normal_base_ms),
        ("slow_base_ms", retry.slow_base_ms),
    ] {
        if base > retry.max_backoff_ms {
            errors.push(format!(
                "retry.{name} ({base}) exceeds retry.max_backoff_ms ({})",
                retry.max_backoff_ms
            ));
        }
    }

    for (i, rule) in config.classification.iter().enumerate() {
        if rule.pattern.trim().is_empty() {
            errors.push(format!("classification[{i}]: pattern must not be empty"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        bail!("Run config validation failed:\n  - {}", errors.join("\n  - "));
    }
}
