pub mod check;
pub mod run;

use std::path::Path;

use anyhow::{Context, Result};
use issuegraph_engine::config::parser;
use issuegraph_engine::config::validator;
use issuegraph_engine::config::RunConfig;

/// Parse and validate the run configuration, or use the defaults when no
/// file was given.
pub fn load_config(path: Option<&Path>) -> Result<RunConfig> {
    let Some(path) = path else {
        return Ok(RunConfig::default());
    };
    let config = parser::parse_config(path)
        .with_context(|| format!("Failed to parse run config: {}", path.display()))?;
    validator::validate_config(&config)?;
    tracing::debug!(path = %path.display(), "Run config loaded");
    Ok(config)
}
