use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use issuegraph_engine::{run_batch, BatchReport, ClassificationTable, RunOptions};

use super::load_config;
use crate::gh::{self, GhCli};

pub struct RunArgs {
    pub input: PathBuf,
    pub config: Option<PathBuf>,
    pub resume: bool,
    pub resume_from: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub json: bool,
}

/// Execute the `run` command: check `gh`, validate, and upload the batch.
pub async fn execute(args: &RunArgs) -> Result<ExitCode> {
    let config = load_config(args.config.as_deref())?;

    gh::check_prerequisites()
        .await
        .context("GitHub CLI prerequisites not met")?;

    let options = RunOptions {
        input: args.input.clone(),
        output: args.output.clone(),
        resume: args.resume,
        resume_from: args.resume_from.clone(),
    };
    let tracker = GhCli::new(ClassificationTable::with_rules(&config.classification));

    let report = run_batch(&config, &options, &tracker)
        .await
        .with_context(|| format!("Batch failed: {}", args.input.display()))?;

    print_report(&report);
    if args.json {
        let json = serde_json::json!({
            "created": report.summary.created,
            "skipped": report.summary.skipped,
            "failed": report.summary.failed,
            "warnings": report.summary.warnings,
            "failed_titles": report.summary.failed_titles,
            "resumed_entries": report.resumed_entries,
            "output": report.output_path.display().to_string(),
            "duration_secs": report.duration_secs,
        });
        println!("{json}");
    }

    if report.summary.has_failures() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_report(report: &BatchReport) {
    let summary = &report.summary;
    println!("Batch completed.");
    println!("  Created:         {}", summary.created);
    println!("  Skipped:         {}", summary.skipped);
    println!("  Failed:          {}", summary.failed);
    if summary.warnings > 0 {
        println!("  Warnings:        {}", summary.warnings);
    }
    println!("  Output:          {}", report.output_path.display());
    println!("  Duration:        {:.2}s", report.duration_secs);
    if !summary.failed_titles.is_empty() {
        println!("\nFailed rows (see the output file for errors):");
        for title in &summary.failed_titles {
            println!("  - {title}");
        }
        println!("Re-run with --resume to retry only these rows.");
    }
}
