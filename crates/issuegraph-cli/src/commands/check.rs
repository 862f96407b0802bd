use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use issuegraph_engine::{plan_batch, BatchPlan, EngineError, RunOptions};
use issuegraph_state::ResumeSnapshot;

use super::load_config;

/// Execute the `check` command: validate the input and print the planned
/// creation order. Makes no remote calls and writes nothing.
pub fn execute(input: &Path, config_path: Option<&Path>) -> Result<ExitCode> {
    let config = load_config(config_path)?;
    println!("Run config:        OK");

    let plan = match plan_batch(input) {
        Ok(plan) => plan,
        Err(EngineError::Preflight(issues)) => {
            println!("Input structure:   FAILED");
            for issue in &issues {
                println!("  - {issue}");
            }
            anyhow::bail!("{} validation issue(s) found", issues.len());
        }
        Err(err) => return Err(err.into()),
    };
    println!(
        "Input structure:   OK ({} rows, {} trees)",
        plan.len(),
        plan.validated.forest.roots().len()
    );

    let output = RunOptions::new(input).output_path(&config);
    println!("Output file:       {}", output.display());
    if output.exists() {
        match ResumeSnapshot::load(&output) {
            Ok(snapshot) => {
                let resumable = plan
                    .order
                    .iter()
                    .filter(|id| {
                        snapshot
                            .created_url(&plan.validated.graph.node(**id).row.title)
                            .is_some()
                    })
                    .count();
                println!("Resumable:         {resumable} row(s) already created (use --resume)");
            }
            Err(err) => println!("Resumable:         unreadable ({err})"),
        }
    }

    println!("\nCreation order (children first):");
    for line in order_lines(&plan) {
        println!("{line}");
    }
    Ok(ExitCode::SUCCESS)
}

fn order_lines(plan: &BatchPlan) -> Vec<String> {
    let graph = &plan.validated.graph;
    plan.order
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let row = &graph.node(*id).row;
            let depth = graph.depth(*id).unwrap_or_default();
            format!(
                "{:>4}. {}{} [{}]",
                i + 1,
                "  ".repeat(depth),
                row.title,
                row.repository
            )
        })
        .collect()
}
