//! Batch orchestrator: reads the input, validates, schedules, and runs the
//! upload engine against a durable ledger.

use std::path::{Path, PathBuf};
use std::time::Instant;

use issuegraph_state::{
    output_path_for, read_input, CsvOutcomeLedger, InputTable, LedgerMode, ResumeSnapshot,
};
use issuegraph_types::Row;

use crate::config::RunConfig;
use crate::errors::EngineError;
use crate::graph::{Graph, NodeId};
use crate::preflight::{validate, ValidatedGraph};
use crate::remote::IssueTracker;
use crate::result::BatchReport;
use crate::schedule::schedule;
use crate::upload::UploadEngine;

/// Where a run reads from and writes to.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub input: PathBuf,
    /// Output table; derived from the input path when unset.
    pub output: Option<PathBuf>,
    /// Skip rows a prior run created, and append to the output table.
    pub resume: bool,
    /// Prior table to resume from; implies `resume`. Defaults to the output
    /// table.
    pub resume_from: Option<PathBuf>,
}

impl RunOptions {
    #[must_use]
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn output_path(&self, config: &RunConfig) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| output_path_for(&self.input, &config.output_suffix))
    }

    #[must_use]
    pub fn resumes(&self) -> bool {
        self.resume || self.resume_from.is_some()
    }
}

/// A validated batch and its bottom-up order.
#[derive(Debug, Clone)]
pub struct BatchPlan {
    pub validated: ValidatedGraph,
    pub order: Vec<NodeId>,
}

impl BatchPlan {
    /// Validate and schedule an already read table.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Preflight`] with every issue found.
    pub fn from_table(table: InputTable) -> Result<Self, EngineError> {
        let missing = table.missing_columns();
        let rows: Vec<Row> = table
            .rows
            .into_iter()
            .enumerate()
            .map(|(index, raw)| Row::from_raw(index, raw))
            .collect();
        let validated = validate(Graph::build(rows), &missing).map_err(EngineError::Preflight)?;
        let order = schedule(&validated.graph, &validated.forest);
        Ok(Self { validated, order })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Read, validate, and schedule `input`. Touches nothing but the input.
///
/// # Errors
///
/// Returns [`EngineError::Input`] if the table cannot be read and
/// [`EngineError::Preflight`] if it does not validate.
pub fn plan_batch(input: &Path) -> Result<BatchPlan, EngineError> {
    let table = read_input(input).map_err(|source| EngineError::Input {
        path: input.display().to_string(),
        source,
    })?;
    let plan = BatchPlan::from_table(table)?;
    tracing::info!(
        input = %input.display(),
        rows = plan.len(),
        roots = plan.validated.forest.roots().len(),
        "Batch validated"
    );
    Ok(plan)
}

fn load_snapshot(options: &RunOptions, output: &Path) -> Result<ResumeSnapshot, EngineError> {
    if !options.resumes() {
        return Ok(ResumeSnapshot::empty());
    }
    let source = options.resume_from.as_deref().unwrap_or(output);
    if options.resume_from.is_none() && !source.exists() {
        tracing::info!(
            path = %source.display(),
            "No prior output to resume from, starting fresh"
        );
        return Ok(ResumeSnapshot::empty());
    }
    ResumeSnapshot::load(source).map_err(|source_err| EngineError::Resume {
        path: source.display().to_string(),
        source: source_err,
    })
}

/// Items a prior run recorded as created in `output`; zero when the file is
/// absent or unreadable.
fn created_in(output: &Path) -> usize {
    std::fs::File::open(output)
        .ok()
        .and_then(|file| ResumeSnapshot::from_reader(file, &output.display().to_string()).ok())
        .map_or(0, |prior| prior.created_count())
}

/// Run a whole batch against `tracker`.
///
/// The resume snapshot is read before the output table is opened, so a
/// run may resume from and append to the same file. Nothing is written
/// when preflight fails.
///
/// # Errors
///
/// Returns an [`EngineError`] for input, preflight, resume, or ledger
/// failures. Remote failures only fail their rows.
pub async fn run_batch<T: IssueTracker>(
    config: &RunConfig,
    options: &RunOptions,
    tracker: &T,
) -> Result<BatchReport, EngineError> {
    let start = Instant::now();
    let plan = plan_batch(&options.input)?;

    let output = options.output_path(config);
    let snapshot = load_snapshot(options, &output)?;
    let resumed_entries = snapshot.len();

    let mode = if options.resumes() {
        LedgerMode::Append
    } else {
        let created = created_in(&output);
        if created > 0 {
            tracing::warn!(
                output = %output.display(),
                created,
                "Overwriting an output that records created items; pass --resume to skip them instead"
            );
        }
        LedgerMode::Truncate
    };
    let ledger = CsvOutcomeLedger::open(&output, mode).map_err(|source| EngineError::Output {
        path: output.display().to_string(),
        source,
    })?;
    tracing::info!(
        output = %output.display(),
        ?mode,
        resumed_entries,
        "Starting batch"
    );

    let mut engine = UploadEngine::new(tracker, ledger, snapshot, config);
    let summary = engine.run(&plan.validated, &plan.order).await?;

    Ok(BatchReport {
        summary,
        output_path: output,
        resumed_entries,
        duration_secs: start.elapsed().as_secs_f64(),
    })
}
