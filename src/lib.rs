#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

pub mod annotate;
pub mod context;
pub mod emit;
mod error;
pub mod exec;
pub mod graphml;
pub mod merge;
pub mod model;
pub mod movement;
pub mod sanitize;

use camino::{Utf8Path, Utf8PathBuf};
use rayon::iter::{IntoParallelIterator, ParallelIterator};

pub use crate::context::RunContext;
pub use crate::error::*;
pub use crate::model::{
    DependencyEdge, EnrichedArtifact, MovementEvent, TargetRegion, TaskGraph, TaskNode,
};
pub use crate::movement::MovementLog;
pub use crate::sanitize::SanitizeReport;

/// The input files of a single run.
#[derive(Debug, Clone)]
pub struct RunInputs {
    /// Raw dependency graph dumped by the trace writer.
    pub graph: Utf8PathBuf,
    /// Movement log, when the run produced one. `None` yields an empty
    /// `target` list; graph-only traces predate the movement log and stay
    /// valid inputs.
    pub movement: Option<Utf8PathBuf>,
}

/// What a completed run produced.
#[derive(Debug)]
pub struct RunOutcome {
    /// Path of the written artifact; `None` in test mode.
    pub artifact: Option<Utf8PathBuf>,
    pub sanitize: SanitizeReport,
    /// Number of target regions attached to the artifact.
    pub regions: usize,
    /// Recoverable problems encountered along the way: skipped movement log
    /// rows and region boundaries that match no graph node.
    pub warnings: Vec<String>,
}

/// Run the full enrichment pipeline once.
///
/// Optionally runs the instrumented executable named in the context, then
/// loads and sanitizes the raw graph, annotates it, parses the movement log,
/// merges both and emits the artifact. Any returned error aborts the run
/// before an artifact is written.
pub fn run(ctx: &RunContext, inputs: &RunInputs) -> Result<RunOutcome, PipelineError> {
    if let Some(exe) = ctx.executable.clone() {
        if !exe.exists() {
            return Err(SetupError::MissingExecutable(exe).into());
        }
        exec::run_traced(ctx, &exe)?;
    }

    if !inputs.graph.exists() {
        return Err(SetupError::MissingInput(inputs.graph.clone()).into());
    }

    let mut graph = graphml::load_graph(&inputs.graph)?;
    let report = sanitize::sanitize(&mut graph);
    annotate::annotate(&mut graph);

    let movement = match &inputs.movement {
        Some(path) => {
            if !path.exists() {
                return Err(SetupError::MissingMovementLog(path.clone()).into());
            }
            movement::load_movement_log(path)?
        }
        None => {
            tracing::info!("No movement log for this run, the target list will be empty");
            MovementLog::default()
        }
    };

    let mut warnings = movement.warnings;
    let artifact = merge::merge(&graph, movement.regions);
    let regions = artifact.target.len();

    for warning in merge::consistency_warnings(&artifact) {
        tracing::warn!("{warning}");
        warnings.push(warning);
    }

    let written = emit::emit(ctx, &artifact)?;

    Ok(RunOutcome {
        artifact: written,
        sanitize: report,
        regions,
        warnings,
    })
}

/// One executable to run and convert as part of a batch.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub executable: Utf8PathBuf,
    pub inputs: RunInputs,
}

/// Result of one batch item, successful or not.
#[derive(Debug)]
pub struct BatchOutcome {
    pub executable: Utf8PathBuf,
    pub result: Result<RunOutcome, PipelineError>,
}

/// Run one pipeline per executable.
///
/// Every item gets its own [`RunContext`], so items share no mutable state
/// and their artifact names cannot collide. A failing item is logged and
/// recorded in its outcome; the remaining items are unaffected. Outcomes come
/// back in input order.
pub fn run_batch(
    data_dir: &Utf8Path,
    items: Vec<BatchItem>,
    test_mode: bool,
) -> Vec<BatchOutcome> {
    items
        .into_par_iter()
        .map(|item| {
            let ctx = RunContext::new(data_dir, Some(item.executable.clone()), test_mode);
            let result = run(&ctx, &item.inputs);
            if let Err(err) = &result {
                tracing::error!("Run for {} failed: {err}", item.executable);
            }
            BatchOutcome {
                executable: item.executable,
                result,
            }
        })
        .collect()
}
