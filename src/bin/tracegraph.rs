use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use console::style;
use tracegraph::{BatchItem, RunContext, RunInputs, SetupError};
use tracing_subscriber::EnvFilter;

/// Convert instrumented OpenMP run traces into an enriched visualization
/// artifact, optionally running the instrumented executables first.
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
struct Args {
    /// Raw dependency graph file name, resolved inside the data directory.
    #[clap(long, default_value = "rawgraphml.txt")]
    input: String,

    /// Movement log path. Defaults to `datamove.txt` inside the data
    /// directory when that file exists.
    #[clap(long)]
    movement: Option<Utf8PathBuf>,

    /// Instrumented executable to run before conversion. Pass multiple times
    /// to process a batch, one artifact per executable.
    #[clap(long = "exe")]
    executables: Vec<Utf8PathBuf>,

    /// Directory holding the trace files and receiving the artifacts.
    #[clap(long, default_value = "data")]
    data_dir: Utf8PathBuf,

    /// Mark this run as a test: validate everything, write no artifact.
    #[clap(long)]
    test: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    eprintln!(
        "Running {} in {} mode.",
        style("tracegraph").red(),
        style(if args.test { "test" } else { "convert" }).blue(),
    );

    match dispatch(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:?}");
            ExitCode::FAILURE
        }
    }
}

fn dispatch(args: Args) -> anyhow::Result<()> {
    if let Err(err) = std::fs::create_dir_all(&args.data_dir) {
        return Err(SetupError::DataDir(err).into());
    }

    let inputs = resolve_inputs(&args)?;

    match args.executables.as_slice() {
        // Convert pre-existing trace files without running anything.
        [] => {
            let ctx = RunContext::new(&args.data_dir, None, args.test);
            tracegraph::run(&ctx, &inputs)?;
            Ok(())
        }
        [exe] => {
            let ctx = RunContext::new(&args.data_dir, Some(exe.clone()), args.test);
            tracegraph::run(&ctx, &inputs)?;
            Ok(())
        }
        batch => {
            let items = batch
                .iter()
                .map(|exe| BatchItem {
                    executable: exe.clone(),
                    inputs: inputs.clone(),
                })
                .collect();

            let outcomes = tracegraph::run_batch(&args.data_dir, items, args.test);
            let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
            tracing::info!(
                "Batch finished: {} converted, {} failed",
                outcomes.len() - failed,
                failed
            );

            // Individual failures were already logged; the batch itself only
            // fails when nothing was converted.
            if failed == outcomes.len() {
                anyhow::bail!("every batch item failed");
            }
            Ok(())
        }
    }
}

fn resolve_inputs(args: &Args) -> anyhow::Result<RunInputs> {
    let movement = match &args.movement {
        Some(path) => {
            if !path.exists() {
                return Err(SetupError::MissingMovementLog(path.clone()).into());
            }
            Some(path.clone())
        }
        None => {
            let default = args.data_dir.join("datamove.txt");
            if default.exists() {
                Some(default)
            } else {
                None
            }
        }
    };

    Ok(RunInputs {
        graph: args.data_dir.join(&args.input),
        movement,
    })
}
