use camino::Utf8PathBuf;
use thiserror::Error;

/// Top-level error for a single pipeline run. Each variant corresponds to one
/// stage of the run; any of them aborts that run without producing a partial
/// artifact.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error("Error while running the instrumented executable.\n{0}")]
    Exec(#[from] ExecError),

    #[error("Error while loading the dependency graph.\n{0}")]
    Graph(#[from] GraphLoadError),

    #[error("Error while reading the movement log.\n{0}")]
    Movement(#[from] MovementError),

    #[error("Error while emitting the artifact.\n{0}")]
    Emit(#[from] EmitError),
}

/// Preconditions checked before any work starts.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Input file '{0}' does not exist")]
    MissingInput(Utf8PathBuf),

    #[error("Executable '{0}' does not exist")]
    MissingExecutable(Utf8PathBuf),

    #[error("Movement log '{0}' does not exist")]
    MissingMovementLog(Utf8PathBuf),

    #[error("Couldn't create the data directory.\n{0}")]
    DataDir(#[source] std::io::Error),
}

/// A raw graph that cannot be loaded is fatal for the run; there is nothing
/// sensible to visualize without it.
#[derive(Debug, Error)]
pub enum GraphLoadError {
    #[error("Couldn't read the graph file.\n{0}")]
    FileSystem(#[from] std::io::Error),

    #[error("Couldn't parse the graph markup.\n{0}")]
    Markup(#[from] quick_xml::Error),

    #[error("Malformed attribute.\n{0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("Malformed escape sequence.\n{0}")]
    Escape(#[from] quick_xml::escape::EscapeError),

    #[error("A <{0}> element appeared outside its expected parent")]
    Structure(&'static str),

    #[error("Edge references unknown node '{0}'")]
    UnknownEndpoint(String),

    #[error("Value '{value}' is not a valid {ty} for attribute '{key}'")]
    Value {
        key: String,
        ty: &'static str,
        value: String,
    },
}

/// Movement log I/O failure. Malformed individual rows are *not* errors; the
/// parser skips them and records a warning instead.
#[derive(Debug, Error)]
pub enum MovementError {
    #[error("Couldn't read the movement log.\n{0}")]
    FileSystem(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Couldn't spawn '{exe}'.\n{source}")]
    Spawn {
        exe: Utf8PathBuf,
        source: std::io::Error,
    },

    #[error("'{exe}' did not finish within {secs}s")]
    Timeout { exe: Utf8PathBuf, secs: u64 },

    #[error("'{exe}' exited with {status}.\n{stderr}")]
    Failed {
        exe: Utf8PathBuf,
        status: String,
        stderr: String,
    },

    #[error("Couldn't capture the output of '{0}'")]
    Capture(Utf8PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("Couldn't serialize the artifact.\n{0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Couldn't write the artifact.\n{0}")]
    FileSystem(#[from] std::io::Error),
}
