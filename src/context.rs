//! Immutable per-run state.
//!
//! Everything that used to be ambient (the shared timestamp, the data
//! directory, the dry-run flag) lives in a [`RunContext`] constructed once at
//! the start of a run and passed by reference to each stage. Batch mode
//! builds one context per executable, which is what makes items safe to run
//! concurrently.

use camino::{Utf8Path, Utf8PathBuf};
use chrono::Local;

/// Two-digit year, month, day, hour, minute, second.
pub const TIMESTAMP_FORMAT: &str = "%y%m%d-%H%M%S";

#[derive(Debug, Clone)]
pub struct RunContext {
    /// Directory holding the run's inputs and receiving its outputs.
    pub data_dir: Utf8PathBuf,
    /// Captured once; every name derived during this run uses the same value.
    pub timestamp: String,
    /// The instrumented executable driving this run, if any.
    pub executable: Option<Utf8PathBuf>,
    /// Dry run: validate everything, write nothing.
    pub test_mode: bool,
}

impl RunContext {
    pub fn new(
        data_dir: impl Into<Utf8PathBuf>,
        executable: Option<Utf8PathBuf>,
        test_mode: bool,
    ) -> Self {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        Self::with_timestamp(data_dir, executable, test_mode, timestamp)
    }

    /// Like [`RunContext::new`] with an explicit timestamp. Used by tests to
    /// get deterministic artifact names.
    pub fn with_timestamp(
        data_dir: impl Into<Utf8PathBuf>,
        executable: Option<Utf8PathBuf>,
        test_mode: bool,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            timestamp: timestamp.into(),
            executable,
            test_mode,
        }
    }

    /// Base name of the executable, when the run is driven by one.
    pub fn executable_name(&self) -> Option<&str> {
        self.executable.as_deref().and_then(Utf8Path::file_name)
    }

    /// Where the enriched artifact goes. The timestamp keeps separate runs
    /// from overwriting each other; the executable prefix keeps batch items
    /// apart.
    pub fn artifact_path(&self) -> Utf8PathBuf {
        let name = match self.executable_name() {
            Some(exe) => format!("{exe}-output{}.json", self.timestamp),
            None => format!("output{}.json", self.timestamp),
        };
        self.data_dir.join(name)
    }

    /// Where the captured output of the instrumented executable goes.
    pub fn runlog_path(&self) -> Utf8PathBuf {
        let name = match self.executable_name() {
            Some(exe) => format!("{exe}-runlog.txt"),
            None => "runlog.txt".to_string(),
        };
        self.data_dir.join(name)
    }
}
