//! Running the instrumented executable.
//!
//! The pipeline can be asked to run the traced program itself before
//! converting its outputs. The child is given a bounded wait; a hung
//! instrumented run should fail the batch item, not wedge the whole batch.

use std::fs;
use std::io::Read;
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use camino::Utf8Path;

use crate::context::RunContext;
use crate::error::ExecError;

/// Diagnostic line the race detector prints when it reports a race. A
/// non-zero exit accompanied by this marker means the run did exactly what it
/// was instrumented for, so the pipeline proceeds.
pub const BENIGN_RACE_MARKER: &str = "WARNING: ThreadSanitizer: data race";

/// Upper bound on how long an instrumented run may take.
pub const WAIT_CEILING: Duration = Duration::from_secs(60);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Captured output of a finished child process.
#[derive(Debug)]
pub struct Capture {
    pub stdout: String,
    pub stderr: String,
    pub status: ExitStatus,
}

/// Run the executable for a pipeline run: bounded wait, captured output
/// persisted to the run log, and the benign-race allowlist applied to the
/// exit status.
pub fn run_traced(ctx: &RunContext, exe: &Utf8Path) -> Result<Capture, ExecError> {
    tracing::info!("Running instrumented executable {exe}");
    let capture = run_executable(exe, WAIT_CEILING)?;

    fs::create_dir_all(&ctx.data_dir)?;
    fs::write(
        ctx.runlog_path(),
        format!("{}{}", capture.stdout, capture.stderr),
    )?;

    if !capture.status.success() {
        let benign = capture.stderr.contains(BENIGN_RACE_MARKER)
            || capture.stdout.contains(BENIGN_RACE_MARKER);
        if benign {
            tracing::info!("{exe} exited non-zero after reporting a data race; continuing");
        } else {
            return Err(ExecError::Failed {
                exe: exe.to_owned(),
                status: capture.status.to_string(),
                stderr: capture.stderr,
            });
        }
    }

    Ok(capture)
}

/// Spawn the executable with piped output and wait for it, at most `ceiling`.
pub fn run_executable(exe: &Utf8Path, ceiling: Duration) -> Result<Capture, ExecError> {
    run_command(Command::new(exe.as_std_path()), exe, ceiling)
}

fn run_command(
    mut cmd: Command,
    exe: &Utf8Path,
    ceiling: Duration,
) -> Result<Capture, ExecError> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| ExecError::Spawn {
            exe: exe.to_owned(),
            source,
        })?;

    // Drain both pipes on their own threads so a chatty child cannot fill a
    // pipe buffer and deadlock against our wait loop.
    let stdout = drain(child.stdout.take()).ok_or_else(|| ExecError::Capture(exe.to_owned()))?;
    let stderr = drain(child.stderr.take()).ok_or_else(|| ExecError::Capture(exe.to_owned()))?;

    let deadline = Instant::now() + ceiling;
    let status = loop {
        match child.try_wait()? {
            Some(status) => break status,
            None if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ExecError::Timeout {
                    exe: exe.to_owned(),
                    secs: ceiling.as_secs(),
                });
            }
            None => thread::sleep(POLL_INTERVAL),
        }
    };

    Ok(Capture {
        stdout: stdout.join().unwrap_or_default(),
        stderr: stderr.join().unwrap_or_default(),
        status,
    })
}

fn drain<R: Read + Send + 'static>(stream: Option<R>) -> Option<JoinHandle<String>> {
    let mut stream = stream?;
    Some(thread::spawn(move || {
        let mut buf = String::new();
        let _ = stream.read_to_string(&mut buf);
        buf
    }))
}
