//! Blocking child-process capability.
//!
//! CLI-backed platforms (winget and friends) read their evidence from a
//! tool's stdout. The [`ProcessRunner`] trait keeps that seam narrow: run an
//! executable with arguments, block until exit, hand back captured UTF-8
//! output. Timeouts are the runner's concern, not the engine's.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;

use thiserror::Error;

/// Errors from launching an external tool.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The executable could not be launched at all.
    #[error("failed to launch {program}: {source}")]
    Launch {
        /// Path of the executable.
        program: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Captured result of one child-process run.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    /// Standard output, decoded as UTF-8 (lossy).
    pub stdout: String,
    /// Standard error, decoded as UTF-8 (lossy).
    pub stderr: String,
    /// Exit code, when the process exited normally.
    pub exit_code: Option<i32>,
}

/// Capability to run an external executable and capture its output.
pub trait ProcessRunner {
    /// Run `program` with `args`, blocking until it exits.
    fn run(&self, program: &Path, args: &[&str]) -> Result<ProcessOutput, ProcessError>;
}

/// Production runner using `std::process::Command`.
#[derive(Debug, Default)]
pub struct StdProcessRunner;

impl StdProcessRunner {
    /// Create a runner.
    pub fn new() -> Self {
        Self
    }
}

impl ProcessRunner for StdProcessRunner {
    fn run(&self, program: &Path, args: &[&str]) -> Result<ProcessOutput, ProcessError> {
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| ProcessError::Launch {
                program: program.to_path_buf(),
                source,
            })?;

        Ok(ProcessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }
}

/// Scripted runner replaying canned output, for tests.
///
/// Responses are keyed by the exact argument list. Unscripted invocations
/// return empty output, which drivers treat the same as a tool that printed
/// nothing. Every invocation is recorded so tests can assert how often (and
/// with what) the tool was called; the truncation-recovery contract depends
/// on exactly-one re-query.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use gamescout::sys::{ProcessRunner, ScriptedRunner};
///
/// let runner = ScriptedRunner::new();
/// runner.respond(&["list"], "Name Id\n---- --\nFoo  f1\n");
///
/// let out = runner.run(Path::new("tool"), &["list"]).unwrap();
/// assert!(out.stdout.contains("Foo"));
/// assert_eq!(runner.calls().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    responses: Mutex<Vec<(Vec<String>, ProcessOutput)>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedRunner {
    /// Create a runner with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script stdout for an exact argument list.
    pub fn respond(&self, args: &[&str], stdout: &str) {
        self.respond_full(
            args,
            ProcessOutput {
                stdout: stdout.to_owned(),
                stderr: String::new(),
                exit_code: Some(0),
            },
        );
    }

    /// Script a full output for an exact argument list.
    pub fn respond_full(&self, args: &[&str], output: ProcessOutput) {
        self.responses
            .lock()
            .unwrap()
            .push((args.iter().map(|s| s.to_string()).collect(), output));
    }

    /// Argument lists of every invocation so far, in order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

impl ProcessRunner for ScriptedRunner {
    fn run(&self, _program: &Path, args: &[&str]) -> Result<ProcessOutput, ProcessError> {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        self.calls.lock().unwrap().push(args.clone());

        let responses = self.responses.lock().unwrap();
        let output = responses
            .iter()
            .find(|(scripted, _)| *scripted == args)
            .map(|(_, output)| output.clone())
            .unwrap_or_default();
        Ok(output)
    }
}
