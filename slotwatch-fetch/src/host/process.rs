//! Subprocess execution.
//!
//! Runs the external login helper: the program is resolved on `PATH` (or
//! taken as a path), started with stdin closed and a few extra environment
//! variables, and killed if it outlives its time budget.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use crate::error::ProcessError;

// ============================================================================
// Output
// ============================================================================

/// What a finished child process left behind.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Captured stdout, lossily decoded.
    pub stdout: String,
    /// Captured stderr, lossily decoded.
    pub stderr: String,
    /// Exit code, or -1 if the child was killed by a signal.
    pub exit_code: i32,
    /// Wall time from spawn to exit.
    pub elapsed: Duration,
}

impl ProcessOutput {
    /// Returns true on exit code 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Consumes the output, yielding stdout on success.
    pub fn into_stdout(self) -> Result<String, ProcessError> {
        if self.success() {
            return Ok(self.stdout);
        }
        Err(ProcessError::NonZeroExit {
            code: self.exit_code,
            stderr: self.stderr,
        })
    }
}

// ============================================================================
// Runner
// ============================================================================

/// Starts child processes with a bounded lifetime.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    /// Creates a runner.
    pub fn new() -> Self {
        Self
    }

    /// Resolves `program` to an executable path.
    pub fn resolve(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }

    /// Returns true if `program` resolves to an executable.
    pub fn is_installed(&self, program: &str) -> bool {
        self.resolve(program).is_some()
    }

    /// Runs `program` to completion with extra environment variables.
    ///
    /// Only the variable names are logged. The child is killed once
    /// `timeout` elapses.
    #[instrument(skip(self, env), fields(program = %program, timeout = ?timeout))]
    pub async fn run_with_env(
        &self,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<ProcessOutput, ProcessError> {
        let Some(path) = self.resolve(program) else {
            warn!("Program not found");
            return Err(ProcessError::NotFound(program.to_string()));
        };

        let env_names: Vec<&str> = env.iter().map(|(name, _)| *name).collect();
        debug!(path = %path.display(), ?args, env = ?env_names, "Spawning");

        let mut command = Command::new(&path);
        command
            .args(args)
            .envs(env.iter().copied())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let started = Instant::now();
        let Ok(result) = tokio::time::timeout(timeout, command.output()).await else {
            warn!("Program exceeded its time budget, killed");
            return Err(ProcessError::Timeout(timeout));
        };
        let raw = result?;

        let output = ProcessOutput {
            stdout: String::from_utf8_lossy(&raw.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&raw.stderr).into_owned(),
            exit_code: raw.status.code().unwrap_or(-1),
            elapsed: started.elapsed(),
        };

        debug!(
            exit_code = output.exit_code,
            elapsed = ?output.elapsed,
            stdout_bytes = output.stdout.len(),
            "Program finished"
        );
        Ok(output)
    }
}

// ============================================================================
// Tests
// ============================================================================
