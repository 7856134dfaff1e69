// External process execution behind a trait so installers and the stats stage
// can be driven by fake executables in tests.

use crate::log_debug;
use colored::Colorize;
use std::ffi::OsStr;
use std::io;
use std::path::Path;
use std::process::Command;

/// What a finished process reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutcome {
    /// A short human readable failure summary: the exit code plus the last stderr line.
    pub fn failure_summary(&self) -> String {
        let code = self
            .code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());
        match self.stderr.lines().rev().find(|l| !l.trim().is_empty()) {
            Some(line) => format!("exit code {code}: {}", line.trim()),
            None => format!("exit code {code}"),
        }
    }
}

/// Capability to run an external program to completion.
pub trait CommandRunner {
    /// Runs `program` with `args`, blocking until it exits.
    ///
    /// # Returns
    /// * `Ok(CommandOutcome)` once the process ran, whatever its exit status.
    /// * `Err(io::Error)` if the process could not be spawned at all.
    fn run(&self, program: &Path, args: &[String]) -> io::Result<CommandOutcome>;
}

/// Runs real processes with `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, program: &Path, args: &[String]) -> io::Result<CommandOutcome> {
        log_debug!(
            "[Command] Executing: {} {}",
            program.display().to_string().cyan().bold(),
            args.join(" ").cyan()
        );
        let output = Command::new(program)
            .args(args.iter().map(OsStr::new))
            .output()?;

        Ok(CommandOutcome {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
