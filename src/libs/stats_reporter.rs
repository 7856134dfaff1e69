// Starts the cache server and reports the installed version and cache statistics.

use crate::libs::command_probe;
use crate::libs::command_runner::CommandRunner;
use crate::schemas::errors::StatsError;
use crate::{log_debug, log_info, log_warn};
use colored::Colorize;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// What the installed tool reported about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsReport {
    pub executable: PathBuf,
    pub version: String,
    pub stats: String,
}

/// Resolves `executable` on `search_path`, starts its server and collects
/// `--version` and `--show-stats` output.
///
/// A failing `--start-server` is only a warning: the server may already be
/// running, and `--show-stats` starts one on demand anyway.
///
/// # Returns
/// * `Err(StatsError::NotResolvable)` if the executable cannot be found.
/// * `Err(StatsError::ToolFailed)` if `--version` or `--show-stats` fails.
pub fn collect(
    runner: &dyn CommandRunner,
    executable: &str,
    search_path: Option<&OsStr>,
) -> Result<StatsReport, StatsError> {
    let program = command_probe::resolve(executable, search_path).ok_or_else(|| {
        StatsError::NotResolvable {
            executable: executable.to_string(),
        }
    })?;

    match run_tool(runner, &program, "--start-server") {
        Ok(_) => log_debug!("[Stats] Server started"),
        Err(e) => log_warn!("[Stats] {} (continuing)", e),
    }

    let version = run_tool(runner, &program, "--version")?.trim().to_string();
    let stats = run_tool(runner, &program, "--show-stats")?
        .trim_end()
        .to_string();

    Ok(StatsReport {
        executable: program,
        version,
        stats,
    })
}

/// Prints a collected report to stdout.
pub fn print_report(report: &StatsReport) {
    log_info!(
        "[Stats] {} ({})",
        report.version.bold(),
        report.executable.display().to_string().cyan()
    );
    println!("{}", report.stats);
}

fn run_tool(runner: &dyn CommandRunner, program: &Path, flag: &str) -> Result<String, StatsError> {
    let command = format!("{} {flag}", program.display());
    let outcome = runner
        .run(program, &[flag.to_string()])
        .map_err(|e| StatsError::ToolFailed {
            command: command.clone(),
            reason: e.to_string(),
        })?;
    if outcome.success {
        Ok(outcome.stdout)
    } else {
        Err(StatsError::ToolFailed {
            command,
            reason: outcome.failure_summary(),
        })
    }
}
