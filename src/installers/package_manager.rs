// This module installs the target through the system package managers, one
// candidate at a time, in the configured order.
//
// - A candidate whose own executable cannot be resolved is reported as
//   `InstallError::PackageManagerUnavailable`, logged, and skipped.
// - A candidate whose install subcommand cannot be spawned or exits non-zero
//   is `InstallError::PackageManagerFailed`, logged, and skipped.
// - The first candidate whose install subcommand exits successfully stops the
//   chain. Whether the tool actually became resolvable is checked by the caller.

// Checks that the manager itself is installed before trying it.
use crate::libs::command_probe;
// Runs the manager's install subcommand.
use crate::libs::command_runner::CommandRunner;
// Unavailable and failed candidates are reported as `InstallError`s.
use crate::schemas::errors::InstallError;
// The candidates and the install arguments each one takes.
use crate::schemas::install_target::{InstallTarget, PackageManager};
// Our custom logging macros to give us nicely formatted (and colored!) output.
use crate::{log_debug, log_info, log_warn};
// For colored terminal output, making logs more readable.
use colored::Colorize;
// The search path the managers are resolved against.
use std::ffi::OsStr;

/// Runs one candidate's install subcommand.
///
/// # Arguments
/// * `runner` - Executes the package manager.
/// * `manager` - The candidate to try.
/// * `target` - What to install.
/// * `search_path` - Path list used to resolve the manager's executable.
///
/// # Returns
/// * `Ok(())` if the install subcommand exited successfully.
/// * `Err(InstallError::PackageManagerUnavailable)` if the manager is not installed.
/// * `Err(InstallError::PackageManagerFailed)` if it could not be run or exited non-zero.
pub fn try_install(
    runner: &dyn CommandRunner,
    manager: PackageManager,
    target: &InstallTarget,
    search_path: Option<&OsStr>,
) -> Result<(), InstallError> {
    let Some(program) = command_probe::resolve(manager.program(), search_path) else {
        return Err(InstallError::PackageManagerUnavailable {
            manager: manager.to_string(),
        });
    };

    let args = manager.install_args(target);
    log_info!(
        "[Package Manager] Installing {} with {}",
        target.package_name.bold(),
        format!("{} {}", manager, args.join(" ")).cyan()
    );

    let outcome = runner
        .run(&program, &args)
        .map_err(|e| InstallError::PackageManagerFailed {
            manager: manager.to_string(),
            reason: format!("could not start {}: {e}", program.display()),
        })?;

    if outcome.success {
        log_debug!("[Package Manager] {} stdout:\n{}", manager, outcome.stdout.trim_end());
        Ok(())
    } else {
        Err(InstallError::PackageManagerFailed {
            manager: manager.to_string(),
            reason: outcome.failure_summary(),
        })
    }
}

/// Walks the candidates in order until one install subcommand succeeds.
///
/// # Returns
/// * `Some(manager)` for the first candidate that succeeded.
/// * `None` if every candidate was unavailable or failed.
pub fn install_with_first_available(
    runner: &dyn CommandRunner,
    target: &InstallTarget,
    search_path: Option<&OsStr>,
) -> Option<PackageManager> {
    for &manager in &target.package_managers {
        match try_install(runner, manager, target, search_path) {
            Ok(()) => {
                log_info!(
                    "[Package Manager] {} reported success for {}",
                    manager.to_string().green(),
                    target.package_name.bold()
                );
                return Some(manager);
            }
            Err(e @ InstallError::PackageManagerUnavailable { .. }) => {
                log_debug!("[Package Manager] Skipping: {}", e);
            }
            Err(e) => {
                log_warn!("[Package Manager] {}", e);
            }
        }
    }
    log_info!(
        "[Package Manager] No package manager installed {}",
        target.package_name.yellow()
    );
    None
}
