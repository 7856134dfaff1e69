// This module orchestrates the install stage. It makes the target executable
// resolvable, trying the cheapest option first:
//
// 1. Probe: nothing to do if the executable already resolves.
// 2. Package managers: the configured candidates, in order.
// 3. Release download: the platform archive from the release listing, installed
//    into the install directory, which is then registered on the persistent
//    search path.
// 4. Re-probe: the executable must now resolve on the (mirrored) process search
//    path, otherwise the run fails.

// The release fallback and the network seam it downloads through.
use crate::installers::github::{ReleaseFetcher, ReleaseSource};
// Walks the package manager candidates until one succeeds.
use crate::installers::package_manager::install_with_first_available;
// Resolves executables against a search path without side effects.
use crate::libs::command_probe;
// Runs the package managers.
use crate::libs::command_runner::CommandRunner;
// The user environment; its process `PATH` is what gets probed.
use crate::libs::env_store::{EnvironmentStore, PATH_VARIABLE};
// Puts the install directory on the persistent search path after a download.
use crate::libs::path_registrar::register_path;
// Our custom logging macro for progress messages.
use crate::log_info;
// Every failure of the install stage is an `InstallError`.
use crate::schemas::errors::InstallError;
// What to install and through which managers.
use crate::schemas::install_target::{InstallTarget, PackageManager};
// For colored terminal output, making logs more readable.
use colored::Colorize;
// The process search path is an OS string.
use std::ffi::OsString;
// `fmt` for the human readable `InstallOutcome`.
use std::fmt;
// For the install directory and resolved executable paths.
use std::path::{Path, PathBuf};

/// How the executable became available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// It was already resolvable at this path; nothing was installed.
    AlreadyPresent(PathBuf),
    /// A package manager installed it.
    PackageManager(PackageManager),
    /// The release archive was unpacked; the binary now lives at this path.
    ReleaseDownload(PathBuf),
}

impl fmt::Display for InstallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallOutcome::AlreadyPresent(path) => write!(f, "already installed at {}", path.display()),
            InstallOutcome::PackageManager(pm) => write!(f, "installed with {pm}"),
            InstallOutcome::ReleaseDownload(path) => {
                write!(f, "installed from release into {}", path.display())
            }
        }
    }
}

/// Drives the install stage through injected capabilities.
pub struct InstallationOrchestrator<'a> {
    runner: &'a dyn CommandRunner,
    source: &'a dyn ReleaseSource,
    env: &'a mut dyn EnvironmentStore,
    verify_checksum: bool,
}

impl<'a> InstallationOrchestrator<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        source: &'a dyn ReleaseSource,
        env: &'a mut dyn EnvironmentStore,
        verify_checksum: bool,
    ) -> Self {
        Self {
            runner,
            source,
            env,
            verify_checksum,
        }
    }

    fn search_path(&self) -> Option<OsString> {
        self.env.process(PATH_VARIABLE)
    }

    fn probe(&self, executable: &str) -> Option<PathBuf> {
        command_probe::resolve(executable, self.search_path().as_deref())
    }

    /// Ensures `target.executable` resolves, installing it if necessary.
    ///
    /// # Arguments
    /// * `target` - What to install and how.
    /// * `install_dir` - Destination of the release fallback; created and
    ///   registered on the search path only when that fallback runs.
    ///
    /// # Returns
    /// * `Ok(InstallOutcome)` once the executable resolves.
    /// * `Err(InstallError::NotFoundAfterInstall)` if an install step reported
    ///   success but the executable still does not resolve.
    /// * `Err(InstallError)` from the release fallback or path registration.
    pub fn ensure_installed(
        &mut self,
        target: &InstallTarget,
        install_dir: &Path,
    ) -> Result<InstallOutcome, InstallError> {
        if let Some(existing) = self.probe(&target.executable) {
            log_info!(
                "[Installer] {} is already available at {}",
                target.executable.bold(),
                existing.display().to_string().green()
            );
            return Ok(InstallOutcome::AlreadyPresent(existing));
        }

        log_info!(
            "[Installer] {} not found on PATH, installing",
            target.executable.yellow()
        );

        let search_path = self.search_path();
        let outcome = match install_with_first_available(self.runner, target, search_path.as_deref())
        {
            Some(manager) => InstallOutcome::PackageManager(manager),
            None => {
                log_info!("[Installer] Falling back to the release download");
                let fetcher = ReleaseFetcher::new(self.source, self.verify_checksum);
                let binary = fetcher.fetch_binary(target, install_dir)?;
                register_path(&mut *self.env, install_dir)?;
                InstallOutcome::ReleaseDownload(binary)
            }
        };

        match self.probe(&target.executable) {
            Some(resolved) => {
                log_info!(
                    "[Installer] {} {} ({})",
                    target.executable.bold(),
                    outcome,
                    resolved.display().to_string().green()
                );
                Ok(outcome)
            }
            None => Err(InstallError::NotFoundAfterInstall {
                executable: target.executable.clone(),
                method: match &outcome {
                    InstallOutcome::PackageManager(pm) => pm.to_string(),
                    _ => format!("the release download into {}", install_dir.display()),
                },
            }),
        }
    }
}
