// This file contains the primary logic for the `setup-sccache now` command.
// It runs the provisioning pipeline: install, environment, project
// configuration and statistics. Each stage must finish before the next one
// starts, and the first failure aborts the run.

use crate::cli::cmd_enums::PipelineArgs;
use crate::installers::github::{HttpReleaseSource, ReleaseSource};
use crate::libs::command_runner::{CommandRunner, SystemCommandRunner};
use crate::libs::config_loading::load_settings;
use crate::libs::config_merger::{ConfigFragment, MergeOutcome, describe, merge_fragment};
use crate::libs::directory::ensure_dir;
use crate::libs::env_store::{EnvironmentStore, PATH_VARIABLE, user_env_store};
use crate::libs::environment_configurator::{EnvironmentBinding, apply_bindings};
use crate::libs::installation_orchestrator::{InstallOutcome, InstallationOrchestrator};
use crate::libs::paths::{SetupOptions, project_config_path};
use crate::libs::stats_reporter::{StatsReport, collect, print_report};
use crate::schemas::install_target::InstallTarget;
use crate::{log_debug, log_info};
use anyhow::{Context, Result, bail};
use colored::Colorize;
use std::path::Path;

/// What each stage of a completed run did.
#[derive(Debug)]
pub struct PipelineReport {
    pub install: InstallOutcome,
    /// Number of environment variables whose persisted value changed.
    pub env_changes: usize,
    /// `None` when the project stage was skipped.
    pub project_config: Option<MergeOutcome>,
    pub stats: StatsReport,
}

/// Main entry point for the `now` command.
///
/// Settings are loaded and validated before anything on the system is touched.
///
/// # Arguments
/// * `settings_path`: Optional custom path to the YAML settings file.
/// * `args`: Pipeline flags from the command line.
pub fn run(settings_path: Option<&Path>, args: &PipelineArgs) -> Result<()> {
    log_debug!("Entered now::run() function.");

    let settings = load_settings(settings_path)?;
    let options = SetupOptions::resolve(args, &settings)?;

    let runner = SystemCommandRunner;
    let source = HttpReleaseSource::new(options.connect_timeout, options.read_timeout);
    let mut env = user_env_store();

    let report = run_pipeline(&options, &runner, &source, &mut env)?;
    print_report(&report.stats);

    log_info!("'setup-sccache now' command completed!!");
    Ok(())
}

/// The environment variables sccache reads, with the values for this run.
pub fn cache_bindings(options: &SetupOptions, wrapper: &str) -> Vec<EnvironmentBinding> {
    vec![
        EnvironmentBinding::new("RUSTC_WRAPPER", wrapper),
        EnvironmentBinding::new("SCCACHE_DIR", options.cache_dir.to_string_lossy()),
        EnvironmentBinding::new("SCCACHE_CACHE_SIZE", options.cache_size.as_str()),
    ]
}

/// Runs every stage against the given capabilities.
///
/// # Returns
/// * `Ok(PipelineReport)` if all stages succeeded.
/// * `Err` carrying the failing stage's name as context.
pub fn run_pipeline(
    options: &SetupOptions,
    runner: &dyn CommandRunner,
    source: &dyn ReleaseSource,
    env: &mut dyn EnvironmentStore,
) -> Result<PipelineReport> {
    let target = InstallTarget::sccache(options.package_managers.clone(), options.release_url.as_str());

    // 1. Install
    log_info!("{}", "[Install] Making sccache available".bold());
    let install = InstallationOrchestrator::new(runner, source, &mut *env, options.verify_checksum)
        .ensure_installed(&target, &options.install_dir)
        .context("install stage failed")?;

    // 2. Environment
    log_info!("{}", "[Env] Configuring the cache environment".bold());
    ensure_dir(&options.cache_dir)
        .with_context(|| format!("could not create cache directory {}", options.cache_dir.display()))
        .context("environment stage failed")?;
    let env_changes = apply_bindings(&mut *env, &cache_bindings(options, &target.executable))
        .context("environment stage failed")?;

    // 3. Project configuration
    let project_config = if options.skip_project_config {
        log_info!("[Config] Skipping project configuration (--skip-project-config)");
        None
    } else {
        log_info!("{}", "[Config] Wiring sccache into the project".bold());
        if !options.project_dir.is_dir() {
            bail!(
                "project configuration stage failed: {} is not a directory",
                options.project_dir.display()
            );
        }
        let path = project_config_path(&options.project_dir);
        let fragment = ConfigFragment::rustc_wrapper(target.executable.as_str());
        describe(&path, &fragment);
        let outcome = merge_fragment(&path, &fragment.section, &fragment.key, &fragment.value)
            .context("project configuration stage failed")?;
        Some(outcome)
    };

    // 4. Stats
    log_info!("{}", "[Stats] Starting the sccache server".bold());
    let stats = collect(runner, &target.executable, env.process(PATH_VARIABLE).as_deref())
        .context("stats stage failed")?;

    Ok(PipelineReport {
        install,
        env_changes,
        project_config,
        stats,
    })
}
