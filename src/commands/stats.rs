// `setup-sccache stats`: reports the installed sccache without changing anything.

use crate::libs::command_runner::SystemCommandRunner;
use crate::libs::env_store::{EnvironmentStore, PATH_VARIABLE, user_env_store};
use crate::libs::stats_reporter::{collect, print_report};
use crate::log_debug;
use anyhow::{Context, Result};

/// Main entry point for the `stats` command.
pub fn run() -> Result<()> {
    log_debug!("Entered stats::run() function.");
    let env = user_env_store();
    let report = collect(
        &SystemCommandRunner,
        "sccache",
        env.process(PATH_VARIABLE).as_deref(),
    )
    .context("stats stage failed")?;
    print_report(&report);
    Ok(())
}
