use crate::libs::paths::parse_cache_size;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Defines the command-line interface (CLI) for 'setup-sccache'.
/// `#[derive(Parser)]` automatically generates argument parsing code via `clap`.
#[derive(Parser, Debug)]
#[command(name = "setup-sccache", version)]
#[command(about = "Install sccache and configure Rust builds to use it")]
pub struct Cli {
    /// Enables detailed debug output for troubleshooting.
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Optional YAML settings file (defaults to ~/.setup-sccache/config.yaml).
    #[arg(long, global = true, env = "SETUP_SCCACHE_CONFIG", value_name = "PATH")]
    pub settings: Option<PathBuf>,

    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Runs the full setup when omitted.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Options of the provisioning pipeline. Unset values fall back to the
/// settings file, then to built-in defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct PipelineArgs {
    /// Project whose `.cargo/config.toml` receives the rustc wrapper (defaults to the current directory).
    #[arg(long, global = true, value_name = "PATH")]
    pub project: Option<PathBuf>,

    /// Where the release binary is installed when no package manager succeeds (defaults to ~/.sccache/bin).
    #[arg(long, global = true, value_name = "PATH")]
    pub install_dir: Option<PathBuf>,

    /// Cache directory exported as SCCACHE_DIR.
    #[arg(long, global = true, env = "SCCACHE_DIR", value_name = "PATH")]
    pub cache_dir: Option<PathBuf>,

    /// Cache size limit exported as SCCACHE_CACHE_SIZE, e.g. 10G or 500M [default: 10G].
    #[arg(long, global = true, env = "SCCACHE_CACHE_SIZE", value_name = "SIZE", value_parser = parse_cache_size)]
    pub cache_size: Option<String>,

    /// Leave the project's `.cargo/config.toml` untouched.
    #[arg(long, global = true)]
    pub skip_project_config: bool,
}

/// Enumerates the supported subcommands.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Installs sccache, sets the cache environment, wires it into the project and prints statistics.
    Now,
    /// Prints the installed sccache version and cache statistics only.
    Stats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_full_run() {
        let cli = Cli::try_parse_from(["setup-sccache", "--project", "demo"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.pipeline.project, Some(PathBuf::from("demo")));
    }

    #[test]
    fn pipeline_flags_work_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "setup-sccache",
            "now",
            "--skip-project-config",
            "--cache-size",
            "2g",
            "--debug",
        ])
        .unwrap();
        assert_eq!(cli.command, Some(Commands::Now));
        assert!(cli.pipeline.skip_project_config);
        assert_eq!(cli.pipeline.cache_size.as_deref(), Some("2G"));
        assert!(cli.debug);
    }

    #[test]
    fn malformed_cache_size_is_rejected() {
        assert!(Cli::try_parse_from(["setup-sccache", "--cache-size", "lots"]).is_err());
    }

    #[test]
    fn clap_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
