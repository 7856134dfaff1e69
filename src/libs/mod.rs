// Pipeline stages and the capabilities they run against.

// Path list registration on the persistent user environment.
pub mod path_registrar;
// Persistent and process environment access.
pub mod env_store;
// Setting the cache environment variables.
pub mod environment_configurator;
// Line oriented TOML merge for `.cargo/config.toml`.
pub mod config_merger;
// Install stage: probe, package managers, release fallback.
pub mod installation_orchestrator;
// `--start-server`, `--version`, `--show-stats`.
pub mod stats_reporter;
// Executable resolution on a search path.
pub mod command_probe;
// External process execution.
pub mod command_runner;
pub mod directory;
// YAML settings file.
pub mod config_loading;
// Defaults and option precedence.
pub mod paths;
pub mod utilities;
