// Resolves the effective options of a run from the command line, the settings
// file and the built-in defaults, in that order of precedence.

use crate::cli::cmd_enums::PipelineArgs;
use crate::libs::utilities::path_helpers::{absolutize, expand_path, get_setup_dir};
use crate::log_debug;
use crate::schemas::install_target::{PackageManager, SCCACHE_LATEST_RELEASE_URL};
use crate::schemas::settings::Settings;
use anyhow::{Context, Result, anyhow};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CACHE_SIZE: &str = "10G";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 300;

/// `~/.setup-sccache/config.yaml`.
pub fn default_settings_path() -> PathBuf {
    get_setup_dir().join("config.yaml")
}

/// `~/.sccache/bin`.
pub fn default_install_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".sccache")
        .join("bin")
}

/// The platform cache directory plus `sccache` (`~/.cache/sccache` on Linux,
/// `%LOCALAPPDATA%\sccache` on Windows).
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".cache")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sccache")
}

/// `<project>/.cargo/config.toml`.
pub fn project_config_path(project: &Path) -> PathBuf {
    project.join(".cargo").join("config.toml")
}

/// Validates a cache size such as `10G`, `512M` or `1073741824`. The unit is
/// normalized to upper case.
pub fn parse_cache_size(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    let (digits, unit) = match trimmed.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&trimmed[..idx], Some(c.to_ascii_uppercase())),
        _ => (trimmed, None),
    };
    let valid_digits = !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit());
    let valid_unit = unit.is_none_or(|u| matches!(u, 'K' | 'M' | 'G' | 'T'));
    if valid_digits && valid_unit {
        Ok(match unit {
            Some(u) => format!("{digits}{u}"),
            None => digits.to_string(),
        })
    } else {
        Err(format!(
            "'{raw}' is not a cache size; use a number with an optional K, M, G or T suffix"
        ))
    }
}

/// Effective options for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct SetupOptions {
    pub project_dir: PathBuf,
    pub install_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub cache_size: String,
    pub skip_project_config: bool,
    pub release_url: String,
    pub package_managers: Vec<PackageManager>,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub verify_checksum: bool,
}

impl SetupOptions {
    /// Layers `args` over `settings` over the defaults. Paths are expanded and made absolute.
    pub fn resolve(args: &PipelineArgs, settings: &Settings) -> Result<Self> {
        let project_dir = absolutize(args.project.as_deref().unwrap_or(Path::new(".")));

        let install_dir = pick_dir(
            args.install_dir.as_deref(),
            settings.install_dir.as_deref(),
            default_install_dir,
        );
        let cache_dir = pick_dir(
            args.cache_dir.as_deref(),
            settings.cache_dir.as_deref(),
            default_cache_dir,
        );

        let cache_size = match (&args.cache_size, &settings.cache_size) {
            (Some(cli), _) => cli.clone(),
            (None, Some(from_settings)) => parse_cache_size(from_settings)
                .map_err(|e| anyhow!(e))
                .context("invalid cache_size in settings file")?,
            (None, None) => DEFAULT_CACHE_SIZE.to_string(),
        };

        let options = Self {
            project_dir,
            install_dir,
            cache_dir,
            cache_size,
            skip_project_config: args.skip_project_config,
            release_url: settings
                .release_url
                .clone()
                .unwrap_or_else(|| SCCACHE_LATEST_RELEASE_URL.to_string()),
            package_managers: settings
                .package_managers
                .clone()
                .unwrap_or_else(PackageManager::platform_defaults),
            connect_timeout: Duration::from_secs(
                settings
                    .connect_timeout_secs
                    .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
            ),
            read_timeout: Duration::from_secs(
                settings.read_timeout_secs.unwrap_or(DEFAULT_READ_TIMEOUT_SECS),
            ),
            verify_checksum: settings.verify_checksum.unwrap_or(true),
        };

        log_debug!("[Options] Project: {}", options.project_dir.display().to_string().cyan());
        log_debug!("[Options] Install dir: {}", options.install_dir.display().to_string().cyan());
        log_debug!("[Options] Cache dir: {}", options.cache_dir.display().to_string().cyan());
        log_debug!("[Options] Cache size: {}", options.cache_size);
        log_debug!("[Options] Package managers: {:?}", options.package_managers);
        Ok(options)
    }
}

fn pick_dir(cli: Option<&Path>, setting: Option<&str>, default: fn() -> PathBuf) -> PathBuf {
    let chosen = match (cli, setting) {
        (Some(path), _) => expand_path(&path.to_string_lossy()),
        (None, Some(raw)) => expand_path(raw),
        (None, None) => default(),
    };
    absolutize(&chosen)
}
