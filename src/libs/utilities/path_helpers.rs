// Our custom logging macros to give us nicely formatted (and colored!) output
// for debugging, general information, and errors.
use crate::log_debug;
// The 'colored' crate helps us make our console output look pretty and readable.
use colored::Colorize;
// For working with user supplied paths and the resolved absolute ones.
use std::path::{Path, PathBuf};

/// Expands a leading `~` and any `$VAR`/`${VAR}` references in a user supplied path.
/// Unknown variables are left untouched rather than failing the run.
///
/// # Arguments
/// * `path`: A path string, possibly starting with `~`.
pub fn expand_path(path: &str) -> PathBuf {
    let expanded = match shellexpand::full(path) {
        Ok(expanded) => expanded.into_owned(),
        Err(e) => {
            log_debug!("[Paths] Could not expand variables in '{}': {}", path, e);
            shellexpand::tilde(path).into_owned()
        }
    };
    PathBuf::from(expanded)
}

/// Makes `path` absolute against the current directory when it is relative.
pub fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

/// Root of the tool's own files, `~/.setup-sccache`.
pub fn get_setup_dir() -> PathBuf {
    let dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".setup-sccache");
    log_debug!("[Paths] setup-sccache directory resolved to: {}", dir.display().to_string().cyan());
    dir
}
