// Answers "can this executable be resolved right now?" without side effects.
// The install stage probes before and after installing, and the package
// manager installer probes each candidate before running it.

// Our custom logging macros; every probe is logged at debug level.
use crate::log_debug;
// Search paths are platform path lists, which are not always valid UTF-8.
use std::ffi::OsStr;
// The resolved executable.
use std::path::PathBuf;

/// Resolves `program` against `search_path` (a platform path list such as the
/// current process `PATH`). Relative entries are resolved against the current
/// directory.
///
/// # Returns
/// * `Some(PathBuf)` with the resolved executable, `None` if it cannot be found.
pub fn resolve(program: &str, search_path: Option<&OsStr>) -> Option<PathBuf> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let resolved = which::which_in(program, search_path, cwd).ok();
    log_debug!("[Probe] {} -> {:?}", program, resolved);
    resolved
}
