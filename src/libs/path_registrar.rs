// Adds a directory to the user's persistent search path, once.

use crate::libs::env_store::{EnvironmentStore, PATH_LIST_SEPARATOR, PATH_VARIABLE};
use crate::schemas::errors::EnvError;
use crate::{log_debug, log_info, log_warn};
use colored::Colorize;
use std::path::Path;

/// Normalizes one search path entry for comparison: surrounding whitespace and
/// a single trailing `/` or `\` are dropped, ASCII case is folded.
fn normalize_entry(entry: &str) -> String {
    let trimmed = entry.trim();
    let trimmed = trimmed
        .strip_suffix('\\')
        .or_else(|| trimmed.strip_suffix('/'))
        .unwrap_or(trimmed);
    trimmed.to_ascii_lowercase()
}

/// True when `dir` already appears in `list`, ignoring case and a trailing separator.
pub fn path_list_contains(list: &str, dir: &str) -> bool {
    list_contains(list, dir, PATH_LIST_SEPARATOR)
}

/// Returns `list` with `dir` appended. Empty segments are dropped.
pub fn append_to_path_list(list: &str, dir: &str) -> String {
    list_append(list, dir, PATH_LIST_SEPARATOR)
}

fn list_contains(list: &str, dir: &str, separator: char) -> bool {
    let wanted = normalize_entry(dir);
    list.split(separator)
        .filter(|segment| !segment.trim().is_empty())
        .any(|segment| normalize_entry(segment) == wanted)
}

fn list_append(list: &str, dir: &str, separator: char) -> String {
    let mut segments: Vec<&str> = list
        .split(separator)
        .filter(|segment| !segment.trim().is_empty())
        .collect();
    segments.push(dir);
    segments.join(&separator.to_string())
}

/// Registers `dir` on the persistent user search path and on the current
/// process search path.
///
/// The persisted list is read, checked and rewritten in full when `dir` is
/// missing. Concurrent external edits between the read and the write are lost
/// (last writer wins).
///
/// # Returns
/// * `Ok(true)` if the persisted list was changed, `Ok(false)` if `dir` was already present.
/// * `Err(EnvError::PersistFailure)` if the persisted list cannot be read or written.
pub fn register_path(env: &mut dyn EnvironmentStore, dir: &Path) -> Result<bool, EnvError> {
    let dir_str = dir.to_string_lossy();
    let current = env.persisted(PATH_VARIABLE)?.unwrap_or_default();

    let changed = if path_list_contains(&current, &dir_str) {
        log_debug!("[Path] {} is already on the persistent PATH", dir_str);
        false
    } else {
        env.persist(PATH_VARIABLE, &append_to_path_list(&current, &dir_str))?;
        log_info!(
            "[Path] Added {} to the persistent user PATH",
            dir_str.to_string().green()
        );
        true
    };

    // The running process only sees the new directory if it is mirrored in as well.
    let process_path = env
        .process(PATH_VARIABLE)
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();
    if !path_list_contains(&process_path, &dir_str) {
        let mirrored = if process_path.trim().is_empty() {
            dir_str.to_string()
        } else {
            format!("{dir_str}{PATH_LIST_SEPARATOR}{process_path}")
        };
        if let Err(e) = env.mirror(PATH_VARIABLE, &mirrored) {
            log_warn!("[Path] {}", e);
        }
    }

    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::env_store::MemoryEnvStore;

    fn sep() -> String {
        PATH_LIST_SEPARATOR.to_string()
    }

    #[test]
    fn windows_membership_ignores_case_and_trailing_separator() {
        let list = "c:\\tools\\bin;;d:\\other";
        assert!(list_contains(list, "C:\\tools\\bin\\", ';'));
        assert!(list_contains(list, "C:\\TOOLS\\BIN", ';'));
        assert!(!list_contains(list, "C:\\tools", ';'));
    }

    #[test]
    fn membership_on_the_host_separator() {
        let list = format!("/usr/bin{}/Opt/Tools/bin/", sep());
        assert!(path_list_contains(&list, "/opt/tools/bin"));
        assert!(!path_list_contains(&list, "/opt/tools"));
    }

    #[test]
    fn append_drops_empty_segments() {
        assert_eq!(list_append(";/a;;/b;", "/c", ';'), "/a;/b;/c");
        assert_eq!(append_to_path_list("", "/c"), "/c");
    }

    #[test]
    fn registering_twice_writes_once() {
        let mut env = MemoryEnvStore::new();
        env.persisted.insert(PATH_VARIABLE.to_string(), "/usr/bin".to_string());

        assert!(register_path(&mut env, Path::new("/opt/sccache/bin")).unwrap());
        assert!(!register_path(&mut env, Path::new("/opt/sccache/bin/")).unwrap());

        assert_eq!(env.persist_writes, 1);
        assert_eq!(
            env.persisted.get(PATH_VARIABLE).unwrap(),
            &format!("/usr/bin{}/opt/sccache/bin", sep())
        );
    }

    #[test]
    fn already_present_with_different_case_is_a_noop() {
        let mut env = MemoryEnvStore::new();
        env.persisted
            .insert(PATH_VARIABLE.to_string(), "/Tools/Bin".to_string());

        assert!(!register_path(&mut env, Path::new("/tools/bin/")).unwrap());
        assert_eq!(env.persist_writes, 0);
    }

    #[test]
    fn directory_is_mirrored_into_process_path() {
        let mut env = MemoryEnvStore::new().with_process_path("/usr/bin");
        register_path(&mut env, Path::new("/opt/sccache/bin")).unwrap();
        assert_eq!(
            env.process.get(PATH_VARIABLE).unwrap(),
            &format!("/opt/sccache/bin{}/usr/bin", sep())
        );
    }
}
