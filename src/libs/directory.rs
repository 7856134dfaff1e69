use crate::log_debug;
use colored::Colorize;
use std::fs;
use std::io;
use std::path::Path;

/// Creates `dir` and any missing parents. A directory that already exists is left alone.
///
/// # Returns
/// * `Ok(true)` if the directory was created, `Ok(false)` if it already existed.
/// * `Err(io::Error)` for genuine failures (permissions, a file in the way, disk full).
pub fn ensure_dir(dir: &Path) -> io::Result<bool> {
    if dir.is_dir() {
        log_debug!("[Dirs] {} already exists", dir.display());
        return Ok(false);
    }
    fs::create_dir_all(dir)?;
    log_debug!("[Dirs] Created {}", dir.display().to_string().green());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_nested_then_noops() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("a/b/c");
        assert!(ensure_dir(&dir).unwrap());
        assert!(dir.is_dir());
        assert!(!ensure_dir(&dir).unwrap());
    }

    #[test]
    fn file_in_the_way_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        assert!(ensure_dir(&blocker.join("child")).is_err());
    }
}
