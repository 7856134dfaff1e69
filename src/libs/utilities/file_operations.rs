use crate::log_debug;
use colored::Colorize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Replaces `path` with `contents` so that readers never observe a partial file.
///
/// The new contents go to a temporary file in the same directory which is then
/// renamed over the target. When the target already exists its permissions are
/// carried over; a new file gets the platform default for regular files.
///
/// # Arguments
/// * `path` - File to create or replace. Its parent directory must exist.
/// * `contents` - Full new contents.
pub fn write_atomically(path: &Path, contents: &str) -> io::Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let permissions = match fs::metadata(path) {
        Ok(meta) => Some(meta.permissions()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(e),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;

    match permissions {
        Some(permissions) => fs::set_permissions(tmp.path(), permissions)?,
        None => set_default_permissions(tmp.path())?,
    }

    tmp.persist(path).map_err(|e| e.error)?;
    log_debug!("[Files] Wrote {}", path.display().to_string().cyan());
    Ok(())
}

#[cfg(unix)]
fn set_default_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    // Temporary files start out as 0600.
    fs::set_permissions(path, fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_default_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}
