// Our custom logging macros to give us nicely formatted (and colored!) output
// for debugging, general information, and errors.
use crate::{log_debug, log_warn};
// The 'colored' crate helps us make our console output look pretty and readable.
use colored::Colorize;
// For copying the binary into the install directory.
use std::fs;
// `io::Result` for the copy and permission changes.
use std::io;
// Unix permission bits, used to mark the installed binary executable.
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
// For working with file paths, specifically to construct installation paths.
use std::path::{Path, PathBuf};
// Walks the extracted archive tree looking for the binary.
use walkdir::WalkDir;

/// Recursively searches `dir` for a file called `file_name` and returns the
/// first match. Entries are visited in file-name order so the result does not
/// depend on the order the archive was packed in.
///
/// # Arguments
/// * `dir`: Root of the extracted archive.
/// * `file_name`: Exact binary file name, e.g. `sccache` or `sccache.exe`.
pub fn find_binary(dir: &Path, file_name: &str) -> Option<PathBuf> {
    log_debug!(
        "[Binary] Searching for {} in: {}",
        file_name.bold(),
        dir.display().to_string().yellow()
    );

    let found = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok()) // Unreadable entries are skipped.
        .filter(|e| e.file_type().is_file())
        .find(|e| names_match(e.file_name().to_string_lossy().as_ref(), file_name))
        .map(|e| e.into_path());

    match &found {
        Some(path) => log_debug!("[Binary] Found {}", path.display().to_string().green()),
        None => log_warn!(
            "[Binary] No file named {} within {}",
            file_name.purple(),
            dir.display().to_string().purple()
        ),
    }
    found
}

// Windows file names are case-insensitive.
fn names_match(candidate: &str, wanted: &str) -> bool {
    if cfg!(windows) {
        candidate.eq_ignore_ascii_case(wanted)
    } else {
        candidate == wanted
    }
}

/// Copies `from` into `install_dir` under `file_name` and makes the copy
/// executable. An existing file with the same name is overwritten.
///
/// # Returns
/// * `io::Result<PathBuf>`: the installed binary's path.
pub fn install_binary(from: &Path, install_dir: &Path, file_name: &str) -> io::Result<PathBuf> {
    let to = install_dir.join(file_name);
    log_debug!(
        "[Binary] Copying {} to {}",
        from.display().to_string().yellow(),
        to.display().to_string().cyan()
    );
    fs::copy(from, &to)?;
    make_executable(&to)?;
    Ok(to)
}

/// Makes a file executable (`chmod 755`). Downloaded files do not reliably
/// carry their permission bits through extraction.
#[cfg(unix)]
pub fn make_executable(path: &Path) -> io::Result<()> {
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms)?;
    log_debug!("[Binary] {} is now executable.", path.display().to_string().green());
    Ok(())
}

// Executability on Windows comes from the `.exe` extension, not mode bits.
#[cfg(not(unix))]
pub fn make_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_nested_binary_by_exact_name() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("sccache-v0.8.1-x86_64-unknown-linux-musl");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("README.md"), "docs").unwrap();
        fs::write(nested.join("sccache-dist"), "other").unwrap();
        fs::write(nested.join("sccache"), "bin").unwrap();

        let found = find_binary(tmp.path(), "sccache").unwrap();
        assert_eq!(found, nested.join("sccache"));
    }

    #[test]
    fn missing_binary_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("LICENSE"), "text").unwrap();
        assert!(find_binary(tmp.path(), "sccache").is_none());
    }

    #[test]
    fn install_copies_and_keeps_source() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("sccache");
        fs::write(&src, "bin").unwrap();
        let install_dir = tmp.path().join("bin");
        fs::create_dir_all(&install_dir).unwrap();

        let installed = install_binary(&src, &install_dir, "sccache").unwrap();
        assert!(src.exists());
        assert_eq!(fs::read_to_string(&installed).unwrap(), "bin");

        #[cfg(unix)]
        assert_eq!(fs::metadata(&installed).unwrap().permissions().mode() & 0o111, 0o111);
    }
}
