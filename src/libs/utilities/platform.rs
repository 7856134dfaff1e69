// Our custom logging macros to give us nicely formatted (and colored!) output.
use crate::{log_debug, log_warn};
// The 'colored' crate helps us make our console output look pretty and readable.
use colored::Colorize;

use crate::schemas::install_target::AssetPattern;

/// Normalizes the various spellings of an operating system into
/// "macos", "linux" or "windows". Unknown values are returned lowercased.
///
/// # Arguments
/// * `os`: An input string (`&str`) such as "macOS", "darwin" or "Linux".
pub fn normalize_os(os: &str) -> String {
    match os.to_lowercase().as_str() {
        "macos" | "darwin" | "apple-darwin" => "macos".to_string(),
        "linux" => "linux".to_string(),
        "windows" | "win32" | "win64" => "windows".to_string(),
        other => {
            log_warn!(
                "[Platform] Unknown OS variant '{}', using as-is. This might cause issues with asset matching.",
                other.purple()
            );
            other.to_string()
        }
    }
}

/// Normalizes CPU architecture names into the spelling used by Rust target
/// triples ("x86_64", "aarch64", "i686", "armv7").
///
/// # Arguments
/// * `arch`: An input string (`&str`) such as "arm64", "AMD64" or "x86_64".
pub fn normalize_arch(arch: &str) -> String {
    match arch.to_lowercase().as_str() {
        "aarch64" | "arm64" => "aarch64".to_string(),
        "amd64" | "x86_64" | "x64" => "x86_64".to_string(),
        "x86" | "i386" | "i686" => "i686".to_string(),
        "arm" | "armv7" | "armv7l" => "armv7".to_string(),
        other => {
            log_warn!(
                "[Platform] Unknown ARCH variant '{}', using as-is. This might cause issues with asset matching.",
                other.purple()
            );
            other.to_string()
        }
    }
}

/// Maps a normalized OS/arch pair onto the target triple sccache publishes
/// release archives for. Linux releases are statically linked against musl.
///
/// # Returns
/// * `Some(triple)` for a supported combination, `None` otherwise.
pub fn target_triple(os: &str, arch: &str) -> Option<String> {
    let os = normalize_os(os);
    let arch = normalize_arch(arch);
    let triple = match (os.as_str(), arch.as_str()) {
        ("windows", "x86_64" | "aarch64") => format!("{arch}-pc-windows-msvc"),
        ("macos", "x86_64" | "aarch64") => format!("{arch}-apple-darwin"),
        ("linux", "x86_64" | "aarch64" | "i686") => format!("{arch}-unknown-linux-musl"),
        ("linux", "armv7") => "armv7-unknown-linux-musleabi".to_string(),
        _ => return None,
    };
    Some(triple)
}

/// Archive extension used for release assets on the given OS.
pub fn archive_extension(os: &str) -> &'static str {
    if normalize_os(os) == "windows" {
        ".zip"
    } else {
        ".tar.gz"
    }
}

/// Asset pattern for the platform this binary was compiled for.
/// Unsupported platforms get a best-effort `<arch>-unknown-<os>` triple, which
/// simply fails asset selection later with a descriptive error.
pub fn host_asset_pattern() -> AssetPattern {
    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;
    let triple = target_triple(os, arch).unwrap_or_else(|| {
        log_warn!(
            "[Platform] No known release triple for {}-{}; release download will likely fail.",
            os.yellow(),
            arch.yellow()
        );
        format!("{}-unknown-{}", normalize_arch(arch), normalize_os(os))
    });
    log_debug!("[Platform] Host release triple: {}", triple.cyan());
    AssetPattern::new(triple, archive_extension(os))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_common_platforms_to_release_triples() {
        assert_eq!(
            target_triple("windows", "x86_64").as_deref(),
            Some("x86_64-pc-windows-msvc")
        );
        assert_eq!(
            target_triple("darwin", "arm64").as_deref(),
            Some("aarch64-apple-darwin")
        );
        assert_eq!(
            target_triple("linux", "amd64").as_deref(),
            Some("x86_64-unknown-linux-musl")
        );
        assert_eq!(
            target_triple("linux", "armv7l").as_deref(),
            Some("armv7-unknown-linux-musleabi")
        );
    }

    #[test]
    fn unsupported_combination_has_no_triple() {
        assert_eq!(target_triple("freebsd", "x86_64"), None);
        assert_eq!(target_triple("macos", "i686"), None);
    }

    #[test]
    fn windows_uses_zip_everything_else_tarballs() {
        assert_eq!(archive_extension("Windows"), ".zip");
        assert_eq!(archive_extension("linux"), ".tar.gz");
        assert_eq!(archive_extension("darwin"), ".tar.gz");
    }
}
