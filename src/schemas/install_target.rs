// Describes what gets installed and through which package managers.
// An `InstallTarget` is built once per run and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default release listing for sccache.
pub const SCCACHE_LATEST_RELEASE_URL: &str =
    "https://api.github.com/repos/mozilla/sccache/releases/latest";

/// A system level installer that can be asked to install the target tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    Scoop,
    Winget,
    Choco,
    Brew,
    Cargo,
}

impl PackageManager {
    /// Name of the executable that has to be resolvable for this manager to be attempted.
    pub fn program(&self) -> &'static str {
        match self {
            PackageManager::Scoop => "scoop",
            PackageManager::Winget => "winget",
            PackageManager::Choco => "choco",
            PackageManager::Brew => "brew",
            PackageManager::Cargo => "cargo",
        }
    }

    /// Arguments of the install subcommand, each manager with its own syntax.
    pub fn install_args(&self, target: &InstallTarget) -> Vec<String> {
        let package = target.package_name.clone();
        match self {
            PackageManager::Scoop => vec!["install".into(), package],
            PackageManager::Winget => vec![
                "install".into(),
                "--id".into(),
                target.winget_id.clone(),
                "--exact".into(),
                "--silent".into(),
                "--accept-source-agreements".into(),
                "--accept-package-agreements".into(),
            ],
            PackageManager::Choco => vec!["install".into(), package, "-y".into()],
            PackageManager::Brew => vec!["install".into(), package],
            PackageManager::Cargo => vec!["install".into(), package, "--locked".into()],
        }
    }

    /// Candidate order used when the settings file does not provide one.
    pub fn platform_defaults() -> Vec<PackageManager> {
        if cfg!(windows) {
            vec![
                PackageManager::Scoop,
                PackageManager::Winget,
                PackageManager::Choco,
                PackageManager::Cargo,
            ]
        } else {
            vec![PackageManager::Brew, PackageManager::Cargo]
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

/// Asset name pattern: an optional name prefix, the platform triple and the
/// archive extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPattern {
    /// Start of the asset name, e.g. `sccache-v`. Empty matches any name.
    pub prefix: String,
    pub triple: String,
    pub extension: String,
}

impl AssetPattern {
    pub fn new(triple: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            prefix: String::new(),
            triple: triple.into(),
            extension: extension.into(),
        }
    }

    /// Restricts the pattern to names starting with `prefix`. Releases that
    /// ship sibling tools (`sccache-dist-v0.8.1-...`) need this to pick the
    /// right archive.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// True when the asset name starts with the prefix, carries the triple
    /// and ends with the extension.
    pub fn matches(&self, asset_name: &str) -> bool {
        asset_name.starts_with(&self.prefix)
            && asset_name.contains(&self.triple)
            && asset_name.ends_with(&self.extension)
    }
}

impl fmt::Display for AssetPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}*{}*{}", self.prefix, self.triple, self.extension)
    }
}

/// Everything the orchestrator needs to know about the tool it installs.
#[derive(Debug, Clone)]
pub struct InstallTarget {
    /// Executable name probed on the search path, e.g. `sccache`.
    pub executable: String,
    /// Package name handed to scoop/choco/brew/cargo.
    pub package_name: String,
    /// Package identifier handed to winget.
    pub winget_id: String,
    /// Package managers in the order they are attempted.
    pub package_managers: Vec<PackageManager>,
    pub asset_pattern: AssetPattern,
    /// File name of the binary inside the release archive (`sccache.exe` on Windows).
    pub binary_filename: String,
    pub release_url: String,
}

impl InstallTarget {
    /// The sccache target for the platform this binary was compiled for.
    pub fn sccache(package_managers: Vec<PackageManager>, release_url: impl Into<String>) -> Self {
        let package_name = "sccache".to_string();
        // Release archives are named `<package>-v<version>-<triple><ext>`.
        let asset_pattern = crate::libs::utilities::platform::host_asset_pattern()
            .with_prefix(format!("{package_name}-v"));
        Self {
            executable: "sccache".to_string(),
            package_name,
            winget_id: "Mozilla.sccache".to_string(),
            package_managers,
            asset_pattern,
            binary_filename: format!("sccache{}", std::env::consts::EXE_SUFFIX),
            release_url: release_url.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> InstallTarget {
        InstallTarget::sccache(PackageManager::platform_defaults(), SCCACHE_LATEST_RELEASE_URL)
    }

    #[test]
    fn each_manager_uses_its_own_install_syntax() {
        let t = target();
        assert_eq!(PackageManager::Scoop.install_args(&t), vec!["install", "sccache"]);
        assert_eq!(PackageManager::Choco.install_args(&t), vec!["install", "sccache", "-y"]);
        assert_eq!(
            PackageManager::Cargo.install_args(&t),
            vec!["install", "sccache", "--locked"]
        );
        let winget = PackageManager::Winget.install_args(&t);
        assert_eq!(&winget[..3], &["install", "--id", "Mozilla.sccache"]);
    }

    #[test]
    fn pattern_requires_triple_and_extension() {
        let pattern = AssetPattern::new("x86_64-pc-windows-msvc", ".zip");
        assert!(pattern.matches("sccache-v0.8.1-x86_64-pc-windows-msvc.zip"));
        assert!(!pattern.matches("sccache-v0.8.1-x86_64-pc-windows-msvc.zip.sha256"));
        assert!(!pattern.matches("sccache-v0.8.1-aarch64-apple-darwin.tar.gz"));
    }

    #[test]
    fn prefix_skips_sibling_tools_built_for_the_same_triple() {
        let pattern =
            AssetPattern::new("x86_64-unknown-linux-musl", ".tar.gz").with_prefix("sccache-v");
        assert!(pattern.matches("sccache-v0.8.1-x86_64-unknown-linux-musl.tar.gz"));
        assert!(!pattern.matches("sccache-dist-v0.8.1-x86_64-unknown-linux-musl.tar.gz"));
        assert_eq!(
            pattern.to_string(),
            "sccache-v*x86_64-unknown-linux-musl*.tar.gz"
        );
    }

    #[test]
    fn sccache_target_is_anchored_on_the_package_name() {
        assert_eq!(target().asset_pattern.prefix, "sccache-v");
    }

    #[test]
    fn package_managers_deserialize_lowercase() {
        let parsed: Vec<PackageManager> = serde_yaml::from_str("[scoop, winget, cargo]").unwrap();
        assert_eq!(
            parsed,
            vec![PackageManager::Scoop, PackageManager::Winget, PackageManager::Cargo]
        );
    }
}
