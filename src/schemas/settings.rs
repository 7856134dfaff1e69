use crate::schemas::install_target::PackageManager;
use serde::{Deserialize, Serialize};

/// Schema for the optional `~/.setup-sccache/config.yaml` settings file.
/// Every field is optional; anything left out falls back to the built-in default,
/// and command line flags win over both.
///
/// ```yaml
/// install_dir: ~/.local/bin
/// cache_dir: ~/.cache/sccache
/// cache_size: 20G
/// package_managers: [scoop, cargo]
/// verify_checksum: true
/// ```
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Directory the release binary is copied into when no package manager succeeds.
    pub install_dir: Option<String>,
    /// Value for `SCCACHE_DIR`.
    pub cache_dir: Option<String>,
    /// Value for `SCCACHE_CACHE_SIZE`, e.g. "10G".
    pub cache_size: Option<String>,
    /// Release listing endpoint queried for the direct-download fallback.
    pub release_url: Option<String>,
    /// Package managers to try, in order. An empty list goes straight to the release download.
    pub package_managers: Option<Vec<PackageManager>>,
    pub connect_timeout_secs: Option<u64>,
    pub read_timeout_secs: Option<u64>,
    /// Verify the downloaded archive against its `.sha256` companion asset when one is published.
    pub verify_checksum: Option<bool>,
}
