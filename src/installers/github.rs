// Installs the target from its GitHub release archive when no package manager could.
// It queries the release listing, selects the asset for the current platform,
// downloads and optionally verifies it, extracts it, and copies the binary into
// the install directory. All intermediate files live in a scoped temporary
// directory which is removed on every exit path.

// Creates the install directory when it does not exist yet.
use crate::libs::directory::ensure_dir;
// Picking the platform asset (and its checksum companion) out of the listing,
// and telling the archive format from the asset name.
use crate::libs::utilities::assets::{detect_file_type, find_checksum_asset, select_asset};
// Locating the executable inside the extracted tree and copying it into place.
use crate::libs::utilities::binary::{find_binary, install_binary};
// SHA-256 of the downloaded archive against the published `.sha256` file.
use crate::libs::utilities::checksum::{parse_checksum_file, sha256_file};
// Unpacks zip and tar based archives.
use crate::libs::utilities::compression::extract_archive;
// Every failure of this installer is reported as an `InstallError`.
use crate::schemas::errors::InstallError;
// What to install and which asset name pattern to look for.
use crate::schemas::install_target::InstallTarget;
// Models of the GitHub "latest release" JSON response.
use crate::schemas::release::{Release, ReleaseAsset};
// Our custom logging macros to give us nicely formatted (and colored!) output.
use crate::{log_debug, log_info, log_warn};
// For colored terminal output, making logs more readable.
use colored::Colorize;
// File handles for streaming downloads to disk.
use std::fs::{self, File};
// `io::copy` streams the HTTP body into the file.
use std::io;
// For the work directory, archive and install paths.
use std::path::{Path, PathBuf};
// Connect and read timeouts of the HTTP agent.
use std::time::Duration;

/// Network access needed by the release fallback: the listing and the file downloads.
pub trait ReleaseSource {
    /// Fetches and parses the release listing at `url`.
    fn latest_release(&self, url: &str) -> Result<Release, InstallError>;

    /// Downloads `url` into the file `dest`, replacing it if present.
    fn download(&self, url: &str, dest: &Path) -> Result<(), InstallError>;
}

/// [`ReleaseSource`] backed by a `ureq` agent with explicit timeouts.
pub struct HttpReleaseSource {
    agent: ureq::Agent,
}

impl HttpReleaseSource {
    /// # Arguments
    /// * `connect_timeout` - Limit for establishing a connection.
    /// * `read_timeout` - Limit for each read from an established connection.
    pub fn new(connect_timeout: Duration, read_timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(connect_timeout)
            .timeout_read(read_timeout)
            .user_agent(concat!("setup-sccache/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { agent }
    }

    fn get(&self, url: &str) -> Result<ureq::Response, InstallError> {
        let failed = |reason: String| InstallError::DownloadFailed {
            url: url.to_string(),
            reason,
        };
        match self.agent.get(url).call() {
            Ok(response) => Ok(response),
            Err(ureq::Error::Status(code, response)) => Err(failed(format!(
                "HTTP {code} {}",
                response.status_text()
            ))),
            Err(e) => Err(failed(e.to_string())),
        }
    }
}

impl ReleaseSource for HttpReleaseSource {
    fn latest_release(&self, url: &str) -> Result<Release, InstallError> {
        log_debug!("[GitHub] Fetching release listing from {}", url.blue());
        let response = self.get(url)?;
        serde_json::from_reader::<_, Release>(response.into_reader())
            .map_err(|e| InstallError::DownloadFailed {
                url: url.to_string(),
                reason: format!("invalid release listing: {e}"),
            })
    }

    fn download(&self, url: &str, dest: &Path) -> Result<(), InstallError> {
        log_debug!("[GitHub] Downloading {} to {}", url.blue(), dest.display());
        let response = self.get(url)?;
        let mut file = File::create(dest).map_err(|source| InstallError::Io {
            path: dest.to_path_buf(),
            source,
        })?;
        io::copy(&mut response.into_reader(), &mut file).map_err(|e| {
            InstallError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(())
    }
}

/// Downloads and installs the release binary of an [`InstallTarget`].
pub struct ReleaseFetcher<'a> {
    source: &'a dyn ReleaseSource,
    verify_checksum: bool,
}

impl<'a> ReleaseFetcher<'a> {
    pub fn new(source: &'a dyn ReleaseSource, verify_checksum: bool) -> Self {
        Self {
            source,
            verify_checksum,
        }
    }

    /// Installs the target's binary into `install_dir`, creating it if needed.
    ///
    /// # Returns
    /// * `Ok(PathBuf)` - The installed binary.
    /// * `Err(InstallError::NoMatchingAsset)` - Raised before any asset is downloaded.
    /// * `Err(InstallError)` - Any download, verification, extraction or copy failure.
    pub fn fetch_binary(
        &self,
        target: &InstallTarget,
        install_dir: &Path,
    ) -> Result<PathBuf, InstallError> {
        let release = self.source.latest_release(&target.release_url)?;
        log_info!(
            "[GitHub] Latest release: {}",
            release.tag_name.as_deref().unwrap_or("unknown").bold()
        );
        let asset = select_asset(&release.assets, &target.asset_pattern)?;

        let temp_root = std::env::temp_dir();
        let work = tempfile::Builder::new()
            .prefix("setup-sccache-")
            .tempdir()
            .map_err(|source| InstallError::Io {
                path: temp_root,
                source,
            })?;

        let archive = work.path().join(local_file_name(&asset.name));
        log_info!("[GitHub] Downloading {}", asset.name.bold());
        self.source.download(&asset.browser_download_url, &archive)?;

        if self.verify_checksum {
            self.verify(&release.assets, asset, &archive, work.path())?;
        }

        // The asset name is authoritative for the format; the local copy may
        // have been renamed by `local_file_name`.
        let kind = detect_file_type(Path::new(&asset.name));
        let extracted = extract_archive(&archive, work.path(), kind).map_err(|e| {
            InstallError::ExtractionFailed {
                archive: archive.clone(),
                reason: e.to_string(),
            }
        })?;

        let found = find_binary(&extracted, &target.binary_filename).ok_or_else(|| {
            InstallError::BinaryNotFoundInArchive {
                binary: target.binary_filename.clone(),
                archive: archive.clone(),
            }
        })?;

        ensure_dir(install_dir).map_err(|source| InstallError::Io {
            path: install_dir.to_path_buf(),
            source,
        })?;
        let installed = install_binary(&found, install_dir, &target.binary_filename).map_err(
            |source| InstallError::Io {
                path: install_dir.join(&target.binary_filename),
                source,
            },
        )?;

        log_info!(
            "[GitHub] Installed {} to {}",
            target.binary_filename.bold(),
            installed.display().to_string().green()
        );
        Ok(installed)
    }

    /// Compares the archive digest with the `<asset>.sha256` companion, when the
    /// release publishes one.
    fn verify(
        &self,
        assets: &[ReleaseAsset],
        asset: &ReleaseAsset,
        archive: &Path,
        work_dir: &Path,
    ) -> Result<(), InstallError> {
        let Some(companion) = find_checksum_asset(assets, asset) else {
            log_warn!(
                "[GitHub] No checksum published for {}; skipping verification",
                asset.name.yellow()
            );
            return Ok(());
        };

        let checksum_path = work_dir.join(local_file_name(&companion.name));
        self.source
            .download(&companion.browser_download_url, &checksum_path)?;
        let io_error = |path: &Path| {
            let path = path.to_path_buf();
            move |source: io::Error| InstallError::Io { path, source }
        };
        let contents = fs::read_to_string(&checksum_path).map_err(io_error(&checksum_path))?;

        let Some(expected) = parse_checksum_file(&contents) else {
            log_warn!(
                "[GitHub] {} does not contain a SHA-256 digest; skipping verification",
                companion.name.yellow()
            );
            return Ok(());
        };
        let actual = sha256_file(archive).map_err(io_error(archive))?;

        if actual != expected {
            return Err(InstallError::ChecksumMismatch {
                asset: asset.name.clone(),
                expected,
                actual,
            });
        }
        log_info!("[GitHub] Checksum verified for {}", asset.name.green());
        Ok(())
    }
}

// Asset names come from the network; never let one escape the work directory.
fn local_file_name(asset_name: &str) -> String {
    Path::new(asset_name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty() && n != "..")
        .unwrap_or_else(|| "download".to_string())
}
