// Fakes shared by the integration tests: a scripted process runner, an
// in-memory release source and helpers for building a throwaway machine.
#![allow(dead_code)]

use flate2::Compression;
use flate2::write::GzEncoder;
use setup_sccache::cli::cmd_enums::PipelineArgs;
use setup_sccache::installers::github::ReleaseSource;
use setup_sccache::libs::command_runner::{CommandOutcome, CommandRunner};
use setup_sccache::libs::paths::SetupOptions;
use setup_sccache::libs::utilities::binary::make_executable;
use setup_sccache::libs::utilities::platform::host_asset_pattern;
use setup_sccache::schemas::errors::InstallError;
use setup_sccache::schemas::install_target::PackageManager;
use setup_sccache::schemas::release::{Release, ReleaseAsset};
use setup_sccache::schemas::settings::Settings;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Writes an executable shell stub called `name` into `dir`.
pub fn fake_executable(dir: &Path, name: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
    make_executable(&path).unwrap();
    path
}

/// Answers sccache's own flags and simulates package manager installs.
#[derive(Default)]
pub struct FakeRunner {
    pub calls: RefCell<Vec<(String, Vec<String>)>>,
    /// When set, a successful package manager run drops an `sccache` stub here.
    pub package_install_dir: Option<PathBuf>,
    /// Package managers whose install subcommand exits non-zero.
    pub failing_managers: Vec<String>,
}

impl FakeRunner {
    pub fn programs(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|(p, _)| p.clone()).collect()
    }

    pub fn sccache_flags(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter(|(p, _)| p == "sccache")
            .map(|(_, args)| args.join(" "))
            .collect()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, program: &Path, args: &[String]) -> io::Result<CommandOutcome> {
        let name = program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.calls.borrow_mut().push((name.clone(), args.to_vec()));

        let ok = |stdout: &str| CommandOutcome {
            success: true,
            code: Some(0),
            stdout: stdout.to_string(),
            stderr: String::new(),
        };

        match name.as_str() {
            "sccache" => Ok(match args.first().map(String::as_str) {
                Some("--version") => ok("sccache 0.8.1\n"),
                Some("--show-stats") => ok("Compile requests                      0\n"),
                _ => ok(""),
            }),
            manager if self.failing_managers.iter().any(|m| m == manager) => Ok(CommandOutcome {
                success: false,
                code: Some(1),
                stdout: String::new(),
                stderr: format!("{manager}: package not found"),
            }),
            _ => {
                if let Some(dir) = &self.package_install_dir {
                    fake_executable(dir, "sccache");
                }
                Ok(ok(""))
            }
        }
    }
}

/// Serves one listing and a set of files keyed by URL.
pub struct FakeReleaseSource {
    pub release: Release,
    pub files: HashMap<String, Vec<u8>>,
    pub downloads: RefCell<Vec<String>>,
    pub listing_requests: RefCell<usize>,
}

impl FakeReleaseSource {
    /// A listing with the `sccache-dist` archive for this platform, an asset
    /// for another platform, and then the host asset, whose archive holds
    /// `sccache` inside a versioned directory.
    pub fn with_host_asset() -> Self {
        let pattern = host_asset_pattern();
        let host_name = format!("sccache-v0.8.1-{}{}", pattern.triple, pattern.extension);
        let dist_name = format!("sccache-dist-v0.8.1-{}{}", pattern.triple, pattern.extension);
        let entry = format!("sccache-v0.8.1-{}/sccache", pattern.triple);
        let archive = tar_gz(&[(entry.as_str(), b"#!/bin/sh\nexit 0\n".as_slice())]);
        Self {
            release: Release {
                tag_name: Some("v0.8.1".to_string()),
                assets: vec![
                    ReleaseAsset::new(dist_name, "https://dl/dist"),
                    ReleaseAsset::new("sccache-v0.8.1-riscv64-unknown-none.tar.gz", "https://dl/other"),
                    ReleaseAsset::new(host_name, "https://dl/host"),
                ],
            },
            files: HashMap::from([("https://dl/host".to_string(), archive)]),
            downloads: RefCell::new(Vec::new()),
            listing_requests: RefCell::new(0),
        }
    }

    /// A listing with no asset for this platform.
    pub fn without_host_asset() -> Self {
        let mut source = Self::with_host_asset();
        source.release.assets.retain(|a| a.browser_download_url != "https://dl/host");
        source
    }
}

impl ReleaseSource for FakeReleaseSource {
    fn latest_release(&self, _url: &str) -> Result<Release, InstallError> {
        *self.listing_requests.borrow_mut() += 1;
        Ok(self.release.clone())
    }

    fn download(&self, url: &str, dest: &Path) -> Result<(), InstallError> {
        self.downloads.borrow_mut().push(url.to_string());
        let body = self.files.get(url).ok_or_else(|| InstallError::DownloadFailed {
            url: url.to_string(),
            reason: "HTTP 404 Not Found".to_string(),
        })?;
        fs::write(dest, body).map_err(|source| InstallError::Io {
            path: dest.to_path_buf(),
            source,
        })
    }
}

pub fn tar_gz(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (path, body) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder.append_data(&mut header, path, *body).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

/// A scratch machine: a project, an install dir, a cache dir and an empty
/// directory standing in for the process PATH.
pub struct Sandbox {
    pub root: tempfile::TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("project")).unwrap();
        fs::create_dir_all(root.path().join("path-bin")).unwrap();
        Self { root }
    }

    pub fn project(&self) -> PathBuf {
        self.root.path().join("project")
    }

    pub fn install_dir(&self) -> PathBuf {
        self.root.path().join("install").join("bin")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.root.path().join("cache")
    }

    /// Directory on the fake process PATH.
    pub fn path_bin(&self) -> PathBuf {
        self.root.path().join("path-bin")
    }

    pub fn config_file(&self) -> PathBuf {
        self.project().join(".cargo").join("config.toml")
    }

    pub fn options(&self, managers: Vec<PackageManager>) -> SetupOptions {
        let args = PipelineArgs {
            project: Some(self.project()),
            install_dir: Some(self.install_dir()),
            cache_dir: Some(self.cache_dir()),
            cache_size: None,
            skip_project_config: false,
        };
        let settings = Settings {
            package_managers: Some(managers),
            ..Default::default()
        };
        SetupOptions::resolve(&args, &settings).unwrap()
    }
}
