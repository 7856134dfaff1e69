// Error types for each provisioning stage.
// Package manager failures are recovered inside the installer chain; every
// other variant propagates to the command layer, which attaches the stage name
// and aborts the pipeline.

// Paths of the files involved in a failure.
use std::path::PathBuf;
// `thiserror` derives `Display` and `Error` from the `#[error]` messages.
use thiserror::Error;

/// Failures while making the tool resolvable.
#[derive(Error, Debug)]
pub enum InstallError {
    /// The candidate's own executable is not on the search path. Recovered locally.
    #[error("package manager '{manager}' is not available on this system")]
    PackageManagerUnavailable { manager: String },

    /// The candidate ran but its install subcommand did not succeed. Recovered locally.
    #[error("'{manager}' could not install the package: {reason}")]
    PackageManagerFailed { manager: String, reason: String },

    #[error("failed to download {url}: {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("no release asset matches '{pattern}' (available: {available})")]
    NoMatchingAsset { pattern: String, available: String },

    #[error("failed to extract {archive}: {reason}")]
    ExtractionFailed { archive: PathBuf, reason: String },

    #[error("checksum mismatch for {asset}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        asset: String,
        expected: String,
        actual: String,
    },

    #[error("'{binary}' was not found inside the extracted archive {archive}")]
    BinaryNotFoundInArchive { binary: String, archive: PathBuf },

    #[error("'{executable}' is still not resolvable after installing via {method}; open a new shell or add its directory to PATH")]
    NotFoundAfterInstall { executable: String, method: String },

    #[error("filesystem error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Env(#[from] EnvError),
}

/// Failures while merging the project configuration fragment.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O failure on {path}: {source}")]
    IoFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("refusing to edit {path}: {reason}")]
    MalformedExistingDocument { path: PathBuf, reason: String },
}

/// Failures while reading or writing user scoped environment variables.
#[derive(Error, Debug)]
pub enum EnvError {
    #[error("failed to persist environment variable {name}: {reason}")]
    PersistFailure { name: String, reason: String },

    /// Never propagated past the configurator; the persisted value still applies to new processes.
    #[error("failed to set {name} in the current process: {reason}")]
    MirrorFailure { name: String, reason: String },
}

/// Failures while invoking the installed tool for its version and statistics.
#[derive(Error, Debug)]
pub enum StatsError {
    #[error("'{executable}' is not resolvable on the current search path")]
    NotResolvable { executable: String },

    #[error("`{command}` failed: {reason}")]
    ToolFailed { command: String, reason: String },
}

/// Failures while loading the optional YAML settings file.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
