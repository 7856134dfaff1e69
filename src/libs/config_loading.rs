use crate::libs::paths::default_settings_path;
use crate::libs::utilities::path_helpers::expand_path;
use crate::schemas::errors::SettingsError;
use crate::schemas::settings::Settings;
use crate::{log_debug, log_info};
use colored::Colorize;
use std::fs;
use std::io;
use std::path::Path;

/// Loads the YAML settings file.
///
/// An explicitly requested file must exist. The default location
/// (`~/.setup-sccache/config.yaml`) is optional; when it is absent the built-in
/// defaults are used. An empty file is the same as an absent one.
///
/// # Arguments
/// * `explicit`: Path given with `--settings` or `SETUP_SCCACHE_CONFIG`, if any.
///
/// # Returns
/// * `Ok(Settings)` with every field the file provided.
/// * `Err(SettingsError)` if the file cannot be read or does not match the schema.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings, SettingsError> {
    let (path, required) = match explicit {
        Some(path) => (expand_path(&path.to_string_lossy()), true),
        None => (default_settings_path(), false),
    };
    log_debug!("[Settings] Looking for settings at {}", path.display().to_string().blue());

    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound && !required => {
            log_debug!("[Settings] No settings file, using defaults");
            return Ok(Settings::default());
        }
        Err(source) => return Err(SettingsError::Read { path, source }),
    };

    if contents.trim().is_empty() {
        return Ok(Settings::default());
    }

    let settings = serde_yaml::from_str::<Settings>(&contents)
        .map_err(|source| SettingsError::Parse {
            path: path.clone(),
            source,
        })?;
    log_info!("[Settings] Loaded {}", path.display().to_string().green());
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::install_target::PackageManager;

    #[test]
    fn explicit_file_is_parsed() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        fs::write(
            &path,
            "cache_size: 20G\npackage_managers: [cargo]\nverify_checksum: false\n",
        )
        .unwrap();

        let settings = load_settings(Some(&path)).unwrap();
        assert_eq!(settings.cache_size.as_deref(), Some("20G"));
        assert_eq!(settings.package_managers, Some(vec![PackageManager::Cargo]));
        assert_eq!(settings.verify_checksum, Some(false));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = load_settings(Some(&tmp.path().join("nope.yaml"))).unwrap_err();
        assert!(matches!(err, SettingsError::Read { .. }));
    }

    #[test]
    fn empty_file_means_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        fs::write(&path, "  \n").unwrap();
        assert_eq!(load_settings(Some(&path)).unwrap(), Settings::default());
    }

    #[test]
    fn schema_violations_are_parse_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        fs::write(&path, "package_managers: [apt]\n").unwrap();
        let err = load_settings(Some(&path)).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
    }
}
