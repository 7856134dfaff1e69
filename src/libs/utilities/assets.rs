// Helpers for picking the right file out of a release listing and for
// classifying the downloaded archive.

use crate::schemas::errors::InstallError;
use crate::schemas::install_target::AssetPattern;
use crate::schemas::release::ReleaseAsset;
use crate::{log_debug, log_info};
use colored::Colorize;
use std::path::Path;

/// Selects the release asset matching `pattern`.
///
/// The first match in listing order wins; there is no further preference
/// ordering between several matches.
///
/// # Arguments
/// * `assets`: The assets of a release, in the order the listing returned them.
/// * `pattern`: Platform triple plus archive extension the asset name must carry.
///
/// # Returns
/// * `Ok(&ReleaseAsset)` for the first matching asset.
/// * `Err(InstallError::NoMatchingAsset)` when nothing matches, listing what was available.
pub fn select_asset<'a>(
    assets: &'a [ReleaseAsset],
    pattern: &AssetPattern,
) -> Result<&'a ReleaseAsset, InstallError> {
    match assets.iter().find(|asset| pattern.matches(&asset.name)) {
        Some(asset) => {
            log_info!("[Release] Found matching asset: {}", asset.name.bold());
            Ok(asset)
        }
        None => {
            let available = assets
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            Err(InstallError::NoMatchingAsset {
                pattern: pattern.to_string(),
                available: if available.is_empty() {
                    "none".to_string()
                } else {
                    available
                },
            })
        }
    }
}

/// Finds the `<asset>.sha256` companion published next to `asset`, if any.
pub fn find_checksum_asset<'a>(
    assets: &'a [ReleaseAsset],
    asset: &ReleaseAsset,
) -> Option<&'a ReleaseAsset> {
    let wanted = format!("{}.sha256", asset.name);
    let found = assets.iter().find(|a| a.name == wanted);
    log_debug!(
        "[Release] Checksum companion for {}: {}",
        asset.name,
        found.map(|a| a.name.as_str()).unwrap_or("none")
    );
    found
}

/// Archive formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    TarGz,
    TarBz2,
    TarXz,
    Tar,
}

/// Classifies an archive by its file name. Compound extensions are checked
/// before single ones so `.tar.gz` never reads as plain `.gz`.
///
/// # Returns
/// * `Some(ArchiveKind)` for a supported archive, `None` otherwise.
pub fn detect_file_type(path: &Path) -> Option<ArchiveKind> {
    let file_name = path.file_name()?.to_str()?.to_lowercase();

    if file_name.ends_with(".tar.gz") || file_name.ends_with(".tgz") {
        Some(ArchiveKind::TarGz)
    } else if file_name.ends_with(".tar.xz") || file_name.ends_with(".txz") {
        Some(ArchiveKind::TarXz)
    } else if file_name.ends_with(".tar.bz2")
        || file_name.ends_with(".tbz")
        || file_name.ends_with(".tbz2")
    {
        Some(ArchiveKind::TarBz2)
    } else if file_name.ends_with(".zip") {
        Some(ArchiveKind::Zip)
    } else if file_name.ends_with(".tar") {
        Some(ArchiveKind::Tar)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> Vec<ReleaseAsset> {
        vec![
            ReleaseAsset::new(
                "tool-x86_64-pc-windows-msvc.zip",
                "https://example.invalid/windows.zip",
            ),
            ReleaseAsset::new(
                "tool-aarch64-apple-darwin.tar.gz",
                "https://example.invalid/darwin.tar.gz",
            ),
        ]
    }

    #[test]
    fn selects_exactly_the_matching_asset() {
        let assets = listing();
        let pattern = AssetPattern::new("x86_64-pc-windows-msvc", ".zip");
        let chosen = select_asset(&assets, &pattern).unwrap();
        assert_eq!(chosen, &assets[0]);
    }

    #[test]
    fn first_match_in_listing_order_wins() {
        let mut assets = listing();
        assets.push(ReleaseAsset::new(
            "tool-x86_64-pc-windows-msvc-debug.zip",
            "https://example.invalid/debug.zip",
        ));
        assets.swap(0, 2);
        let pattern = AssetPattern::new("x86_64-pc-windows-msvc", ".zip");
        let chosen = select_asset(&assets, &pattern).unwrap();
        assert_eq!(chosen.name, "tool-x86_64-pc-windows-msvc-debug.zip");
    }

    #[test]
    fn zero_matches_is_no_matching_asset() {
        let assets = listing();
        let pattern = AssetPattern::new("x86_64-unknown-linux-musl", ".tar.gz");
        let err = select_asset(&assets, &pattern).unwrap_err();
        match err {
            InstallError::NoMatchingAsset { available, .. } => {
                assert!(available.contains("tool-aarch64-apple-darwin.tar.gz"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn checksum_companion_is_found_by_name() {
        let mut assets = listing();
        assets.push(ReleaseAsset::new(
            "tool-x86_64-pc-windows-msvc.zip.sha256",
            "https://example.invalid/windows.zip.sha256",
        ));
        let checksum = find_checksum_asset(&assets, &assets[0]).unwrap();
        assert_eq!(checksum.name, "tool-x86_64-pc-windows-msvc.zip.sha256");
        assert!(find_checksum_asset(&assets, &assets[1]).is_none());
    }

    #[test]
    fn archive_kinds_are_detected_by_extension() {
        assert_eq!(detect_file_type(Path::new("a.tar.gz")), Some(ArchiveKind::TarGz));
        assert_eq!(detect_file_type(Path::new("A.ZIP")), Some(ArchiveKind::Zip));
        assert_eq!(detect_file_type(Path::new("a.tar.xz")), Some(ArchiveKind::TarXz));
        assert_eq!(detect_file_type(Path::new("a.tbz2")), Some(ArchiveKind::TarBz2));
        assert_eq!(detect_file_type(Path::new("a.tar")), Some(ArchiveKind::Tar));
        assert_eq!(detect_file_type(Path::new("a.gz")), None);
        assert_eq!(detect_file_type(Path::new("a.pkg")), None);
    }
}
