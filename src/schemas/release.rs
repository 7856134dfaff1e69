// Data structures for the release listing returned by the GitHub API.
// Serde traits for deserialization of the JSON payload.
use serde::{Deserialize, Serialize};

/// Represents a downloadable asset associated with a GitHub release.
///
/// This struct captures metadata about individual files available for download
/// from a release, such as archives and their checksum companions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    /// The filename of the asset as it appears on GitHub.
    ///
    /// # Example
    /// ```text
    /// "sccache-v0.8.1-x86_64-unknown-linux-musl.tar.gz"
    /// "sccache-v0.8.1-x86_64-pc-windows-msvc.zip"
    /// ```
    pub name: String,

    /// The direct URL for downloading the asset file.
    pub browser_download_url: String,
}

impl ReleaseAsset {
    pub fn new(name: impl Into<String>, browser_download_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            browser_download_url: browser_download_url.into(),
        }
    }
}

/// Represents a GitHub release with its associated downloadable assets.
///
/// Only the fields the installer consumes are modeled; everything else in the
/// API response is ignored by serde.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// The release tag (e.g. "v0.8.1"). Only used for log output.
    #[serde(default)]
    pub tag_name: Option<String>,

    /// Assets in listing order. Asset selection relies on this order being preserved.
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_github_latest_release_payload() {
        let payload = r#"{
            "tag_name": "v0.8.1",
            "draft": false,
            "assets": [
                {"name": "sccache-v0.8.1-x86_64-pc-windows-msvc.zip", "browser_download_url": "https://example.invalid/a.zip", "size": 1},
                {"name": "sccache-v0.8.1-aarch64-apple-darwin.tar.gz", "browser_download_url": "https://example.invalid/b.tar.gz"}
            ]
        }"#;

        let release: Release = serde_json::from_str(payload).unwrap();
        assert_eq!(release.tag_name.as_deref(), Some("v0.8.1"));
        assert_eq!(release.assets.len(), 2);
        assert_eq!(release.assets[0].name, "sccache-v0.8.1-x86_64-pc-windows-msvc.zip");
    }

    #[test]
    fn missing_assets_is_an_empty_listing() {
        let release: Release = serde_json::from_str(r#"{"tag_name": "v1"}"#).unwrap();
        assert!(release.assets.is_empty());
    }
}
