// Installation methods tried by the install stage.

/// Declares the `package_manager` module, which asks scoop, winget, choco,
/// brew or cargo to install the tool, in the configured order.
pub mod package_manager;

/// Declares the `github` module, the fallback that downloads the release
/// archive, verifies and extracts it, and copies the binary into place.
pub mod github;
