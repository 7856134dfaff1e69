// SHA-256 helpers for verifying downloaded release assets.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io;
use std::path::Path;

/// Lowercase hex SHA-256 of a file, streamed so large archives are not held in memory.
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Pulls the digest out of a `.sha256` file. Both the bare-digest form and the
/// `sha256sum` form (`<digest>  <file name>`) are accepted.
///
/// # Returns
/// * `Some(digest)` lowercased, or `None` if the first token is not 64 hex characters.
pub fn parse_checksum_file(contents: &str) -> Option<String> {
    let token = contents.split_whitespace().next()?;
    if token.len() == 64 && token.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(token.to_ascii_lowercase())
    } else {
        None
    }
}
