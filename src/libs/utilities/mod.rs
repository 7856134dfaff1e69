// Low level helpers used by the installers and the configuration stages.

// Path expansion and default locations.
pub mod path_helpers;
// Archive extraction.
pub mod compression;
// OS/arch detection and release triples.
pub mod platform;
// Release asset selection and archive classification.
pub mod assets;
// Locating and installing the extracted binary.
pub mod binary;
// SHA-256 verification of downloads.
pub mod checksum;
// Atomic file replacement.
pub mod file_operations;
