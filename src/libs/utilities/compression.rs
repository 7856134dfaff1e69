// This module unpacks downloaded release archives (zip, tar.gz, tar.bz2,
// tar.xz and plain tar) into a scratch directory.

// Our custom utility tools from assets
use crate::libs::utilities::assets::{ArchiveKind, detect_file_type};
// Our custom logging macros to give us nicely formatted (and colored!) output.
use crate::{log_debug, log_error};
// Decoder for `.tar.bz2` archives.
use bzip2::read::BzDecoder;
// The 'colored' crate helps us make our console output look pretty and readable.
use colored::Colorize;
// Decoder for `.tar.gz` archives.
use flate2::read::GzDecoder;
// For creating the `extracted` directory and opening the archive.
use std::fs::{self, File};
// `io::Result` for every fallible step; `Read` is what the tar decoders consume.
use std::io::{self, Read};
// For working with the archive and destination paths.
use std::path::{Path, PathBuf};
// The `tar` crate unpacks tar streams, compressed or not.
use tar::Archive;
// Decoder for `.tar.xz` archives.
use xz2::read::XzDecoder;
// The `zip` crate reads Windows release archives.
use zip::ZipArchive;

/// Extracts a release archive into a new `extracted` subdirectory of `dest`.
///
/// # Arguments
/// * `src`: The archive to unpack.
/// * `dest`: The parent directory; `dest/extracted` is created and receives the contents.
/// * `known_file_type`: Skips detection when the caller already knows the format.
///
/// # Returns
/// * `io::Result<PathBuf>`: the path of the `extracted` directory, or an
///   `InvalidData` error for unsupported formats.
pub fn extract_archive(
    src: &Path,
    dest: &Path,
    known_file_type: Option<ArchiveKind>,
) -> io::Result<PathBuf> {
    log_debug!(
        "[Extract] Extracting archive {} into {}",
        src.display().to_string().blue(),
        dest.display().to_string().cyan()
    );

    let Some(kind) = known_file_type.or_else(|| detect_file_type(src)) else {
        log_error!("[Extract] Unsupported archive type for {}", src.display().to_string().red());
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("unsupported archive type: {}", src.display()),
        ));
    };

    let extracted_path = dest.join("extracted");
    fs::create_dir_all(&extracted_path)?;

    let file = File::open(src)?;
    match kind {
        ArchiveKind::Zip => {
            let mut archive = ZipArchive::new(file)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
            archive
                .extract(&extracted_path)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        }
        ArchiveKind::TarGz => unpack_tar(GzDecoder::new(file), &extracted_path)?,
        ArchiveKind::TarBz2 => unpack_tar(BzDecoder::new(file), &extracted_path)?,
        ArchiveKind::TarXz => unpack_tar(XzDecoder::new(file), &extracted_path)?,
        ArchiveKind::Tar => unpack_tar(file, &extracted_path)?,
    }

    log_debug!(
        "[Extract] {:?} archive contents available at: {}",
        kind,
        extracted_path.display().to_string().green()
    );
    Ok(extracted_path)
}

fn unpack_tar<R: Read>(reader: R, into: &Path) -> io::Result<()> {
    Archive::new(reader).unpack(into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    fn write_tar_gz(path: &Path, entry: &str, body: &[u8]) {
        let encoder = GzEncoder::new(File::create(path).unwrap(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        let mut header = tar::Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder.append_data(&mut header, entry, body).unwrap();
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn unpacks_tar_gz_into_extracted_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("tool-x86_64-unknown-linux-musl.tar.gz");
        write_tar_gz(&archive, "tool-v1/tool", b"binary");

        let out = extract_archive(&archive, tmp.path(), None).unwrap();
        assert_eq!(out, tmp.path().join("extracted"));
        assert_eq!(fs::read(out.join("tool-v1/tool")).unwrap(), b"binary");
    }

    #[test]
    fn unpacks_zip() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("tool-x86_64-pc-windows-msvc.zip");
        {
            let mut writer = zip::ZipWriter::new(File::create(&archive).unwrap());
            writer
                .start_file("tool-v1/tool.exe", zip::write::FileOptions::default())
                .unwrap();
            writer.write_all(b"MZ").unwrap();
            writer.finish().unwrap();
        }

        let out = extract_archive(&archive, tmp.path(), None).unwrap();
        assert_eq!(fs::read(out.join("tool-v1/tool.exe")).unwrap(), b"MZ");
    }

    #[test]
    fn known_kind_wins_over_the_file_name() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("download");
        write_tar_gz(&archive, "tool", b"binary");

        assert!(extract_archive(&archive, tmp.path(), None).is_err());
        let out = extract_archive(&archive, tmp.path(), Some(ArchiveKind::TarGz)).unwrap();
        assert_eq!(fs::read(out.join("tool")).unwrap(), b"binary");
    }

    #[test]
    fn unsupported_extension_is_invalid_data() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("tool.pkg");
        fs::write(&archive, b"xar!").unwrap();

        let err = extract_archive(&archive, tmp.path(), None).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
