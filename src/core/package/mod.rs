//! # Package Module
//!
//! ZIP container assembly and verification.
//!
//! A finished record becomes one container holding exactly three members:
//! the archival TIFF, the metadata XML, and the governing manifest.
//! Members are stored flat under their file names. Verification reads the
//! central directory back and checks the membership roles, which is what
//! post-flight runs over every container on disk.

use crate::error::ProcessError;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Writes one container from a list of member files.
///
/// Trait seam so the pipeline can be exercised against a failing packager
/// without breaking real archives.
pub trait ArchiveWriter: Send + Sync {
    fn package(&self, container: &Path, members: &[PathBuf]) -> Result<(), ProcessError>;
}

/// Production packager: deflate-compressed ZIP via the zip crate.
pub struct ZipPackager;

impl ZipPackager {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ZipPackager {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveWriter for ZipPackager {
    fn package(&self, container: &Path, members: &[PathBuf]) -> Result<(), ProcessError> {
        let archive_error = |reason: String| ProcessError::Archive {
            path: container.to_path_buf(),
            reason,
        };

        let file =
            File::create(container).map_err(|e| archive_error(format!("create failed: {e}")))?;
        let mut writer = ZipWriter::new(file);
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        // A partial container would be double-counted by reconciliation,
        // so failures remove it before returning.
        let result = (|| {
            for member in members {
                let name = member
                    .file_name()
                    .and_then(|n| n.to_str())
                    .ok_or_else(|| {
                        archive_error(format!(
                            "member {} has no usable file name",
                            member.display()
                        ))
                    })?;

                writer
                    .start_file(name, options)
                    .map_err(|e| archive_error(format!("cannot add member {name}: {e}")))?;

                let mut source = File::open(member).map_err(|e| {
                    archive_error(format!("cannot read member {}: {e}", member.display()))
                })?;
                io::copy(&mut source, &mut writer).map_err(|e| {
                    archive_error(format!("cannot copy member {}: {e}", member.display()))
                })?;
            }

            writer
                .finish()
                .map_err(|e| archive_error(format!("cannot finalize archive: {e}")))?;
            Ok(())
        })();

        if result.is_err() {
            let _ = fs::remove_file(container);
        } else {
            debug!(
                container = %container.display(),
                members = members.len(),
                "container written"
            );
        }
        result
    }
}

/// Checks one container's membership: exactly three members, one archival
/// image, one metadata file, one manifest.
///
/// Returns the full list of problems as one reason string so an audit note
/// can name everything wrong at once.
pub fn verify_container(container: &Path) -> Result<(), String> {
    let file = File::open(container).map_err(|e| format!("cannot open container: {e}"))?;
    let archive = ZipArchive::new(file).map_err(|e| format!("not a readable ZIP archive: {e}"))?;

    let mut image_count = 0usize;
    let mut metadata_count = 0usize;
    let mut manifest_count = 0usize;
    for name in archive.file_names() {
        let lower = name.to_lowercase();
        if lower.ends_with(".tiff") || lower.ends_with(".tif") {
            image_count += 1;
        } else if lower.ends_with(".xml") {
            metadata_count += 1;
        } else if lower == crate::core::scanner::MANIFEST_FILE_NAME {
            manifest_count += 1;
        }
    }

    let mut problems = Vec::new();
    if archive.len() != 3 {
        problems.push(format!("{} members, expected 3", archive.len()));
    }
    if image_count != 1 {
        problems.push(format!(
            "{image_count} archival image members, expected 1"
        ));
    }
    if metadata_count != 1 {
        problems.push(format!("{metadata_count} metadata members, expected 1"));
    }
    if manifest_count != 1 {
        problems.push(format!("{manifest_count} manifest members, expected 1"));
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems.join("; "))
    }
}
