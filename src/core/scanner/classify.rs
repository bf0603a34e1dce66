//! File classification rules.

use super::FileKind;
use std::path::Path;

/// Manifest files carry this exact name, compared case-insensitively
pub const MANIFEST_FILE_NAME: &str = "manifest.ini";

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg"];
const METADATA_EXTENSION: &str = "xml";

/// Classify a single file, or `None` if it plays no role in ingest.
///
/// The manifest check runs on the full file name, so `MANIFEST.INI` and
/// `Manifest.ini` both count; extension checks are case-insensitive too.
pub fn classify(path: &Path) -> Option<FileKind> {
    let name = path.file_name()?.to_str()?;

    if name.eq_ignore_ascii_case(MANIFEST_FILE_NAME) {
        return Some(FileKind::Manifest);
    }

    let extension = path.extension()?.to_str()?.to_lowercase();
    if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        Some(FileKind::Image)
    } else if extension == METADATA_EXTENSION {
        Some(FileKind::Metadata)
    } else {
        None
    }
}

/// Hidden files and directories (dotfiles) are excluded from the walk
pub(crate) fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_images_case_insensitively() {
        assert_eq!(classify(Path::new("a/photo.jpg")), Some(FileKind::Image));
        assert_eq!(classify(Path::new("a/photo.JPEG")), Some(FileKind::Image));
        assert_eq!(classify(Path::new("a/photo.Jpg")), Some(FileKind::Image));
    }

    #[test]
    fn classifies_metadata() {
        assert_eq!(classify(Path::new("a/record.xml")), Some(FileKind::Metadata));
        assert_eq!(classify(Path::new("a/record.XML")), Some(FileKind::Metadata));
    }

    #[test]
    fn classifies_manifest_by_full_name() {
        assert_eq!(
            classify(Path::new("a/manifest.ini")),
            Some(FileKind::Manifest)
        );
        assert_eq!(
            classify(Path::new("a/MANIFEST.ini")),
            Some(FileKind::Manifest)
        );
        assert_eq!(
            classify(Path::new("a/MANIFEST.INI")),
            Some(FileKind::Manifest)
        );
        // Other .ini files are not manifests
        assert_eq!(classify(Path::new("a/settings.ini")), None);
    }

    #[test]
    fn ignores_unrelated_files() {
        assert_eq!(classify(Path::new("a/notes.txt")), None);
        assert_eq!(classify(Path::new("a/photo.png")), None);
        assert_eq!(classify(Path::new("a/no_extension")), None);
    }

    #[test]
    fn detects_hidden_entries() {
        assert!(is_hidden(Path::new("/archive/.DS_Store")));
        assert!(is_hidden(Path::new("/archive/.thumbnails")));
        assert!(!is_hidden(Path::new("/archive/2006")));
    }
}
