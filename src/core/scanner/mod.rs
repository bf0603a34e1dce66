//! # Scanner Module
//!
//! Walks a photo archive to a bounded depth and classifies what it finds.
//!
//! ## Classifications
//! - Image (.jpg, .jpeg)
//! - Metadata (.xml)
//! - Manifest (a file named `manifest.ini`, case-insensitive)
//!
//! Everything else is ignored. Symlinks are never followed, and an
//! unreadable directory is skipped with a warning rather than aborting
//! the scan.
//!
//! ## Example
//! ```rust,ignore
//! use photo_batch_ingest::core::scanner::TreeScanner;
//!
//! let inventory = TreeScanner::new().scan(Path::new("/archive/2006"))?;
//! println!("{} images, {} metadata files", inventory.images.len(), inventory.metadata.len());
//! ```

mod classify;
mod walker;

pub use classify::{classify, MANIFEST_FILE_NAME};
pub use walker::{TreeScanner, MAX_SCAN_DEPTH};

use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Classification of a file found during the walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileKind {
    Image,
    Metadata,
    Manifest,
}

/// A file together with its classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedFile {
    pub path: PathBuf,
    pub kind: FileKind,
}

/// Everything a scan found, keyed by classification.
///
/// The three collections are sorted, so the same tree always produces the
/// same inventory.
#[derive(Debug, Default)]
pub struct ScanInventory {
    pub images: Vec<PathBuf>,
    pub metadata: Vec<PathBuf>,
    pub manifests: Vec<PathBuf>,
    /// Non-fatal problems encountered during the walk
    pub errors: Vec<ScanError>,
}

impl ScanInventory {
    pub(crate) fn push(&mut self, file: ClassifiedFile) {
        match file.kind {
            FileKind::Image => self.images.push(file.path),
            FileKind::Metadata => self.metadata.push(file.path),
            FileKind::Manifest => self.manifests.push(file.path),
        }
    }

    pub(crate) fn sort(&mut self) {
        self.images.sort();
        self.metadata.sort();
        self.manifests.sort();
    }

    /// Total number of classified files
    pub fn total_files(&self) -> usize {
        self.images.len() + self.metadata.len() + self.manifests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_files() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inventory_routes_files_by_kind() {
        let mut inventory = ScanInventory::default();
        inventory.push(ClassifiedFile {
            path: PathBuf::from("/a/photo.jpg"),
            kind: FileKind::Image,
        });
        inventory.push(ClassifiedFile {
            path: PathBuf::from("/a/photo.xml"),
            kind: FileKind::Metadata,
        });
        inventory.push(ClassifiedFile {
            path: PathBuf::from("/a/MANIFEST.ini"),
            kind: FileKind::Manifest,
        });

        assert_eq!(inventory.images.len(), 1);
        assert_eq!(inventory.metadata.len(), 1);
        assert_eq!(inventory.manifests.len(), 1);
        assert_eq!(inventory.total_files(), 3);
    }

    #[test]
    fn inventory_sorts_each_collection() {
        let mut inventory = ScanInventory::default();
        for name in ["b.jpg", "a.jpg", "c.jpg"] {
            inventory.push(ClassifiedFile {
                path: PathBuf::from(name),
                kind: FileKind::Image,
            });
        }
        inventory.sort();

        assert_eq!(
            inventory.images,
            vec![
                PathBuf::from("a.jpg"),
                PathBuf::from("b.jpg"),
                PathBuf::from("c.jpg")
            ]
        );
    }
}
