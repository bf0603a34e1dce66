//! Global image index for cross-directory recovery.

use crate::core::scanner::TreeScanner;
use crate::error::ScanError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Stem-keyed map of every image under a root.
///
/// Built once per batch run and passed by reference into pairing; nothing
/// about it outlives the run. The underlying walk is sorted, so when two
/// images share a stem the first in sort order wins, every time.
pub struct RecoveryIndex {
    by_stem: HashMap<String, PathBuf>,
}

impl RecoveryIndex {
    /// Index every image under `root`.
    pub fn build(root: &Path) -> Result<Self, ScanError> {
        let inventory = TreeScanner::new().scan(root)?;
        Ok(Self::from_images(&inventory.images))
    }

    /// Index an already-collected image list (assumed sorted).
    pub fn from_images(images: &[PathBuf]) -> Self {
        let mut by_stem = HashMap::with_capacity(images.len());
        for image in images {
            if let Some(stem) = image.file_stem().and_then(|s| s.to_str()) {
                by_stem
                    .entry(stem.to_string())
                    .or_insert_with(|| image.clone());
            }
        }
        Self { by_stem }
    }

    /// Look up an image by file stem.
    pub fn lookup(&self, stem: &str) -> Option<&Path> {
        self.by_stem.get(stem).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.by_stem.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_stem.is_empty()
    }
}
