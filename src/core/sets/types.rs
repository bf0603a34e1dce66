//! Types for photo set discovery.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ScanError;

/// How a set relates to its manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetStructure {
    /// Manifest sits in the set's own directory
    Standard,
    /// Manifest governs the set from an ancestor directory
    Hierarchical,
}

/// A group of files that are ingested together.
///
/// Immutable once assembled. A set always has at least one metadata file
/// and exactly one manifest; it may have zero images, in which case
/// pairing may still recover images from elsewhere in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoSet {
    /// Directory the set's files live in
    pub base_dir: PathBuf,
    /// Image files, sorted (may be empty)
    pub images: Vec<PathBuf>,
    /// Metadata files, sorted (never empty)
    pub metadata: Vec<PathBuf>,
    /// The single governing manifest
    pub manifest: PathBuf,
    pub structure: SetStructure,
}

impl PhotoSet {
    pub(crate) fn new(
        base_dir: PathBuf,
        mut images: Vec<PathBuf>,
        mut metadata: Vec<PathBuf>,
        manifest: PathBuf,
        structure: SetStructure,
    ) -> Self {
        images.sort();
        metadata.sort();
        Self {
            base_dir,
            images,
            metadata,
            manifest,
            structure,
        }
    }

    /// One record per metadata file
    pub fn record_count(&self) -> usize {
        self.metadata.len()
    }
}

/// Why a candidate group failed to become a PhotoSet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefectReason {
    /// No manifest in the directory or any governing ancestor
    MissingManifest,
    /// The directory holds more than one manifest
    MultipleManifests(usize),
    /// No metadata file in the group yields an identifier
    NoUsableIdentifier,
}

/// A structural failure found during discovery.
///
/// Defects don't stop a run; each one becomes a single audit row and an
/// error count increment while the remaining sets proceed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetDefect {
    pub directory: PathBuf,
    pub reason: DefectReason,
}

impl std::fmt::Display for SetDefect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.reason {
            DefectReason::MissingManifest => {
                write!(f, "No manifest found for {}", self.directory.display())
            }
            DefectReason::MultipleManifests(count) => {
                write!(
                    f,
                    "{} manifests found in {}, expected exactly one",
                    count,
                    self.directory.display()
                )
            }
            DefectReason::NoUsableIdentifier => {
                write!(
                    f,
                    "No metadata file in {} yields an identifier",
                    self.directory.display()
                )
            }
        }
    }
}

/// Everything discovery produced for one root
#[derive(Debug, Default)]
pub struct Discovery {
    /// Valid sets, sorted by base directory
    pub sets: Vec<PhotoSet>,
    /// Structural failures, one audit row each
    pub defects: Vec<SetDefect>,
    /// Non-fatal scan problems (skipped directories)
    pub scan_errors: Vec<ScanError>,
}

impl Discovery {
    /// Total records across all valid sets
    pub fn record_count(&self) -> usize {
        self.sets.iter().map(PhotoSet::record_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty() && self.defects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn photo_set_sorts_members() {
        let set = PhotoSet::new(
            PathBuf::from("/a"),
            vec![PathBuf::from("/a/b.jpg"), PathBuf::from("/a/a.jpg")],
            vec![PathBuf::from("/a/b.xml"), PathBuf::from("/a/a.xml")],
            PathBuf::from("/a/MANIFEST.ini"),
            SetStructure::Standard,
        );

        assert_eq!(set.images[0], PathBuf::from("/a/a.jpg"));
        assert_eq!(set.metadata[0], PathBuf::from("/a/a.xml"));
        assert_eq!(set.record_count(), 2);
    }

    #[test]
    fn defect_display_names_the_directory() {
        let defect = SetDefect {
            directory: PathBuf::from("/archive/2006/46N-3W"),
            reason: DefectReason::MissingManifest,
        };
        assert!(defect.to_string().contains("/archive/2006/46N-3W"));

        let ambiguous = SetDefect {
            directory: PathBuf::from("/archive/2007"),
            reason: DefectReason::MultipleManifests(2),
        };
        assert!(ambiguous.to_string().contains("2 manifests"));
    }

    #[test]
    fn discovery_counts_records_across_sets() {
        let set = |dir: &str, n: usize| {
            PhotoSet::new(
                PathBuf::from(dir),
                Vec::new(),
                (0..n).map(|i| PathBuf::from(format!("{dir}/r{i}.xml"))).collect(),
                PathBuf::from(format!("{dir}/manifest.ini")),
                SetStructure::Standard,
            )
        };
        let discovery = Discovery {
            sets: vec![set("/a", 2), set("/b", 3)],
            defects: Vec::new(),
            scan_errors: Vec::new(),
        };

        assert_eq!(discovery.record_count(), 5);
    }
}
