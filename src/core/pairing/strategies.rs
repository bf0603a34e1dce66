//! The pairing cascade.
//!
//! Each strategy is a pure function over the set, one metadata file, its
//! identifier, and the run's recovery index. They run in a fixed order and
//! the first hit wins; later strategies never see records an earlier one
//! resolved.

use super::{PairStrategy, RecoveryIndex};
use crate::core::sets::PhotoSet;
use std::path::{Path, PathBuf};

pub(super) type StrategyFn =
    fn(&PhotoSet, &Path, &str, &RecoveryIndex) -> Option<(PathBuf, PairStrategy)>;

/// Strategies in cascade order
pub(super) const CASCADE: &[StrategyFn] = &[
    exact_stem,
    identifier_substring,
    lone_survivor,
    cross_directory,
];

/// 1. Image stem equals metadata stem.
fn exact_stem(
    set: &PhotoSet,
    metadata: &Path,
    _identifier: &str,
    _index: &RecoveryIndex,
) -> Option<(PathBuf, PairStrategy)> {
    let stem = metadata.file_stem()?.to_str()?;
    set.images
        .iter()
        .find(|image| image.file_stem().and_then(|s| s.to_str()) == Some(stem))
        .map(|image| (image.clone(), PairStrategy::ExactStem))
}

/// 2. Image stem contains the identifier, case-insensitively. Weaker than
/// an exact stem match; callers log it as such.
fn identifier_substring(
    set: &PhotoSet,
    _metadata: &Path,
    identifier: &str,
    _index: &RecoveryIndex,
) -> Option<(PathBuf, PairStrategy)> {
    let needle = identifier.to_lowercase();
    set.images
        .iter()
        .find(|image| {
            image
                .file_stem()
                .and_then(|s| s.to_str())
                .map(|s| s.to_lowercase().contains(&needle))
                .unwrap_or(false)
        })
        .map(|image| (image.clone(), PairStrategy::IdentifierSubstring))
}

/// 3. Exactly one image and one metadata file in the set: pair them.
fn lone_survivor(
    set: &PhotoSet,
    _metadata: &Path,
    _identifier: &str,
    _index: &RecoveryIndex,
) -> Option<(PathBuf, PairStrategy)> {
    if set.images.len() == 1 && set.metadata.len() == 1 {
        Some((set.images[0].clone(), PairStrategy::LoneSurvivor))
    } else {
        None
    }
}

/// 4. Recover a same-stem image from anywhere under the root.
fn cross_directory(
    _set: &PhotoSet,
    metadata: &Path,
    _identifier: &str,
    index: &RecoveryIndex,
) -> Option<(PathBuf, PairStrategy)> {
    let stem = metadata.file_stem()?.to_str()?;
    let image = index.lookup(stem)?;
    let donor = image.parent()?.to_path_buf();
    Some((
        image.to_path_buf(),
        PairStrategy::CrossDirectory { donor },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sets::SetStructure;

    fn set(images: &[&str], metadata: &[&str]) -> PhotoSet {
        PhotoSet::new(
            PathBuf::from("/r/2006/46N-3W"),
            images.iter().map(PathBuf::from).collect(),
            metadata.iter().map(PathBuf::from).collect(),
            PathBuf::from("/r/2006/46N-3W/MANIFEST.ini"),
            SetStructure::Standard,
        )
    }

    fn empty_index() -> RecoveryIndex {
        RecoveryIndex::from_images(&[])
    }

    #[test]
    fn exact_stem_matches_same_stem_only() {
        let set = set(
            &["/r/2006/46N-3W/photo_001.jpg", "/r/2006/46N-3W/other.jpg"],
            &["/r/2006/46N-3W/photo_001.xml"],
        );

        let hit = exact_stem(
            &set,
            Path::new("/r/2006/46N-3W/photo_001.xml"),
            "EXC_001",
            &empty_index(),
        )
        .unwrap();

        assert_eq!(hit.0, PathBuf::from("/r/2006/46N-3W/photo_001.jpg"));
        assert_eq!(hit.1, PairStrategy::ExactStem);
    }

    #[test]
    fn substring_match_is_case_insensitive() {
        let set = set(
            &["/r/2006/46N-3W/scan_exc_001_final.jpg"],
            &["/r/2006/46N-3W/record.xml"],
        );

        let hit = identifier_substring(
            &set,
            Path::new("/r/2006/46N-3W/record.xml"),
            "EXC_001",
            &empty_index(),
        )
        .unwrap();

        assert_eq!(hit.1, PairStrategy::IdentifierSubstring);
    }

    #[test]
    fn lone_survivor_needs_exactly_one_of_each() {
        let single = set(&["/r/a/x.jpg"], &["/r/a/y.xml"]);
        assert!(lone_survivor(&single, Path::new("/r/a/y.xml"), "ID", &empty_index()).is_some());

        let two_images = set(&["/r/a/x.jpg", "/r/a/z.jpg"], &["/r/a/y.xml"]);
        assert!(
            lone_survivor(&two_images, Path::new("/r/a/y.xml"), "ID", &empty_index()).is_none()
        );
    }

    #[test]
    fn cross_directory_names_the_donor() {
        let set = set(&[], &["/r/2006/46N-3W/photo_001.xml"]);
        let index = RecoveryIndex::from_images(&[PathBuf::from("/r/2006/47N-2W/photo_001.jpg")]);

        let hit = cross_directory(
            &set,
            Path::new("/r/2006/46N-3W/photo_001.xml"),
            "EXC_001",
            &index,
        )
        .unwrap();

        assert_eq!(hit.0, PathBuf::from("/r/2006/47N-2W/photo_001.jpg"));
        assert_eq!(
            hit.1,
            PairStrategy::CrossDirectory {
                donor: PathBuf::from("/r/2006/47N-2W")
            }
        );
    }
}
