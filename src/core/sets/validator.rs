//! Validates assembled photo sets.

use super::types::{DefectReason, PhotoSet, SetDefect};
use crate::core::metadata::extract_identifier;
use tracing::debug;

/// A set is valid when at least one of its metadata files yields an
/// identifier. Zero images is fine: pairing may still recover them.
pub fn is_valid(set: &PhotoSet) -> bool {
    !set.metadata.is_empty()
        && set
            .metadata
            .iter()
            .any(|path| extract_identifier(path).is_ok())
}

/// Split candidates into valid sets and identifier defects.
pub fn partition_valid(candidates: Vec<PhotoSet>) -> (Vec<PhotoSet>, Vec<SetDefect>) {
    let mut valid = Vec::with_capacity(candidates.len());
    let mut defects = Vec::new();

    for set in candidates {
        if is_valid(&set) {
            valid.push(set);
        } else {
            debug!(dir = %set.base_dir.display(), "rejecting set with no usable identifier");
            defects.push(SetDefect {
                directory: set.base_dir,
                reason: DefectReason::NoUsableIdentifier,
            });
        }
    }

    (valid, defects)
}
