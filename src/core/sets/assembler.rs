//! Builds photo sets from a scan inventory.
//!
//! Two grouping strategies run over the same inventory:
//!
//! 1. **Hierarchical**: each manifest claims every image and metadata file
//!    in or below its directory, partitioned by immediate child directory.
//!    Manifests are anchored deepest-first, so a subdirectory with its own
//!    manifest beats an ancestor's sweep.
//! 2. **Direct**: remaining files group by parent directory and need
//!    exactly one manifest in that same directory.
//!
//! Results are unioned with de-duplication by base directory; a base
//! directory yields at most one set. Groups that have metadata but no
//! usable manifest come back as defects, not sets.

use super::types::{DefectReason, PhotoSet, SetDefect, SetStructure};
use crate::core::scanner::ScanInventory;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Files grouped under one prospective base directory
#[derive(Default)]
struct Group {
    images: Vec<PathBuf>,
    metadata: Vec<PathBuf>,
}

pub fn assemble(inventory: &ScanInventory) -> (Vec<PhotoSet>, Vec<SetDefect>) {
    let mut sets: Vec<PhotoSet> = Vec::new();
    let mut defects: Vec<SetDefect> = Vec::new();
    let mut claimed: BTreeSet<PathBuf> = BTreeSet::new();

    let manifests_by_dir = group_manifests(inventory);

    // A directory with several manifests is ambiguous: it anchors nothing
    // and is reported once
    for (dir, manifests) in &manifests_by_dir {
        if manifests.len() > 1 {
            defects.push(SetDefect {
                directory: dir.clone(),
                reason: DefectReason::MultipleManifests(manifests.len()),
            });
        }
    }

    hierarchical_pass(inventory, &manifests_by_dir, &mut sets, &mut claimed);
    direct_pass(
        inventory,
        &manifests_by_dir,
        &mut sets,
        &mut defects,
        &mut claimed,
    );

    sets.sort_by(|a, b| a.base_dir.cmp(&b.base_dir));
    defects.sort_by(|a, b| a.directory.cmp(&b.directory));
    (sets, defects)
}

fn group_manifests(inventory: &ScanInventory) -> BTreeMap<PathBuf, Vec<PathBuf>> {
    let mut by_dir: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
    for manifest in &inventory.manifests {
        if let Some(parent) = manifest.parent() {
            by_dir
                .entry(parent.to_path_buf())
                .or_default()
                .push(manifest.clone());
        }
    }
    by_dir
}

/// Manifest-anchored grouping, deepest manifests first.
fn hierarchical_pass(
    inventory: &ScanInventory,
    manifests_by_dir: &BTreeMap<PathBuf, Vec<PathBuf>>,
    sets: &mut Vec<PhotoSet>,
    claimed: &mut BTreeSet<PathBuf>,
) {
    let mut anchors: Vec<(&PathBuf, &PathBuf)> = manifests_by_dir
        .iter()
        .filter(|(_, manifests)| manifests.len() == 1)
        .map(|(dir, manifests)| (dir, &manifests[0]))
        .collect();
    anchors.sort_by_key(|(dir, _)| std::cmp::Reverse(dir.components().count()));

    for (manifest_dir, manifest) in anchors {
        let mut partitions: BTreeMap<PathBuf, Group> = BTreeMap::new();
        for image in filter_under(&inventory.images, manifest_dir) {
            partitions
                .entry(partition_key(manifest_dir, image))
                .or_default()
                .images
                .push(image.clone());
        }
        for meta in filter_under(&inventory.metadata, manifest_dir) {
            partitions
                .entry(partition_key(manifest_dir, meta))
                .or_default()
                .metadata
                .push(meta.clone());
        }

        if partitions.values().all(|g| g.metadata.is_empty()) {
            debug!(
                manifest = %manifest.display(),
                "manifest governs no metadata, anchoring nothing"
            );
            continue;
        }

        // Everything directly beside the manifest means a plain standard set
        let structure = if partitions.len() == 1 && partitions.contains_key(manifest_dir) {
            SetStructure::Standard
        } else {
            SetStructure::Hierarchical
        };

        for (base_dir, group) in partitions {
            if group.metadata.is_empty() || claimed.contains(&base_dir) {
                continue;
            }
            claimed.insert(base_dir.clone());
            sets.push(PhotoSet::new(
                base_dir,
                group.images,
                group.metadata,
                manifest.clone(),
                structure,
            ));
        }
    }
}

/// Per-directory grouping for files no manifest sweep has claimed.
fn direct_pass(
    inventory: &ScanInventory,
    manifests_by_dir: &BTreeMap<PathBuf, Vec<PathBuf>>,
    sets: &mut Vec<PhotoSet>,
    defects: &mut Vec<SetDefect>,
    claimed: &mut BTreeSet<PathBuf>,
) {
    let mut groups: BTreeMap<PathBuf, Group> = BTreeMap::new();
    for image in &inventory.images {
        if let Some(parent) = image.parent() {
            groups
                .entry(parent.to_path_buf())
                .or_default()
                .images
                .push(image.clone());
        }
    }
    for meta in &inventory.metadata {
        if let Some(parent) = meta.parent() {
            groups
                .entry(parent.to_path_buf())
                .or_default()
                .metadata
                .push(meta.clone());
        }
    }

    for (dir, group) in groups {
        // Images without metadata can never form a record; leave them for
        // the recovery index
        if group.metadata.is_empty() || claimed.contains(&dir) {
            continue;
        }
        match manifests_by_dir.get(&dir).map(Vec::as_slice) {
            Some([manifest]) => {
                claimed.insert(dir.clone());
                sets.push(PhotoSet::new(
                    dir,
                    group.images,
                    group.metadata,
                    manifest.clone(),
                    SetStructure::Standard,
                ));
            }
            // Ambiguous directory: defect already recorded up front
            Some(_) => {}
            None => defects.push(SetDefect {
                directory: dir,
                reason: DefectReason::MissingManifest,
            }),
        }
    }
}

fn filter_under<'a>(paths: &'a [PathBuf], dir: &Path) -> impl Iterator<Item = &'a PathBuf> {
    let dir = dir.to_path_buf();
    paths.iter().filter(move |p| p.starts_with(&dir))
}

/// The partition a file belongs to: the manifest directory itself, or the
/// immediate child directory on the way down to the file.
fn partition_key(manifest_dir: &Path, file: &Path) -> PathBuf {
    match file.parent() {
        Some(parent) if parent == manifest_dir => manifest_dir.to_path_buf(),
        _ => file
            .strip_prefix(manifest_dir)
            .ok()
            .and_then(|rel| rel.components().next())
            .map(|first| manifest_dir.join(first.as_os_str()))
            .unwrap_or_else(|| manifest_dir.to_path_buf()),
    }
}
