//! Pre-flight resource checks.
//!
//! Runs before any record is touched. Only two findings block a run:
//! a genuine disk-space shortfall and a failed write probe. Everything
//! else, including the platform refusing to report capacity at all,
//! degrades to a warning so field machines with odd mounts can still
//! ingest.

use crate::error::PreFlightError;
use std::fs;
use std::path::{Path, PathBuf};
use sysinfo::Disks;
use tracing::{debug, warn};

/// Conservative disk footprint per record: source copy, TIFF, container.
pub const PER_RECORD_FOOTPRINT_BYTES: u64 = 10 * 1024 * 1024;

/// What pre-flight found. Warnings are advisory; a blocker has already
/// been returned as the error by the time a report exists.
#[derive(Debug, Clone)]
pub struct PreFlightReport {
    pub record_count: usize,
    pub required_bytes: u64,
    pub available_bytes: Option<u64>,
    pub leftover_artifacts: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpaceVerdict {
    Shortfall,
    ThinMargin,
    Comfortable,
}

/// Shortfall below the requirement, thin below a 1.5x margin.
fn space_verdict(available_bytes: u64, required_bytes: u64) -> SpaceVerdict {
    if available_bytes < required_bytes {
        SpaceVerdict::Shortfall
    } else if available_bytes < required_bytes + required_bytes / 2 {
        SpaceVerdict::ThinMargin
    } else {
        SpaceVerdict::Comfortable
    }
}

/// Available space on the volume holding `target`, matched by the longest
/// mount point that prefixes its nearest existing ancestor.
fn available_space(target: &Path) -> Option<u64> {
    let anchor = existing_ancestor(target)?;
    let anchor = anchor.canonicalize().ok()?;

    let disks = Disks::new_with_refreshed_list();
    disks
        .list()
        .iter()
        .filter(|disk| anchor.starts_with(disk.mount_point()))
        .max_by_key(|disk| disk.mount_point().as_os_str().len())
        .map(|disk| disk.available_space())
}

fn existing_ancestor(path: &Path) -> Option<PathBuf> {
    let mut current = path;
    loop {
        if current.exists() {
            return Some(current.to_path_buf());
        }
        current = current.parent()?;
    }
}

/// Stray artifacts from an interrupted run. Reported, never deleted.
fn find_leftovers(work_dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(work_dir) else {
        return Vec::new();
    };

    let mut leftovers: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            matches!(
                path.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.to_lowercase())
                    .as_deref(),
                Some("tiff" | "tif" | "xml")
            )
        })
        .collect();
    leftovers.sort();
    leftovers
}

/// Write probe: create and remove a temp file in the work directory.
fn probe_write(work_dir: &Path) -> Result<(), PreFlightError> {
    match tempfile::NamedTempFile::new_in(work_dir) {
        Ok(probe) => {
            drop(probe);
            Ok(())
        }
        Err(e) => Err(PreFlightError::NoWritePermission {
            path: work_dir.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}

/// Runs the checks for a batch of `record_count` records targeting
/// `work_dir`.
///
/// With `mutating` false (preview) only the space estimate runs, and even
/// a shortfall is a warning since nothing will be written.
pub fn run_preflight(
    work_dir: &Path,
    record_count: usize,
    mutating: bool,
) -> Result<PreFlightReport, PreFlightError> {
    let required_bytes = record_count as u64 * PER_RECORD_FOOTPRINT_BYTES;
    let mut warnings = Vec::new();

    let available_bytes = available_space(work_dir);
    match available_bytes {
        Some(available) => match space_verdict(available, required_bytes) {
            SpaceVerdict::Shortfall if mutating => {
                return Err(PreFlightError::InsufficientDiskSpace {
                    available_bytes: available,
                    required_bytes,
                });
            }
            SpaceVerdict::Shortfall => {
                warnings.push(format!(
                    "disk space would not cover a real run: {} MB available, {} MB required",
                    available / (1024 * 1024),
                    required_bytes / (1024 * 1024)
                ));
            }
            SpaceVerdict::ThinMargin => {
                warnings.push(format!(
                    "disk space margin is thin: {} MB available for {} MB required",
                    available / (1024 * 1024),
                    required_bytes / (1024 * 1024)
                ));
            }
            SpaceVerdict::Comfortable => {}
        },
        None => {
            warnings.push(format!(
                "platform did not report disk capacity for {}, skipping the space check",
                work_dir.display()
            ));
        }
    }

    let leftover_artifacts = if mutating { find_leftovers(work_dir) } else { Vec::new() };
    if !leftover_artifacts.is_empty() {
        warnings.push(format!(
            "{} leftover artifact(s) from a previous run in {}; review before trusting counts",
            leftover_artifacts.len(),
            work_dir.display()
        ));
    }

    if mutating {
        probe_write(work_dir)?;
    }

    for warning in &warnings {
        warn!("pre-flight: {warning}");
    }
    debug!(
        records = record_count,
        required_bytes,
        available_bytes = ?available_bytes,
        "pre-flight checks passed"
    );

    Ok(PreFlightReport {
        record_count,
        required_bytes,
        available_bytes,
        leftover_artifacts,
        warnings,
    })
}
