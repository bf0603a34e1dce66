//! # Sets Module
//!
//! Turns a scanned tree into validated photo sets.
//!
//! ## Pipeline
//! 1. **Scan** - classify files under the root ([`crate::core::scanner`])
//! 2. **Assemble** - group into candidate sets, direct and
//!    manifest-anchored hierarchical, deduplicated by base directory
//! 3. **Validate** - keep sets with at least one extractable identifier
//!
//! Structural failures come back as [`SetDefect`]s next to the valid sets,
//! so a batch run can audit them without re-deriving anything.

mod assembler;
mod manifest;
mod types;
mod validator;

pub use assembler::assemble;
pub use manifest::locate_manifest;
pub use types::{DefectReason, Discovery, PhotoSet, SetDefect, SetStructure};
pub use validator::{is_valid, partition_valid};

use crate::core::scanner::TreeScanner;
use crate::error::ScanError;
use crate::events::{Event, EventSender, ScanEvent};
use std::path::Path;
use tracing::info;

/// Discover every photo set under `root`.
pub fn discover(root: &Path) -> Result<Discovery, ScanError> {
    discover_with_events(root, &crate::events::null_sender())
}

/// Like [`discover`], but returns only the valid sets.
pub fn scan(root: &Path) -> Result<Vec<PhotoSet>, ScanError> {
    Ok(discover(root)?.sets)
}

/// Discover with progress reporting via events.
pub fn discover_with_events(root: &Path, events: &EventSender) -> Result<Discovery, ScanError> {
    let inventory = TreeScanner::new().scan_with_events(root, events)?;
    let (candidates, mut defects) = assemble(&inventory);
    let (sets, identifier_defects) = partition_valid(candidates);
    defects.extend(identifier_defects);
    defects.sort_by(|a, b| a.directory.cmp(&b.directory));

    info!(
        sets = sets.len(),
        defects = defects.len(),
        "discovery of {} complete",
        root.display()
    );
    events.send(Event::Scan(ScanEvent::Completed {
        sets: sets.len(),
        defects: defects.len(),
    }));

    Ok(Discovery {
        sets,
        defects,
        scan_errors: inventory.errors,
    })
}
