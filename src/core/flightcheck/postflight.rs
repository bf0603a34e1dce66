//! Post-flight reconciliation.
//!
//! After the last record, the run proves its own bookkeeping: every
//! container is re-opened and its membership verified, four independent
//! counts are reconciled pairwise, and identifier-renamed files that
//! never made it into a container are flagged as orphans.

use crate::core::package::verify_container;
use crate::core::pipeline::count_success_rows;
use crate::error::ReportError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// The four counts plus everything that failed to line up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub input_metadata_count: usize,
    pub audit_success_count: usize,
    pub container_count: usize,
    pub valid_container_count: usize,
    pub invalid_containers: Vec<(PathBuf, String)>,
    pub orphaned_intermediates: Vec<PathBuf>,
    pub discrepancies: Vec<String>,
}

impl ReconciliationReport {
    pub fn is_clean(&self) -> bool {
        self.discrepancies.is_empty()
            && self.invalid_containers.is_empty()
            && self.orphaned_intermediates.is_empty()
    }
}

fn files_with_extensions(dir: &Path, extensions: &[&str]) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_lowercase())
                .is_some_and(|e| extensions.contains(&e.as_str()))
        })
        .collect();
    files.sort();
    files
}

/// The rename pair and the container run independent collision suffixes,
/// so `EXC_001_a.tiff` belongs to the same record family as `EXC_001.zip`.
/// Stripping one trailing `_a`..`_z` from both sides makes them comparable.
fn strip_collision_suffix(stem: &str) -> &str {
    let bytes = stem.as_bytes();
    if bytes.len() >= 2
        && bytes[bytes.len() - 2] == b'_'
        && bytes[bytes.len() - 1].is_ascii_lowercase()
    {
        &stem[..stem.len() - 2]
    } else {
        stem
    }
}

fn family_of(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| strip_collision_suffix(s).to_string())
}

/// Reconciles a finished run.
///
/// `source_dirs` are additionally swept for orphans, but only files whose
/// family matches an identifier renamed this run (`run_bases`) count
/// there; a committed run leaves its renamed files among untouched source
/// files that must not be flagged.
pub fn reconcile(
    work_dir: &Path,
    report_path: &Path,
    input_metadata_count: usize,
    source_dirs: &[PathBuf],
    run_bases: &HashSet<String>,
) -> Result<ReconciliationReport, ReportError> {
    let audit_success_count = count_success_rows(report_path)?;

    let containers = files_with_extensions(work_dir, &["zip"]);
    let container_count = containers.len();

    let mut invalid_containers = Vec::new();
    for container in &containers {
        if let Err(reason) = verify_container(container) {
            warn!(container = %container.display(), reason, "container failed verification");
            invalid_containers.push((container.clone(), reason));
        }
    }
    let valid_container_count = container_count - invalid_containers.len();

    let container_families: HashSet<String> =
        containers.iter().filter_map(|c| family_of(c)).collect();

    let mut orphaned_intermediates = Vec::new();
    for intermediate in files_with_extensions(work_dir, &["tiff", "tif", "xml"]) {
        let Some(family) = family_of(&intermediate) else {
            continue;
        };
        if !container_families.contains(&family) {
            orphaned_intermediates.push(intermediate);
        }
    }
    for dir in source_dirs {
        for intermediate in files_with_extensions(dir, &["tiff", "tif", "xml"]) {
            let Some(family) = family_of(&intermediate) else {
                continue;
            };
            if run_bases.contains(&family) && !container_families.contains(&family) {
                orphaned_intermediates.push(intermediate);
            }
        }
    }
    orphaned_intermediates.sort();

    let mut discrepancies = Vec::new();
    if input_metadata_count != audit_success_count {
        discrepancies.push(format!(
            "{input_metadata_count} input metadata file(s) across processed sets but \
             {audit_success_count} SUCCESS audit row(s)"
        ));
    }
    if audit_success_count != container_count {
        discrepancies.push(format!(
            "{audit_success_count} SUCCESS audit row(s) but {container_count} container(s) on disk"
        ));
    }
    if container_count != valid_container_count {
        discrepancies.push(format!(
            "{container_count} container(s) on disk but only {valid_container_count} verified valid"
        ));
    }

    let report = ReconciliationReport {
        input_metadata_count,
        audit_success_count,
        container_count,
        valid_container_count,
        invalid_containers,
        orphaned_intermediates,
        discrepancies,
    };

    if report.is_clean() {
        info!(
            containers = report.container_count,
            "post-flight reconciliation clean"
        );
    } else {
        for discrepancy in &report.discrepancies {
            warn!("post-flight: {discrepancy}");
        }
        for orphan in &report.orphaned_intermediates {
            warn!(orphan = %orphan.display(), "intermediate file has no container");
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::package::{ArchiveWriter, ZipPackager};
    use crate::core::pipeline::{actions, AuditRecord, AuditStatus, AuditWriter};
    use tempfile::TempDir;

    fn write_audit(path: &Path, successes: usize) {
        let mut audit = AuditWriter::create(path).unwrap();
        for n in 0..successes {
            audit
                .append(&AuditRecord {
                    identifier: format!("EXC_{n}"),
                    metadata_path: format!("/photos/EXC_{n}.xml"),
                    image_path: format!("/photos/EXC_{n}.jpg"),
                    status: AuditStatus::Success,
                    action: actions::PROCESSED.to_string(),
                    note: "Packaged".to_string(),
                })
                .unwrap();
        }
        audit.summary(successes, 0, "Staged mode").unwrap();
    }

    /// Lays out one finished record the way a staged run leaves it:
    /// renamed pair plus a valid container in the work directory.
    fn finished_record(work_dir: &Path, base: &str) {
        let tiff = work_dir.join(format!("{base}.tiff"));
        let xml = work_dir.join(format!("{base}.xml"));
        let manifest = work_dir.join("source_manifest").join("manifest.ini");
        fs::create_dir_all(manifest.parent().unwrap()).unwrap();
        fs::write(&tiff, "tiff bytes").unwrap();
        fs::write(&xml, "<mods/>").unwrap();
        fs::write(&manifest, "[package]").unwrap();

        ZipPackager::new()
            .package(
                &work_dir.join(format!("{base}.zip")),
                &[tiff, xml, manifest],
            )
            .unwrap();
    }

    #[test]
    fn clean_run_reconciles_exactly() {
        let temp = TempDir::new().unwrap();
        let report_path = temp.path().join("audit.csv");
        finished_record(temp.path(), "EXC_0");
        write_audit(&report_path, 1);

        let report = reconcile(
            temp.path(),
            &report_path,
            1,
            &[],
            &HashSet::from(["EXC_0".to_string()]),
        )
        .unwrap();

        assert_eq!(report.input_metadata_count, 1);
        assert_eq!(report.audit_success_count, 1);
        assert_eq!(report.container_count, 1);
        assert_eq!(report.valid_container_count, 1);
        assert!(report.is_clean(), "{:?}", report);
    }

    #[test]
    fn intermediate_without_container_is_an_orphan() {
        let temp = TempDir::new().unwrap();
        let report_path = temp.path().join("audit.csv");
        let stranded = temp.path().join("EXC_1.tiff");
        fs::write(&stranded, "tiff bytes").unwrap();
        write_audit(&report_path, 0);

        let report = reconcile(temp.path(), &report_path, 0, &[], &HashSet::new()).unwrap();

        assert_eq!(report.orphaned_intermediates, vec![stranded]);
        assert!(report.discrepancies.is_empty());
        assert!(!report.is_clean());
    }

    #[test]
    fn collision_suffixes_join_the_same_record_family() {
        let temp = TempDir::new().unwrap();
        let report_path = temp.path().join("audit.csv");
        finished_record(temp.path(), "EXC_2");
        // A later collision shifted the pair to _a; same family, no orphan.
        fs::write(temp.path().join("EXC_2_a.tiff"), "tiff bytes").unwrap();
        fs::write(temp.path().join("EXC_2_a.xml"), "<mods/>").unwrap();
        write_audit(&report_path, 1);

        let report = reconcile(temp.path(), &report_path, 1, &[], &HashSet::new()).unwrap();

        assert!(report.orphaned_intermediates.is_empty());
    }

    #[test]
    fn count_mismatches_are_named() {
        let temp = TempDir::new().unwrap();
        let report_path = temp.path().join("audit.csv");
        finished_record(temp.path(), "EXC_3");
        write_audit(&report_path, 1);

        let report = reconcile(temp.path(), &report_path, 2, &[], &HashSet::new()).unwrap();

        assert_eq!(report.discrepancies.len(), 1);
        assert!(report.discrepancies[0].contains("2 input metadata file(s)"));
        assert!(report.discrepancies[0].contains("1 SUCCESS audit row(s)"));
    }

    #[test]
    fn unreadable_container_counts_but_fails_verification() {
        let temp = TempDir::new().unwrap();
        let report_path = temp.path().join("audit.csv");
        fs::write(temp.path().join("EXC_4.zip"), "not really a zip").unwrap();
        write_audit(&report_path, 1);

        let report = reconcile(temp.path(), &report_path, 1, &[], &HashSet::new()).unwrap();

        assert_eq!(report.container_count, 1);
        assert_eq!(report.valid_container_count, 0);
        assert_eq!(report.invalid_containers.len(), 1);
        assert!(report
            .discrepancies
            .iter()
            .any(|d| d.contains("only 0 verified valid")));
    }

    #[test]
    fn source_directory_sweep_only_flags_this_runs_identifiers() {
        let temp = TempDir::new().unwrap();
        let work_dir = temp.path().join("out");
        let source_dir = temp.path().join("2006");
        fs::create_dir_all(&work_dir).unwrap();
        fs::create_dir_all(&source_dir).unwrap();
        let report_path = temp.path().join("audit.csv");
        write_audit(&report_path, 0);

        // Renamed this run but never packaged; must be flagged.
        let renamed = source_dir.join("EXC_5.tiff");
        fs::write(&renamed, "tiff bytes").unwrap();
        // Untouched source metadata; must not be flagged.
        fs::write(source_dir.join("photo_009.xml"), "<mods/>").unwrap();

        let report = reconcile(
            &work_dir,
            &report_path,
            0,
            &[source_dir],
            &HashSet::from(["EXC_5".to_string()]),
        )
        .unwrap();

        assert_eq!(report.orphaned_intermediates, vec![renamed]);
    }
}
