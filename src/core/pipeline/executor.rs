//! Batch execution implementation.

use super::audit::{actions, AuditRecord, AuditStatus, AuditWriter};
use super::naming;
use crate::core::convert::{ImageConverter, TiffConverter};
use crate::core::flightcheck::{self, ReconciliationReport};
use crate::core::package::{ArchiveWriter, ZipPackager};
use crate::core::pairing::{resolve_pairs, FilePair, PairStrategy, RecoveryIndex};
use crate::core::sets::{self, DefectReason, PhotoSet};
use crate::error::{IngestError, ProcessError, Result};
use crate::events::{null_sender, BatchEvent, BatchPhase, BatchSummary, Event, EventSender};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Staging subdirectory created under the requested output directory.
pub const STAGING_DIR_NAME: &str = "staging_output";

/// Execution mode for a batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchMode {
    /// Evaluate every record, mutate nothing
    Preview,
    /// Full processing with every artifact under `staging_output/`; the
    /// source tree is left untouched
    Staged,
    /// Renames happen in the source tree and containers land in the
    /// output directory. Destructive, and therefore not repeatable.
    Committed,
}

impl BatchMode {
    /// Resolves the flag pair. Preview wins over Staged; the second value
    /// reports whether that precedence fired so callers can surface it.
    pub fn from_flags(dry_run: bool, staging: bool) -> (Self, bool) {
        match (dry_run, staging) {
            (true, true) => (Self::Preview, true),
            (true, false) => (Self::Preview, false),
            (false, true) => (Self::Staged, false),
            (false, false) => (Self::Committed, false),
        }
    }

    pub fn mutates_filesystem(&self) -> bool {
        !matches!(self, Self::Preview)
    }
}

impl fmt::Display for BatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self {
            Self::Preview => "Preview",
            Self::Staged => "Staged",
            Self::Committed => "Committed",
        };
        write!(f, "{mode}")
    }
}

/// Per-run execution context. Built once by the builder, read-only after.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchContext {
    pub run_id: Uuid,
    pub root: PathBuf,
    pub output_dir: PathBuf,
    /// Where containers land: the output directory itself for Committed,
    /// its `staging_output/` subdirectory for Staged
    pub work_dir: PathBuf,
    pub mode: BatchMode,
    pub report_path: PathBuf,
}

/// Aggregate result of one batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub run_id: Uuid,
    pub mode: BatchMode,
    pub success_count: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub report_path: PathBuf,
    /// Post-flight reconciliation; `None` for Preview runs
    pub reconciliation: Option<ReconciliationReport>,
    pub duration_ms: u64,
}

/// Timestamped default under the system temp directory. Never under the
/// output directory, so Preview leaves it untouched.
fn default_report_path(root: &Path) -> PathBuf {
    let root_name = root
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("batch");
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    std::env::temp_dir().join(format!("batch_report_{root_name}_{stamp}.csv"))
}

/// Builder for a configured batch runner
pub struct BatchRunnerBuilder {
    root: PathBuf,
    output_dir: PathBuf,
    mode: BatchMode,
    report_path: Option<PathBuf>,
    converter: Option<Box<dyn ImageConverter>>,
    packager: Option<Box<dyn ArchiveWriter>>,
}

impl BatchRunnerBuilder {
    pub fn new(root: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            output_dir: output_dir.into(),
            mode: BatchMode::Preview,
            report_path: None,
            converter: None,
            packager: None,
        }
    }

    pub fn mode(mut self, mode: BatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn report_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_path = Some(path.into());
        self
    }

    pub fn converter(mut self, converter: Box<dyn ImageConverter>) -> Self {
        self.converter = Some(converter);
        self
    }

    pub fn packager(mut self, packager: Box<dyn ArchiveWriter>) -> Self {
        self.packager = Some(packager);
        self
    }

    pub fn build(self) -> BatchRunner {
        let work_dir = match self.mode {
            BatchMode::Staged => self.output_dir.join(STAGING_DIR_NAME),
            _ => self.output_dir.clone(),
        };
        let report_path = self
            .report_path
            .unwrap_or_else(|| default_report_path(&self.root));

        BatchRunner {
            context: BatchContext {
                run_id: Uuid::new_v4(),
                root: self.root,
                output_dir: self.output_dir,
                work_dir,
                mode: self.mode,
                report_path,
            },
            converter: self
                .converter
                .unwrap_or_else(|| Box::new(TiffConverter::new())),
            packager: self.packager.unwrap_or_else(|| Box::new(ZipPackager::new())),
        }
    }
}

/// One-call batch run with production collaborators.
pub fn run_batch(
    root: impl Into<PathBuf>,
    output_dir: impl Into<PathBuf>,
    mode: BatchMode,
) -> Result<BatchOutcome> {
    BatchRunner::builder(root, output_dir)
        .mode(mode)
        .build()
        .run()
}

/// A record-level failure paired with the audit action tag for its stage.
struct RecordFailure {
    action: &'static str,
    error: ProcessError,
}

impl RecordFailure {
    fn new(action: &'static str, error: ProcessError) -> Self {
        Self { action, error }
    }
}

fn display_or_empty(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string()).unwrap_or_default()
}

/// The batch ingest runner
pub struct BatchRunner {
    context: BatchContext,
    converter: Box<dyn ImageConverter>,
    packager: Box<dyn ArchiveWriter>,
}

impl BatchRunner {
    pub fn builder(
        root: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> BatchRunnerBuilder {
        BatchRunnerBuilder::new(root, output_dir)
    }

    pub fn context(&self) -> &BatchContext {
        &self.context
    }

    /// Run without event reporting
    pub fn run(&self) -> Result<BatchOutcome> {
        self.run_with_events(&null_sender())
    }

    /// Run with event reporting
    pub fn run_with_events(&self, events: &EventSender) -> Result<BatchOutcome> {
        match self.execute(events) {
            Ok(outcome) => Ok(outcome),
            Err(error) => {
                events.send(Event::Batch(BatchEvent::Failed {
                    message: error.to_string(),
                }));
                Err(error)
            }
        }
    }

    fn execute(&self, events: &EventSender) -> Result<BatchOutcome> {
        let start_time = Instant::now();
        let ctx = &self.context;

        info!(
            run_id = %ctx.run_id,
            mode = %ctx.mode,
            root = %ctx.root.display(),
            "batch run starting"
        );

        // Phase 1: Initialize
        events.send(Event::Batch(BatchEvent::PhaseChanged {
            phase: BatchPhase::Initialize,
        }));

        let discovery = sets::discover_with_events(&ctx.root, events)?;
        let index = RecoveryIndex::build(&ctx.root)?;
        let total_records = discovery.record_count();

        events.send(Event::Batch(BatchEvent::Started {
            mode: ctx.mode.to_string(),
            total_sets: discovery.sets.len(),
            total_records,
        }));

        // Phase 2: PreFlight
        events.send(Event::Batch(BatchEvent::PhaseChanged {
            phase: BatchPhase::PreFlight,
        }));

        if ctx.mode.mutates_filesystem() {
            fs::create_dir_all(&ctx.work_dir).map_err(|e| {
                IngestError::Config(format!(
                    "cannot create output directory {}: {e}",
                    ctx.work_dir.display()
                ))
            })?;
        }
        flightcheck::run_preflight(&ctx.work_dir, total_records, ctx.mode.mutates_filesystem())?;

        // Phase 3: Processing
        events.send(Event::Batch(BatchEvent::PhaseChanged {
            phase: BatchPhase::Processing,
        }));

        let mut audit = AuditWriter::create(&ctx.report_path)?;
        let mut success_count = 0usize;
        let mut error_count = 0usize;
        let mut warning_count = 0usize;
        let mut seen_identifiers: HashMap<String, PathBuf> = HashMap::new();
        let mut renamed_bases: HashSet<String> = HashSet::new();

        for defect in &discovery.defects {
            let status = match defect.reason {
                DefectReason::MissingManifest | DefectReason::MultipleManifests(_) => {
                    AuditStatus::ManifestError
                }
                DefectReason::NoUsableIdentifier => AuditStatus::Error,
            };
            audit.append(&AuditRecord {
                identifier: String::new(),
                metadata_path: defect.directory.display().to_string(),
                image_path: String::new(),
                status,
                action: actions::VALIDATION.to_string(),
                note: defect.to_string(),
            })?;
            error_count += 1;
            warn!(directory = %defect.directory.display(), "structural defect: {defect}");
        }

        for set in &discovery.sets {
            events.send(Event::Batch(BatchEvent::SetStarted {
                directory: set.base_dir.clone(),
                records: set.record_count(),
            }));

            audit.append(&AuditRecord {
                identifier: String::new(),
                metadata_path: set.base_dir.display().to_string(),
                image_path: String::new(),
                status: AuditStatus::ManifestOk,
                action: actions::VALIDATION.to_string(),
                note: format!("Manifest {}", set.manifest.display()),
            })?;

            let (pairs, extraction_failures) = resolve_pairs(set, &index);

            for (metadata, error) in &extraction_failures {
                audit.append(&AuditRecord {
                    identifier: String::new(),
                    metadata_path: metadata.display().to_string(),
                    image_path: String::new(),
                    status: AuditStatus::Warning,
                    action: actions::METADATA.to_string(),
                    note: error.to_string(),
                })?;
                warning_count += 1;
            }

            for pair in &pairs {
                // A cross-directory recovery always leaves its own row
                // naming the donor, on top of the record's outcome row.
                if let Some(PairStrategy::CrossDirectory { donor }) = &pair.strategy {
                    audit.append(&AuditRecord {
                        identifier: pair.identifier.clone(),
                        metadata_path: pair.metadata.display().to_string(),
                        image_path: display_or_empty(pair.image.as_deref()),
                        status: AuditStatus::Warning,
                        action: actions::CROSS_LINK.to_string(),
                        note: format!("Image recovered from {}", donor.display()),
                    })?;
                    warning_count += 1;
                }

                match seen_identifiers.entry(pair.identifier.clone()) {
                    Entry::Occupied(first) => {
                        audit.append(&AuditRecord {
                            identifier: pair.identifier.clone(),
                            metadata_path: pair.metadata.display().to_string(),
                            image_path: display_or_empty(pair.image.as_deref()),
                            status: AuditStatus::Warning,
                            action: actions::DUPLICATE_ID.to_string(),
                            note: format!(
                                "Identifier already seen in {}",
                                first.get().display()
                            ),
                        })?;
                        warning_count += 1;
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(pair.metadata.clone());
                    }
                }

                let Some(image) = pair.image.as_deref() else {
                    audit.append(&AuditRecord {
                        identifier: pair.identifier.clone(),
                        metadata_path: pair.metadata.display().to_string(),
                        image_path: String::new(),
                        status: AuditStatus::Warning,
                        action: actions::MISSING_IMAGE.to_string(),
                        note: "No image found for this record".to_string(),
                    })?;
                    warning_count += 1;
                    events.send(Event::Batch(BatchEvent::RecordFinished {
                        identifier: pair.identifier.clone(),
                        status: AuditStatus::Warning.to_string(),
                    }));
                    continue;
                };

                let outcome = if ctx.mode == BatchMode::Preview {
                    self.preview_record(set, pair, image)
                } else {
                    self.commit_record(set, pair, image, &mut renamed_bases)
                };

                match outcome {
                    Ok(note) => {
                        let action = if ctx.mode == BatchMode::Preview {
                            actions::DRY_RUN
                        } else {
                            actions::PROCESSED
                        };
                        audit.append(&AuditRecord {
                            identifier: pair.identifier.clone(),
                            metadata_path: pair.metadata.display().to_string(),
                            image_path: image.display().to_string(),
                            status: AuditStatus::Success,
                            action: action.to_string(),
                            note,
                        })?;
                        success_count += 1;
                        events.send(Event::Batch(BatchEvent::RecordFinished {
                            identifier: pair.identifier.clone(),
                            status: AuditStatus::Success.to_string(),
                        }));
                    }
                    Err(failure) => {
                        warn!(
                            identifier = %pair.identifier,
                            "record failed: {}", failure.error
                        );
                        audit.append(&AuditRecord {
                            identifier: pair.identifier.clone(),
                            metadata_path: pair.metadata.display().to_string(),
                            image_path: image.display().to_string(),
                            status: AuditStatus::Error,
                            action: failure.action.to_string(),
                            note: failure.error.to_string(),
                        })?;
                        error_count += 1;
                        events.send(Event::Batch(BatchEvent::RecordFinished {
                            identifier: pair.identifier.clone(),
                            status: AuditStatus::Error.to_string(),
                        }));
                    }
                }
            }
        }

        // Phase 4: PostFlight
        events.send(Event::Batch(BatchEvent::PhaseChanged {
            phase: BatchPhase::PostFlight,
        }));

        let reconciliation = if ctx.mode == BatchMode::Preview {
            None
        } else {
            let source_dirs: Vec<PathBuf> = if ctx.mode == BatchMode::Committed {
                discovery.sets.iter().map(|s| s.base_dir.clone()).collect()
            } else {
                Vec::new()
            };
            Some(flightcheck::reconcile(
                &ctx.work_dir,
                &ctx.report_path,
                total_records,
                &source_dirs,
                &renamed_bases,
            )?)
        };

        // Phase 5: Summarize
        events.send(Event::Batch(BatchEvent::PhaseChanged {
            phase: BatchPhase::Summarize,
        }));

        let mode_note = match ctx.mode {
            BatchMode::Preview => "Preview mode (no files were modified)".to_string(),
            mode => format!("{mode} mode"),
        };
        let note = if warning_count > 0 {
            format!("{mode_note}, {warning_count} warning(s)")
        } else {
            mode_note
        };
        audit.summary(success_count, error_count, &note)?;

        let duration_ms = start_time.elapsed().as_millis() as u64;
        events.send(Event::Batch(BatchEvent::Completed {
            summary: BatchSummary {
                success_count,
                error_count,
                warning_count,
                duration_ms,
            },
        }));

        info!(
            run_id = %ctx.run_id,
            success = success_count,
            errors = error_count,
            warnings = warning_count,
            duration_ms,
            "batch run finished"
        );

        Ok(BatchOutcome {
            run_id: ctx.run_id,
            mode: ctx.mode,
            success_count,
            error_count,
            warning_count,
            report_path: ctx.report_path.clone(),
            reconciliation,
            duration_ms,
        })
    }

    /// Evaluates one record without touching the filesystem.
    fn preview_record(
        &self,
        set: &PhotoSet,
        pair: &FilePair,
        image: &Path,
    ) -> std::result::Result<String, RecordFailure> {
        let base = naming::sanitize_identifier(&pair.identifier)
            .map_err(|e| RecordFailure::new(actions::VALIDATION, e))?;

        let manifest = sets::locate_manifest(&set.base_dir, &self.context.root).ok_or_else(|| {
            RecordFailure::new(
                actions::MANIFEST,
                ProcessError::MissingManifest {
                    dir: set.base_dir.clone(),
                },
            )
        })?;

        Ok(format!(
            "Would convert {} and package {base}.zip with {}",
            image.display(),
            manifest.display()
        ))
    }

    /// Processes one record: convert, rename the pair, locate the
    /// manifest, package. Committed works in the set's own directory;
    /// Staged keeps everything under the work directory and copies the
    /// metadata instead of renaming it.
    fn commit_record(
        &self,
        set: &PhotoSet,
        pair: &FilePair,
        image: &Path,
        renamed_bases: &mut HashSet<String>,
    ) -> std::result::Result<String, RecordFailure> {
        let ctx = &self.context;
        let base = naming::sanitize_identifier(&pair.identifier)
            .map_err(|e| RecordFailure::new(actions::VALIDATION, e))?;

        let target_dir = match ctx.mode {
            BatchMode::Committed => set.base_dir.clone(),
            _ => ctx.work_dir.clone(),
        };

        let stem = image
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(base.as_str());
        let converted = target_dir.join(format!("{stem}.tiff"));
        self.converter
            .convert(image, &converted)
            .map_err(|e| RecordFailure::new(actions::CONVERT, e))?;

        let (tiff_target, xml_target) =
            naming::collision_free_pair(&target_dir, &base, &converted, &pair.metadata)
                .map_err(|e| RecordFailure::new(actions::RENAME, e))?;

        fs::rename(&converted, &tiff_target).map_err(|e| {
            RecordFailure::new(
                actions::RENAME,
                ProcessError::Rename {
                    from: converted.clone(),
                    to: tiff_target.clone(),
                    source: e,
                },
            )
        })?;
        if ctx.mode == BatchMode::Committed {
            fs::rename(&pair.metadata, &xml_target).map_err(|e| {
                RecordFailure::new(
                    actions::RENAME,
                    ProcessError::Rename {
                        from: pair.metadata.clone(),
                        to: xml_target.clone(),
                        source: e,
                    },
                )
            })?;
        } else {
            fs::copy(&pair.metadata, &xml_target).map_err(|e| {
                RecordFailure::new(
                    actions::RENAME,
                    ProcessError::Io {
                        path: xml_target.clone(),
                        source: e,
                    },
                )
            })?;
        }
        renamed_bases.insert(base.clone());

        let manifest = sets::locate_manifest(&set.base_dir, &ctx.root).ok_or_else(|| {
            RecordFailure::new(
                actions::MANIFEST,
                ProcessError::MissingManifest {
                    dir: set.base_dir.clone(),
                },
            )
        })?;

        let container = naming::collision_free_container(&ctx.work_dir, &base)
            .map_err(|e| RecordFailure::new(actions::PACKAGE, e))?;
        self.packager
            .package(
                &container,
                &[tiff_target.clone(), xml_target.clone(), manifest],
            )
            .map_err(|e| RecordFailure::new(actions::PACKAGE, e))?;

        Ok(format!("Packaged {}", container.display()))
    }
}
