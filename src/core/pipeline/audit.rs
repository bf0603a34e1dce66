//! CSV audit log.
//!
//! One row per outcome, flushed as written so an interrupted run still
//! leaves a readable log. The final row is always a SUMMARY row carrying
//! aggregate counts; because its Status column holds `Success: N` rather
//! than `SUCCESS`, count queries over the Status column never see it.

use crate::error::ReportError;
use csv::Writer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Column order of every audit row.
pub const AUDIT_HEADER: [&str; 6] = [
    "Identifier",
    "MetadataPath",
    "ImagePath",
    "Status",
    "Action",
    "Notes",
];

/// Action tags the pipeline emits. The column itself is free-form.
pub mod actions {
    pub const DRY_RUN: &str = "DRY_RUN";
    pub const PROCESSED: &str = "PROCESSED";
    pub const VALIDATION: &str = "VALIDATION";
    pub const MISSING_IMAGE: &str = "MISSING_IMAGE";
    pub const CROSS_LINK: &str = "CROSS_LINK";
    pub const DUPLICATE_ID: &str = "DUPLICATE_ID";
    pub const METADATA: &str = "METADATA";
    pub const CONVERT: &str = "CONVERT";
    pub const RENAME: &str = "RENAME";
    pub const MANIFEST: &str = "MANIFEST";
    pub const PACKAGE: &str = "PACKAGE";
    pub const SUMMARY: &str = "SUMMARY";
}

/// Status column values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditStatus {
    Success,
    Warning,
    Error,
    ManifestOk,
    ManifestError,
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self {
            Self::Success => "SUCCESS",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::ManifestOk => "MANIFEST_OK",
            Self::ManifestError => "MANIFEST_ERROR",
        };
        write!(f, "{status}")
    }
}

/// One audit row. Set-level rows leave the identifier empty.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub identifier: String,
    pub metadata_path: String,
    pub image_path: String,
    pub status: AuditStatus,
    pub action: String,
    pub note: String,
}

/// Append-only writer over the audit CSV.
pub struct AuditWriter {
    path: PathBuf,
    writer: Writer<File>,
}

impl AuditWriter {
    /// Creates the log (and its parent directory) and writes the header.
    pub fn create(path: &Path) -> Result<Self, ReportError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ReportError::Create {
                path: path.to_path_buf(),
                source: e,
            })?;
        }
        let file = File::create(path).map_err(|e| ReportError::Create {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut writer = Writer::from_writer(file);
        writer
            .write_record(AUDIT_HEADER)
            .map_err(|e| ReportError::Write {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let mut audit = Self {
            path: path.to_path_buf(),
            writer,
        };
        audit.flush()?;
        Ok(audit)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&mut self, record: &AuditRecord) -> Result<(), ReportError> {
        let status = record.status.to_string();
        let row = [
            record.identifier.as_str(),
            record.metadata_path.as_str(),
            record.image_path.as_str(),
            status.as_str(),
            record.action.as_str(),
            record.note.as_str(),
        ];
        self.writer.write_record(row).map_err(|e| ReportError::Write {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        self.flush()
    }

    /// Terminal row: `SUMMARY,,,Success: N,Errors: M,<note>`.
    pub fn summary(
        &mut self,
        success_count: usize,
        error_count: usize,
        note: &str,
    ) -> Result<(), ReportError> {
        let success = format!("Success: {success_count}");
        let errors = format!("Errors: {error_count}");
        let row = [actions::SUMMARY, "", "", success.as_str(), errors.as_str(), note];
        self.writer.write_record(row).map_err(|e| ReportError::Write {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        self.flush()
    }

    fn flush(&mut self) -> Result<(), ReportError> {
        self.writer.flush().map_err(|e| ReportError::Write {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }
}

/// Counts rows whose Status column is exactly `SUCCESS`.
pub fn count_success_rows(path: &Path) -> Result<usize, ReportError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| ReportError::Read {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut count = 0;
    for record in reader.records() {
        let record = record.map_err(|e| ReportError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if record.get(3) == Some("SUCCESS") {
            count += 1;
        }
    }
    Ok(count)
}
