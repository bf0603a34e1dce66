//! # Error Module
//!
//! User-friendly error types for the batch ingest tool.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, identifiers, what went wrong
//! - **Contain failures** - record-level errors become audit rows, not aborts
//! - **Block early** - only pre-flight blockers stop a run before it starts

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Metadata error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Processing error: {0}")]
    Process(#[from] ProcessError),

    #[error("Pre-flight check failed: {0}")]
    PreFlight(#[from] PreFlightError),

    #[error("Audit log error: {0}")]
    Report(#[from] ReportError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors that occur while scanning the source tree
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Root directory not found: {path}")]
    RootNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while extracting an identifier from a metadata file
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Failed to read metadata file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed XML in {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("No identifier found in {path}")]
    MissingIdentifier { path: PathBuf },
}

/// Record-level errors during batch processing
///
/// These are contained at the per-record boundary: each one becomes a single
/// ERROR audit row and the batch moves on to the next record.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to convert {path}: {reason}")]
    Conversion { path: PathBuf, reason: String },

    #[error("Identifier {identifier:?} sanitizes to an empty filename")]
    EmptyIdentifier { identifier: String },

    #[error("Exhausted collision suffixes _a..=_z for {identifier} in {dir}")]
    SuffixesExhausted { identifier: String, dir: PathBuf },

    #[error("Failed to rename {from} to {to}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No manifest found in {dir} or any ancestor")]
    MissingManifest { dir: PathBuf },

    #[error("Failed to package container {path}: {reason}")]
    Archive { path: PathBuf, reason: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Run-level blockers raised by pre-flight, before any record is touched
#[derive(Error, Debug)]
pub enum PreFlightError {
    #[error(
        "Insufficient disk space: {} MB available, {} MB required",
        .available_bytes / (1024 * 1024),
        .required_bytes / (1024 * 1024)
    )]
    InsufficientDiskSpace {
        available_bytes: u64,
        required_bytes: u64,
    },

    #[error("No write permission for output directory {path}: {reason}")]
    NoWritePermission { path: PathBuf, reason: String },
}

/// Errors that occur while writing or reading the audit log
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to create audit log at {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write audit row to {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("Failed to read audit log {path}: {reason}")]
    Read { path: PathBuf, reason: String },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_error_includes_path() {
        let error = ScanError::RootNotFound {
            path: PathBuf::from("/photos/2006"),
        };
        let message = error.to_string();
        assert!(message.contains("/photos/2006"));
    }

    #[test]
    fn extract_errors_are_distinct() {
        let parse = ExtractError::Parse {
            path: PathBuf::from("/photos/bad.xml"),
            reason: "unexpected end of stream".to_string(),
        };
        let missing = ExtractError::MissingIdentifier {
            path: PathBuf::from("/photos/empty.xml"),
        };
        assert!(parse.to_string().contains("Malformed XML"));
        assert!(parse.to_string().contains("unexpected end of stream"));
        assert!(missing.to_string().contains("No identifier"));
    }

    #[test]
    fn disk_space_error_reports_megabytes() {
        let error = PreFlightError::InsufficientDiskSpace {
            available_bytes: 5 * 1024 * 1024,
            required_bytes: 50 * 1024 * 1024,
        };
        let message = error.to_string();
        assert!(message.contains("5 MB available"));
        assert!(message.contains("50 MB required"));
    }

    #[test]
    fn process_error_names_both_rename_paths() {
        let error = ProcessError::Rename {
            from: PathBuf::from("/a/old.tiff"),
            to: PathBuf::from("/a/new.tiff"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let message = error.to_string();
        assert!(message.contains("/a/old.tiff"));
        assert!(message.contains("/a/new.tiff"));
    }
}
