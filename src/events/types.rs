//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the ingest library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Discovery (scan + set assembly) events
    Scan(ScanEvent),
    /// Batch pipeline events
    Batch(BatchEvent),
}

/// Events during discovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Walking the source tree has started
    Started { root: PathBuf },
    /// A directory could not be read and was skipped; the scan continues
    DirectorySkipped { path: PathBuf, message: String },
    /// Discovery completed
    Completed { sets: usize, defects: usize },
}

/// Events during a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BatchEvent {
    /// The run has started
    Started {
        mode: String,
        total_sets: usize,
        total_records: usize,
    },
    /// The run moved to a new phase
    PhaseChanged { phase: BatchPhase },
    /// Processing of one photo set has started
    SetStarted { directory: PathBuf, records: usize },
    /// One record finished with the given audit status
    RecordFinished { identifier: String, status: String },
    /// The run completed
    Completed { summary: BatchSummary },
    /// The run failed before completing (e.g. a pre-flight blocker)
    Failed { message: String },
}

/// Phases of a batch run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchPhase {
    Initialize,
    PreFlight,
    Processing,
    PostFlight,
    Summarize,
}

/// Aggregate counts reported when a run completes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Records processed successfully (or evaluated, in preview)
    pub success_count: usize,
    /// Record- and set-level errors
    pub error_count: usize,
    /// Warnings (missing images, cross-links, duplicate identifiers)
    pub warning_count: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for BatchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchPhase::Initialize => write!(f, "Initialize"),
            BatchPhase::PreFlight => write!(f, "Pre-flight"),
            BatchPhase::Processing => write!(f, "Processing"),
            BatchPhase::PostFlight => write!(f, "Post-flight"),
            BatchPhase::Summarize => write!(f, "Summarize"),
        }
    }
}
