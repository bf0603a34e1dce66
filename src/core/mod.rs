//! # Core Module
//!
//! The UI-agnostic batch ingest engine.
//!
//! ## Modules
//! - `scanner` - Walks the archive tree and classifies files by role
//! - `metadata` - Extracts archival identifiers from MODS records
//! - `sets` - Assembles directories into photo sets and flags defects
//! - `pairing` - Matches metadata records to their images
//! - `convert` - Decodes source images and encodes archival TIFFs
//! - `package` - Builds and verifies the submission containers
//! - `flightcheck` - Pre-run capacity checks and post-run reconciliation
//! - `pipeline` - Orchestrates the full batch run

pub mod convert;
pub mod flightcheck;
pub mod metadata;
pub mod package;
pub mod pairing;
pub mod pipeline;
pub mod scanner;
pub mod sets;

// Re-export commonly used types
pub use pairing::{FilePair, PairStrategy, RecoveryIndex};
pub use pipeline::{BatchMode, BatchOutcome, BatchRunner};
pub use scanner::{ClassifiedFile, FileKind, ScanInventory};
pub use sets::{Discovery, PhotoSet, SetDefect};
