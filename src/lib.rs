//! # Photo Batch Ingest
//!
//! A batch ingest tool that turns excavation photo directories into
//! submission-ready archive containers.
//!
//! ## Core Philosophy
//! - **Never destroy sources** - Preview and staged modes leave the archive untouched
//! - **Audit everything** - Every record lands in the CSV report exactly once
//! - **Fail one, finish the rest** - A bad record never stops the batch
//!
//! ## Architecture
//! The library is split into a core engine (UI-agnostic) and presentation layers:
//! - `core` - Discovery, pairing, conversion, packaging, and the batch pipeline
//! - `events` - Event-driven progress reporting (GUI-ready)
//! - `error` - User-friendly error types
//! - `cli` - Command-line interface

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use crate::core::pipeline::{run_batch, BatchMode, BatchOutcome, BatchRunner};
pub use crate::core::sets::{discover, scan, Discovery, PhotoSet};
pub use error::{IngestError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point (CLI or GUI).
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}
