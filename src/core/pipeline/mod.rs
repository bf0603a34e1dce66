//! # Pipeline Module
//!
//! Orchestrates the batch ingest workflow.
//!
//! ## Pipeline Stages
//! 1. **Initialize** - Discover photo sets and build the recovery index
//! 2. **PreFlight** - Disk space, write permission, leftover artifacts
//! 3. **Processing** - Per record: convert, rename, locate manifest, package
//! 4. **PostFlight** - Container verification and count reconciliation
//! 5. **Summarize** - SUMMARY audit row and aggregate counts
//!
//! ## Concurrency
//! Records are processed strictly one at a time, in deterministic order.

mod audit;
mod executor;
mod naming;

pub use audit::{
    actions, count_success_rows, AuditRecord, AuditStatus, AuditWriter, AUDIT_HEADER,
};
pub use executor::{
    run_batch, BatchContext, BatchMode, BatchOutcome, BatchRunner, BatchRunnerBuilder,
    STAGING_DIR_NAME,
};
pub use naming::{collision_free_container, collision_free_pair, sanitize_identifier};
