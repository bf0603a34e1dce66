//! # Flight Check Module
//!
//! Run bracketing: pre-flight resource checks before the first record,
//! post-flight reconciliation after the last.

mod postflight;
mod preflight;

pub use postflight::{reconcile, ReconciliationReport};
pub use preflight::{run_preflight, PreFlightReport, PER_RECORD_FOOTPRINT_BYTES};
