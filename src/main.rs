//! # photo-ingest CLI
//!
//! Command-line interface for the photo batch ingest tool.
//!
//! ## Usage
//! ```bash
//! photo-ingest scan ~/Excavations/2006
//! photo-ingest run ~/Excavations/2006 --output-dir ~/ingest-out --dry-run
//! photo-ingest run ~/Excavations/2006 --output-dir ~/ingest-out --staging
//! ```

mod cli;

use photo_batch_ingest::Result;

fn main() -> Result<()> {
    photo_batch_ingest::init_tracing();
    cli::run()
}
