//! # Pairing Module
//!
//! Matches each metadata file in a set with its partner image.
//!
//! ## Cascade (first hit wins)
//! 1. Exact stem match
//! 2. Identifier-substring match (weaker; logged)
//! 3. Lone survivor (exactly one image and one metadata file)
//! 4. Cross-directory recovery via the global [`RecoveryIndex`]
//!
//! A record with no match simply has no image; the caller records a
//! MISSING_IMAGE warning and the batch goes on.

mod index;
mod strategies;

pub use index::RecoveryIndex;

use crate::core::metadata::extract_identifier;
use crate::core::sets::PhotoSet;
use crate::error::ExtractError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Which cascade step produced a pairing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairStrategy {
    ExactStem,
    IdentifierSubstring,
    LoneSurvivor,
    /// Image recovered from another directory
    CrossDirectory { donor: PathBuf },
}

impl std::fmt::Display for PairStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PairStrategy::ExactStem => write!(f, "exact stem"),
            PairStrategy::IdentifierSubstring => write!(f, "identifier substring"),
            PairStrategy::LoneSurvivor => write!(f, "lone survivor"),
            PairStrategy::CrossDirectory { donor } => {
                write!(f, "cross-directory from {}", donor.display())
            }
        }
    }
}

/// One ingest record: a metadata file, its identifier, and (usually) an
/// image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePair {
    pub metadata: PathBuf,
    pub image: Option<PathBuf>,
    pub identifier: String,
    /// How the image was found; `None` when there is no image
    pub strategy: Option<PairStrategy>,
}

/// Run the cascade for a single metadata file.
pub fn resolve_image(
    set: &PhotoSet,
    metadata: &Path,
    identifier: &str,
    index: &RecoveryIndex,
) -> Option<(PathBuf, PairStrategy)> {
    for strategy in strategies::CASCADE {
        if let Some((image, kind)) = strategy(set, metadata, identifier, index) {
            match &kind {
                PairStrategy::IdentifierSubstring => debug!(
                    identifier,
                    image = %image.display(),
                    "paired by identifier substring (weaker match)"
                ),
                PairStrategy::CrossDirectory { donor } => info!(
                    identifier,
                    donor = %donor.display(),
                    "recovered image from another directory"
                ),
                _ => {}
            }
            return Some((image, kind));
        }
    }
    None
}

/// Resolve every record in a set.
///
/// Metadata files whose identifier cannot be extracted come back in the
/// failure list instead of producing a pair.
pub fn resolve_pairs(
    set: &PhotoSet,
    index: &RecoveryIndex,
) -> (Vec<FilePair>, Vec<(PathBuf, ExtractError)>) {
    let mut pairs = Vec::with_capacity(set.metadata.len());
    let mut failures = Vec::new();

    for metadata in &set.metadata {
        match extract_identifier(metadata) {
            Ok(identifier) => {
                let resolved = resolve_image(set, metadata, &identifier, index);
                let (image, strategy) = match resolved {
                    Some((image, strategy)) => (Some(image), Some(strategy)),
                    None => (None, None),
                };
                pairs.push(FilePair {
                    metadata: metadata.clone(),
                    image,
                    identifier,
                    strategy,
                });
            }
            Err(error) => failures.push((metadata.clone(), error)),
        }
    }

    (pairs, failures)
}
