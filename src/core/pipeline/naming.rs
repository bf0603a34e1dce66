//! Identifier sanitization and collision-free target naming.
//!
//! The rename pair and the container follow the same `_a`..`_z` suffix
//! discipline but run independent sequences: the pair picks one shared
//! suffix so the TIFF and XML stay together, the container picks its own.

use crate::error::ProcessError;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn forbidden_chars() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"[<>:"/\\|?*']"#).unwrap())
}

/// Makes an identifier safe to use as a filename: trim, spaces to
/// underscores, forbidden characters stripped.
pub fn sanitize_identifier(identifier: &str) -> Result<String, ProcessError> {
    let underscored = identifier.trim().replace(' ', "_");
    let cleaned = forbidden_chars().replace_all(&underscored, "").to_string();

    if cleaned.is_empty() {
        return Err(ProcessError::EmptyIdentifier {
            identifier: identifier.to_string(),
        });
    }
    Ok(cleaned)
}

/// Base name first, then `base_a` through `base_z`.
fn candidates(base: &str) -> impl Iterator<Item = String> + '_ {
    std::iter::once(base.to_string()).chain(('a'..='z').map(move |suffix| format!("{base}_{suffix}")))
}

/// A target counts as taken only when it is a different file than the one
/// being renamed, so re-running over already-named files finds no
/// collision with itself.
fn is_free(target: &Path, current: &Path) -> bool {
    if !target.exists() {
        return true;
    }
    match (target.canonicalize(), current.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => target == current,
    }
}

/// Picks one shared suffix for the renamed TIFF and XML.
pub fn collision_free_pair(
    dir: &Path,
    base: &str,
    current_tiff: &Path,
    current_xml: &Path,
) -> Result<(PathBuf, PathBuf), ProcessError> {
    for name in candidates(base) {
        let tiff = dir.join(format!("{name}.tiff"));
        let xml = dir.join(format!("{name}.xml"));
        if is_free(&tiff, current_tiff) && is_free(&xml, current_xml) {
            return Ok((tiff, xml));
        }
    }
    Err(ProcessError::SuffixesExhausted {
        identifier: base.to_string(),
        dir: dir.to_path_buf(),
    })
}

/// Picks the container path, with its own suffix sequence.
pub fn collision_free_container(dir: &Path, base: &str) -> Result<PathBuf, ProcessError> {
    for name in candidates(base) {
        let container = dir.join(format!("{name}.zip"));
        if !container.exists() {
            return Ok(container);
        }
    }
    Err(ProcessError::SuffixesExhausted {
        identifier: base.to_string(),
        dir: dir.to_path_buf(),
    })
}
