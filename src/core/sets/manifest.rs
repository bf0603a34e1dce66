//! Manifest location at packaging time.

use crate::core::scanner::MANIFEST_FILE_NAME;
use std::fs;
use std::path::{Path, PathBuf};

/// Find the manifest governing `start`: the directory itself first, then
/// each ancestor up to and including `stop`.
///
/// Within one directory the sorted-first manifest wins, which keeps the
/// choice deterministic if a directory somehow holds several spellings.
pub fn locate_manifest(start: &Path, stop: &Path) -> Option<PathBuf> {
    let mut dir = start;
    loop {
        if let Some(found) = manifest_in_dir(dir) {
            return Some(found);
        }
        if dir == stop {
            return None;
        }
        dir = dir.parent()?;
    }
}

fn manifest_in_dir(dir: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    let mut found: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.eq_ignore_ascii_case(MANIFEST_FILE_NAME))
                    .unwrap_or(false)
        })
        .collect();
    found.sort();
    found.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn finds_manifest_in_same_directory() {
        let temp = TempDir::new().unwrap();
        let manifest = temp.path().join("MANIFEST.ini");
        fs::write(&manifest, "[manifest]").unwrap();

        assert_eq!(
            locate_manifest(temp.path(), temp.path()),
            Some(manifest)
        );
    }

    #[test]
    fn walks_up_to_nearest_ancestor() {
        let temp = TempDir::new().unwrap();
        let manifest = temp.path().join("manifest.ini");
        fs::write(&manifest, "[manifest]").unwrap();

        let deep = temp.path().join("2007").join("46N-3W");
        fs::create_dir_all(&deep).unwrap();

        assert_eq!(locate_manifest(&deep, temp.path()), Some(manifest));
    }

    #[test]
    fn nearer_manifest_shadows_farther_one() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("manifest.ini"), "far").unwrap();

        let mid = temp.path().join("2007");
        fs::create_dir_all(&mid).unwrap();
        let near = mid.join("MANIFEST.ini");
        fs::write(&near, "near").unwrap();

        let deep = mid.join("46N-3W");
        fs::create_dir(&deep).unwrap();

        assert_eq!(locate_manifest(&deep, temp.path()), Some(near));
    }

    #[test]
    fn stops_at_the_given_root() {
        let temp = TempDir::new().unwrap();
        let inside = temp.path().join("2007");
        fs::create_dir(&inside).unwrap();

        // Nothing anywhere under the root
        assert_eq!(locate_manifest(&inside, temp.path()), None);
    }
}
