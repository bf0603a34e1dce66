//! Bounded-depth directory walking built on walkdir.

use super::classify::{classify, is_hidden};
use super::{ClassifiedFile, ScanInventory};
use crate::error::ScanError;
use crate::events::{Event, EventSender, ScanEvent};
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// How deep the walk goes, in path components below the root.
///
/// Field archives organize as year/area/(subarea), so six levels leaves
/// comfortable margin while keeping runaway trees bounded.
pub const MAX_SCAN_DEPTH: usize = 6;

/// Walks a source tree and produces a [`ScanInventory`].
///
/// Symlinks are never followed. Unreadable directories are recorded and
/// skipped; a scan only fails outright when the root itself is missing.
pub struct TreeScanner {
    max_depth: usize,
}

impl TreeScanner {
    pub fn new() -> Self {
        Self {
            max_depth: MAX_SCAN_DEPTH,
        }
    }

    /// Scan without progress reporting
    pub fn scan(&self, root: &Path) -> Result<ScanInventory, ScanError> {
        self.scan_with_events(root, &crate::events::null_sender())
    }

    /// Scan with progress reporting via events
    pub fn scan_with_events(
        &self,
        root: &Path,
        events: &EventSender,
    ) -> Result<ScanInventory, ScanError> {
        if !root.is_dir() {
            return Err(ScanError::RootNotFound {
                path: root.to_path_buf(),
            });
        }

        events.send(Event::Scan(ScanEvent::Started {
            root: root.to_path_buf(),
        }));

        let mut inventory = ScanInventory::default();

        let walker = WalkDir::new(root)
            .follow_links(false)
            .max_depth(self.max_depth)
            .into_iter()
            // The root of a scan may itself be a dotdir (tempdirs often are)
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.path()));

        for entry_result in walker {
            match entry_result {
                Ok(entry) => {
                    if entry.file_type().is_dir() {
                        continue;
                    }
                    if let Some(kind) = classify(entry.path()) {
                        inventory.push(ClassifiedFile {
                            path: entry.path().to_path_buf(),
                            kind,
                        });
                    }
                }
                Err(e) => {
                    let path = e.path().map(|p| p.to_path_buf()).unwrap_or_default();

                    let error = if e.io_error().map(|io| io.kind())
                        == Some(std::io::ErrorKind::PermissionDenied)
                    {
                        ScanError::PermissionDenied { path: path.clone() }
                    } else {
                        ScanError::ReadDirectory {
                            path: path.clone(),
                            source: std::io::Error::other(e.to_string()),
                        }
                    };

                    warn!(path = %path.display(), "skipping unreadable entry: {error}");
                    events.send(Event::Scan(ScanEvent::DirectorySkipped {
                        path,
                        message: error.to_string(),
                    }));
                    inventory.errors.push(error);
                }
            }
        }

        inventory.sort();
        debug!(
            images = inventory.images.len(),
            metadata = inventory.metadata.len(),
            manifests = inventory.manifests.len(),
            "scan of {} finished",
            root.display()
        );

        Ok(inventory)
    }
}

impl Default for TreeScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(b"x").unwrap();
        path
    }

    #[test]
    fn scan_empty_directory_returns_empty_inventory() {
        let temp_dir = TempDir::new().unwrap();
        let inventory = TreeScanner::new().scan(temp_dir.path()).unwrap();

        assert!(inventory.is_empty());
        assert!(inventory.errors.is_empty());
    }

    #[test]
    fn scan_classifies_all_three_kinds() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "photo_001.jpg");
        touch(temp_dir.path(), "photo_001.xml");
        touch(temp_dir.path(), "MANIFEST.ini");
        touch(temp_dir.path(), "notes.txt");

        let inventory = TreeScanner::new().scan(temp_dir.path()).unwrap();

        assert_eq!(inventory.images.len(), 1);
        assert_eq!(inventory.metadata.len(), 1);
        assert_eq!(inventory.manifests.len(), 1);
        assert_eq!(inventory.total_files(), 3);
    }

    #[test]
    fn scan_traverses_nested_directories() {
        let temp_dir = TempDir::new().unwrap();
        let subdir = temp_dir.path().join("2006").join("46N-3W");
        fs::create_dir_all(&subdir).unwrap();
        touch(temp_dir.path(), "root.jpg");
        touch(&subdir, "nested.jpg");

        let inventory = TreeScanner::new().scan(temp_dir.path()).unwrap();

        assert_eq!(inventory.images.len(), 2);
    }

    #[test]
    fn scan_results_are_sorted() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "b.jpg");
        touch(temp_dir.path(), "a.jpg");
        touch(temp_dir.path(), "c.jpg");

        let inventory = TreeScanner::new().scan(temp_dir.path()).unwrap();
        let names: Vec<_> = inventory
            .images
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();

        assert_eq!(names, vec!["a.jpg", "b.jpg", "c.jpg"]);
    }

    #[test]
    fn scan_stops_at_depth_bound() {
        let temp_dir = TempDir::new().unwrap();

        // One file per nesting level, seven levels deep
        let mut dir = temp_dir.path().to_path_buf();
        for level in 1..=7 {
            dir = dir.join(format!("level{level}"));
            fs::create_dir(&dir).unwrap();
            touch(&dir, &format!("photo{level}.jpg"));
        }

        let inventory = TreeScanner::new().scan(temp_dir.path()).unwrap();

        // Files at depth 7 (inside level6) are beyond the bound
        assert_eq!(inventory.images.len(), 5);
        assert!(inventory
            .images
            .iter()
            .all(|p| !p.to_string_lossy().contains("photo6")));
    }

    #[test]
    fn scan_skips_hidden_directories() {
        let temp_dir = TempDir::new().unwrap();
        let hidden = temp_dir.path().join(".thumbnails");
        fs::create_dir(&hidden).unwrap();
        touch(&hidden, "thumb.jpg");
        touch(temp_dir.path(), "visible.jpg");

        let inventory = TreeScanner::new().scan(temp_dir.path()).unwrap();

        assert_eq!(inventory.images.len(), 1);
        assert!(inventory.images[0].ends_with("visible.jpg"));
    }

    #[test]
    fn scan_missing_root_is_an_error() {
        let result = TreeScanner::new().scan(Path::new("/nonexistent/archive/12345"));
        assert!(matches!(result, Err(ScanError::RootNotFound { .. })));
    }
}
