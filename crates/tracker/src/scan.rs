//! Workspace scanning
//!
//! Walks a root and collects every tracked file, in a stable order.

use crate::classify::Classifier;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use vacuum_core::{Result, TrackError};
use walkdir::WalkDir;

/// Collect the tracked files below `root`
///
/// Siblings are visited in file-name order and excluded directories are
/// pruned without being read. Symlinks are neither followed nor collected.
/// An unreadable root is an error; an unreadable directory further down is
/// logged and skipped.
pub fn scan(root: &Path, classifier: &Classifier) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_type().is_dir() || classifier.is_tracked_directory(e.path()));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                let path = e.path().unwrap_or(root).to_path_buf();
                return Err(TrackError::io(path, io::Error::from(e)));
            }
            Err(e) => {
                warn!("Skipping unreadable entry during scan of {}: {}", root.display(), e);
                continue;
            }
        };

        if entry.file_type().is_file() && classifier.is_tracked_file(entry.path()) {
            files.push(entry.into_path());
        }
    }

    debug!("Scanned {}: {} tracked files", root.display(), files.len());
    Ok(files)
}
