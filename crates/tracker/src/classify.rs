//! File classification
//!
//! Decides which files are tracked and which directories are walked.
//! Classification looks at names only; it never touches the filesystem.
//!
//! Excluded directories, matched by exact name at any depth:
//! 1. Configured `excluded_dirs` (`.lake`, `.git` by default)
//! 2. The log directory itself (always, so logs are never tracked)

use crate::config::{ClassifierConfig, TrackerConfig};
use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Component, Path};

/// Tracked-file and traversable-directory predicates
#[derive(Debug, Clone)]
pub struct Classifier {
    extensions: HashSet<String>,
    file_names: HashSet<String>,
    excluded_dirs: HashSet<String>,
}

impl Classifier {
    pub fn new(config: &ClassifierConfig, log_dir: &str) -> Self {
        let mut excluded_dirs: HashSet<String> = config.excluded_dirs.iter().cloned().collect();
        excluded_dirs.insert(log_dir.to_string());

        Self {
            extensions: config.extensions.iter().cloned().collect(),
            file_names: config.file_names.iter().cloned().collect(),
            excluded_dirs,
        }
    }

    pub fn from_config(config: &TrackerConfig) -> Self {
        Self::new(&config.classifier, &config.log_dir)
    }

    /// Whether a file with this path is tracked
    pub fn is_tracked_file(&self, path: &Path) -> bool {
        let name_matches = path
            .file_name()
            .and_then(OsStr::to_str)
            .is_some_and(|name| self.file_names.contains(name));

        name_matches
            || path
                .extension()
                .and_then(OsStr::to_str)
                .is_some_and(|ext| self.extensions.contains(ext))
    }

    /// Whether the scanner may descend into this directory
    ///
    /// A path with no final component (e.g. `/`) is traversable.
    pub fn is_tracked_directory(&self, path: &Path) -> bool {
        match path.file_name().and_then(OsStr::to_str) {
            Some(name) => !self.excluded_dirs.contains(name),
            None => true,
        }
    }

    /// Whether any directory between `root` and `path` is excluded
    ///
    /// Components of `root` itself are not inspected, so a root that lives
    /// inside e.g. `.lake/packages` is still usable.
    pub fn is_excluded_path(&self, root: &Path, path: &Path) -> bool {
        let Ok(rel) = path.strip_prefix(root) else {
            return false;
        };
        let mut dirs: Vec<Component> = rel.components().collect();
        // The last component is the file itself
        dirs.pop();
        dirs.iter().any(|c| match c {
            Component::Normal(name) => name.to_str().is_some_and(|n| self.excluded_dirs.contains(n)),
            _ => false,
        })
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::from_config(&TrackerConfig::default())
    }
}
