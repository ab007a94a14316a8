//! Path resolution and on-disk log layout
//!
//! Every tracked root owns a log directory:
//! ```text
//! <root>/<log-dir>/<identity>/<relative-file-path>/concrete-history/<timestamp-ms>
//! <root>/<log-dir>/<identity>/<relative-file-path>/edits-history/<timestamp-ms>
//! ```
//! The identity segment is omitted when identity namespacing is disabled.

use crate::error::{Result, TrackError};
use crate::identity::Identity;
use std::path::{Component, Path, PathBuf};

/// Default name of the log directory inside a tracked root
pub const DEFAULT_LOG_DIR_NAME: &str = ".changes";

/// Per-file directory holding checkpoints
pub const CONCRETE_DIR_NAME: &str = "concrete-history";

/// Per-file directory holding edits
pub const EDITS_DIR_NAME: &str = "edits-history";

/// Maps files to the tracked root that owns them
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    roots: Vec<PathBuf>,
}

impl PathResolver {
    pub fn new(roots: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut roots: Vec<PathBuf> = roots.into_iter().collect();
        roots.sort();
        roots.dedup();
        Self { roots }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Innermost root that strictly contains `file`
    pub fn tracking_root(&self, file: &Path) -> Option<&Path> {
        self.roots
            .iter()
            .filter(|root| is_subpath(root, file))
            .max_by_key(|root| root.components().count())
            .map(PathBuf::as_path)
    }

    /// Roots that are not nested inside another configured root
    pub fn outermost_roots(&self) -> Vec<&Path> {
        self.roots
            .iter()
            .filter(|r| !self.roots.iter().any(|other| is_subpath(other, r)))
            .map(PathBuf::as_path)
            .collect()
    }
}

/// True if `child` lies strictly below `parent` (lexically)
pub fn is_subpath(parent: &Path, child: &Path) -> bool {
    match child.strip_prefix(parent) {
        Ok(rel) => {
            rel.components().next().is_some()
                && rel.components().all(|c| matches!(c, Component::Normal(_)))
        }
        Err(_) => false,
    }
}

/// Location of one root's log, optionally inside an identity namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLayout {
    root: PathBuf,
    log_dir: PathBuf,
}

impl LogLayout {
    pub fn new(root: &Path, log_dir_name: &str, identity: Option<&Identity>) -> Self {
        let mut log_dir = root.join(log_dir_name);
        if let Some(identity) = identity {
            log_dir.push(identity.segment());
        }
        Self {
            root: root.to_path_buf(),
            log_dir,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<log-dir>[/<identity>]`
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Path of `file` relative to the root
    pub fn relative<'a>(&self, file: &'a Path) -> Result<&'a Path> {
        if !is_subpath(&self.root, file) {
            return Err(TrackError::OutsideRoot(file.to_path_buf()));
        }
        file.strip_prefix(&self.root)
            .map_err(|_| TrackError::OutsideRoot(file.to_path_buf()))
    }

    pub fn file_dir(&self, file: &Path) -> Result<PathBuf> {
        Ok(self.log_dir.join(self.relative(file)?))
    }

    pub fn concrete_dir(&self, file: &Path) -> Result<PathBuf> {
        Ok(self.file_dir(file)?.join(CONCRETE_DIR_NAME))
    }

    pub fn edits_dir(&self, file: &Path) -> Result<PathBuf> {
        Ok(self.file_dir(file)?.join(EDITS_DIR_NAME))
    }
}
