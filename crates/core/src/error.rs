//! Error types shared by the tracking crates

use crate::time::Millis;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors produced by checkpoint, edit and tracking operations
#[derive(Debug, Error)]
pub enum TrackError {
    /// A file or directory could not be read, written or listed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A persisted record failed to parse or serialize
    #[error("malformed record at {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An edit could not be anchored to any checkpoint, even after a refresh
    #[error("no checkpoint could be produced for {}", .0.display())]
    MissingBase(PathBuf),

    /// A reference checkpoint points at a checkpoint that does not exist
    #[error("checkpoint {from} in {} references missing checkpoint {missing}", dir.display())]
    DanglingReference {
        dir: PathBuf,
        from: Millis,
        missing: Millis,
    },

    /// Following reference checkpoints revisited a key
    #[error("checkpoint chain in {} cycles back to {at}", dir.display())]
    CyclicChain { dir: PathBuf, at: Millis },

    /// Following reference checkpoints exceeded the configured depth
    #[error("checkpoint chain in {} starting at {start} exceeds {limit} links", dir.display())]
    ChainTooDeep {
        dir: PathBuf,
        start: Millis,
        limit: usize,
    },

    /// The path is not inside any tracked root
    #[error("{} is not inside a tracked root", .0.display())]
    OutsideRoot(PathBuf),

    /// A gated operation panicked before producing a result
    #[error("gated operation aborted before completing")]
    GateAborted,

    /// The gate worker is gone and no longer accepts operations
    #[error("serialization gate is closed")]
    GateClosed,
}

/// Result type for tracking operations
pub type Result<T> = std::result::Result<T, TrackError>;

impl TrackError {
    /// Build an I/O error tagged with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error is an I/O "not found"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// Attach a path to a bare `io::Result`
pub trait IoResultExt<T> {
    fn at(self, path: &Path) -> Result<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn at(self, path: &Path) -> Result<T> {
        self.map_err(|e| TrackError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_carries_path() {
        let err: Result<()> = Err(io::Error::new(io::ErrorKind::NotFound, "gone"))
            .at(Path::new("/work/a.lean"));
        let err = err.unwrap_err();

        assert!(err.is_not_found());
        assert!(err.to_string().contains("/work/a.lean"));
    }

    #[test]
    fn test_other_errors_are_not_not_found() {
        let err = TrackError::MissingBase(PathBuf::from("a.lean"));
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "no checkpoint could be produced for a.lean");
    }
}
