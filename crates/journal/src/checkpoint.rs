//! Checkpoint records and the per-file checkpoint store

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;
use vacuum_core::error::{IoResultExt, Result, TrackError};
use vacuum_core::time::mtime_ms;
use vacuum_core::{store, LogLayout, Millis};

/// Default bound on reference-chain length before giving up
pub const DEFAULT_MAX_CHAIN_DEPTH: usize = 1024;

/// A point-in-time record of a tracked file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Checkpoint {
    /// Full content captured at `mtime`
    #[serde(rename = "new")]
    Content { contents: String, mtime: Millis },
    /// Content identical to the checkpoint stored under `prev_mtime`
    #[serde(rename = "same")]
    Reference {
        #[serde(rename = "prevMtime")]
        prev_mtime: Millis,
        mtime: Millis,
    },
}

/// Checkpoint variant without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointKind {
    Content,
    Reference,
}

impl fmt::Display for CheckpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckpointKind::Content => f.write_str("new"),
            CheckpointKind::Reference => f.write_str("same"),
        }
    }
}

impl Checkpoint {
    /// Key the checkpoint is stored under
    pub fn mtime(&self) -> Millis {
        match self {
            Checkpoint::Content { mtime, .. } | Checkpoint::Reference { mtime, .. } => *mtime,
        }
    }

    pub fn kind(&self) -> CheckpointKind {
        match self {
            Checkpoint::Content { .. } => CheckpointKind::Content,
            Checkpoint::Reference { .. } => CheckpointKind::Reference,
        }
    }

    /// Inline contents, for content checkpoints only
    pub fn contents(&self) -> Option<&str> {
        match self {
            Checkpoint::Content { contents, .. } => Some(contents),
            Checkpoint::Reference { .. } => None,
        }
    }
}

/// Effective content of a checkpoint after walking its reference chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedContent {
    /// Key of the content checkpoint the chain ended at
    pub mtime: Millis,
    pub contents: String,
    /// Reference links followed to get there
    pub hops: usize,
}

/// Result of a refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new checkpoint was stored
    Created(Checkpoint),
    /// The file has not been modified since the checkpoint at `last`
    Unchanged { last: Millis },
}

impl RefreshOutcome {
    pub fn created(&self) -> Option<&Checkpoint> {
        match self {
            RefreshOutcome::Created(cp) => Some(cp),
            RefreshOutcome::Unchanged { .. } => None,
        }
    }
}

/// Checkpoint persistence for every file under one log layout
///
/// Checkpoints of a file live in its `concrete-history` directory, one JSON
/// record per checkpoint keyed by the file mtime it was captured at. Records
/// are only ever added.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    layout: LogLayout,
    max_chain_depth: usize,
}

impl CheckpointStore {
    pub fn new(layout: LogLayout) -> Self {
        Self {
            layout,
            max_chain_depth: DEFAULT_MAX_CHAIN_DEPTH,
        }
    }

    pub fn with_max_chain_depth(mut self, depth: usize) -> Self {
        self.max_chain_depth = depth;
        self
    }

    pub fn layout(&self) -> &LogLayout {
        &self.layout
    }

    /// Checkpoint keys recorded for `file`, ascending
    pub fn keys(&self, file: &Path) -> Result<Vec<Millis>> {
        store::list_keys(&self.layout.concrete_dir(file)?)
    }

    /// Load the checkpoint stored under `key`
    pub fn load(&self, file: &Path, key: Millis) -> Result<Option<Checkpoint>> {
        store::read_record(&self.layout.concrete_dir(file)?, key)
    }

    /// The checkpoint with the greatest key, if any
    pub fn last_checkpoint(&self, file: &Path) -> Result<Option<Checkpoint>> {
        let dir = self.layout.concrete_dir(file)?;
        match store::last_key(&dir)? {
            Some(key) => store::read_record(&dir, key),
            None => Ok(None),
        }
    }

    /// All readable checkpoints of `file` in key order
    ///
    /// Malformed records are logged and left out.
    pub fn history(&self, file: &Path) -> Result<Vec<Checkpoint>> {
        store::read_all(&self.layout.concrete_dir(file)?)
    }

    /// Walk reference links from `checkpoint` to the nearest content checkpoint
    pub fn resolve(&self, file: &Path, checkpoint: Checkpoint) -> Result<ResolvedContent> {
        let dir = self.layout.concrete_dir(file)?;
        let start = checkpoint.mtime();
        let mut seen = HashSet::new();
        let mut current = checkpoint;
        let mut hops = 0;

        loop {
            match current {
                Checkpoint::Content { contents, mtime } => {
                    return Ok(ResolvedContent {
                        mtime,
                        contents,
                        hops,
                    });
                }
                Checkpoint::Reference { prev_mtime, mtime } => {
                    if hops >= self.max_chain_depth {
                        return Err(TrackError::ChainTooDeep {
                            dir,
                            start,
                            limit: self.max_chain_depth,
                        });
                    }
                    seen.insert(mtime);
                    if seen.contains(&prev_mtime) {
                        return Err(TrackError::CyclicChain { dir, at: prev_mtime });
                    }

                    current = store::read_record(&dir, prev_mtime)?.ok_or_else(|| {
                        TrackError::DanglingReference {
                            dir: dir.clone(),
                            from: mtime,
                            missing: prev_mtime,
                        }
                    })?;
                    hops += 1;
                }
            }
        }
    }

    /// Record a checkpoint for `file` if it changed since the last one
    ///
    /// - no checkpoint yet: store the current content
    /// - mtime not newer than the last checkpoint: nothing to do
    /// - newer mtime, same bytes as the last content checkpoint: store a
    ///   reference to it
    /// - newer mtime, different bytes: store the new content
    pub fn refresh(&self, file: &Path) -> Result<RefreshOutcome> {
        // Stat before reading: a write racing the read leaves a newer mtime
        // behind for the next refresh to pick up.
        let metadata = fs::metadata(file).at(file)?;
        let mtime = mtime_ms(&metadata).at(file)?;

        let checkpoint = match self.last_checkpoint(file)? {
            None => {
                debug!("First checkpoint for {}", file.display());
                Checkpoint::Content {
                    contents: read_contents(file)?,
                    mtime,
                }
            }
            Some(last) if mtime <= last.mtime() => {
                return Ok(RefreshOutcome::Unchanged { last: last.mtime() });
            }
            Some(last) => {
                let base = self.resolve(file, last)?;
                let contents = read_contents(file)?;
                if contents == base.contents {
                    debug!(
                        "{} touched without changes, referencing {}",
                        file.display(),
                        base.mtime
                    );
                    Checkpoint::Reference {
                        prev_mtime: base.mtime,
                        mtime,
                    }
                } else {
                    debug!("{} changed since {}", file.display(), base.mtime);
                    Checkpoint::Content { contents, mtime }
                }
            }
        };

        store::write_record(&self.layout.concrete_dir(file)?, mtime, &checkpoint)?;
        Ok(RefreshOutcome::Created(checkpoint))
    }
}

fn read_contents(file: &Path) -> Result<String> {
    fs::read_to_string(file).at(file)
}
