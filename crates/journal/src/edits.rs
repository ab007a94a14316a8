//! Append-only edit log
//!
//! Every change event becomes one `Edit` record in the file's
//! `edits-history` directory, keyed by the time it was logged and anchored
//! to the file's last checkpoint at that moment.

use crate::checkpoint::CheckpointStore;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};
use vacuum_core::error::{Result, TrackError};
use vacuum_core::{store, ContentChange, Millis};

/// One recorded change event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edit {
    /// Absolute path of the edited file
    pub file: String,
    /// When the edit was logged (also its key)
    pub time: Millis,
    /// Key of the checkpoint this edit applies on top of
    pub base_time: Millis,
    pub changes: Vec<ContentChange>,
}

/// Edit persistence, anchored through a checkpoint store
pub struct EditLog<'a> {
    checkpoints: &'a CheckpointStore,
}

impl<'a> EditLog<'a> {
    pub fn new(checkpoints: &'a CheckpointStore) -> Self {
        Self { checkpoints }
    }

    /// Record `changes` to `file` under key `logged_at`
    ///
    /// The edit is anchored to the file's last checkpoint. When there is none
    /// yet the checkpoint store is refreshed first; if that still yields no
    /// checkpoint the edit is rejected rather than given a made-up base.
    ///
    /// Two edits logged in the same millisecond share a key; the later one
    /// replaces the earlier and a warning is logged.
    pub fn append(&self, file: &Path, changes: Vec<ContentChange>, logged_at: Millis) -> Result<Edit> {
        let base = match self.checkpoints.last_checkpoint(file)? {
            Some(cp) => cp,
            None => {
                debug!("No checkpoint for {} yet, refreshing before edit", file.display());
                self.checkpoints.refresh(file)?;
                self.checkpoints
                    .last_checkpoint(file)?
                    .ok_or_else(|| TrackError::MissingBase(file.to_path_buf()))?
            }
        };

        let edit = Edit {
            file: file.to_string_lossy().into_owned(),
            time: logged_at,
            base_time: base.mtime(),
            changes,
        };

        let dir = self.checkpoints.layout().edits_dir(file)?;
        if store::contains(&dir, logged_at) {
            warn!(
                "Edit key {} already used for {}; overwriting earlier edit",
                logged_at,
                file.display()
            );
        }
        store::write_record(&dir, logged_at, &edit)?;
        Ok(edit)
    }

    /// Edit keys recorded for `file`, ascending
    pub fn keys(&self, file: &Path) -> Result<Vec<Millis>> {
        store::list_keys(&self.checkpoints.layout().edits_dir(file)?)
    }

    pub fn load(&self, file: &Path, key: Millis) -> Result<Option<Edit>> {
        store::read_record(&self.checkpoints.layout().edits_dir(file)?, key)
    }

    /// All readable edits of `file` in key order
    ///
    /// Malformed records are logged and left out.
    pub fn list(&self, file: &Path) -> Result<Vec<Edit>> {
        let dir = self.checkpoints.layout().edits_dir(file)?;
        store::read_all(&dir)
    }
}
