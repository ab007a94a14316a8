//! Replaying logged edits on top of a checkpoint
//!
//! Offsets in change events count UTF-16 code units, so text is worked on as
//! a `Vec<u16>` and converted back once all edits are applied.

use crate::checkpoint::CheckpointStore;
use crate::edits::{Edit, EditLog};
use std::path::Path;
use thiserror::Error;
use tracing::debug;
use vacuum_core::{ContentChange, Millis, TrackError};

#[derive(Debug, Error)]
pub enum ReplayError {
    /// A change reaches past the end of the text it applies to
    #[error("edit {edit} replaces {offset}..{end} but text is only {len} units long")]
    OutOfBounds {
        edit: Millis,
        offset: u64,
        end: u64,
        len: usize,
    },

    /// Two changes of one edit replace overlapping spans
    #[error("edit {edit} has overlapping changes at offset {offset}")]
    Overlapping { edit: Millis, offset: u64 },

    /// The result splits a surrogate pair
    #[error("edit {edit} leaves invalid UTF-16 behind")]
    InvalidText { edit: Millis },

    #[error(transparent)]
    Track(#[from] TrackError),
}

/// Contents of a file reconstructed from history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconstruction {
    /// Key of the checkpoint the edits were replayed on
    pub base: Millis,
    /// Number of edits applied
    pub applied: usize,
    pub contents: String,
}

/// Apply `edits` in order to `base`
pub fn roll_forward(base: &str, edits: &[Edit]) -> Result<String, ReplayError> {
    let mut units: Vec<u16> = base.encode_utf16().collect();
    for edit in edits {
        apply_edit(&mut units, edit)?;
        // Check per edit so the error names the culprit
        if char::decode_utf16(units.iter().copied()).any(|c| c.is_err()) {
            return Err(ReplayError::InvalidText { edit: edit.time });
        }
    }
    String::from_utf16(&units).map_err(|_| ReplayError::InvalidText {
        edit: edits.last().map(|e| e.time).unwrap_or_default(),
    })
}

fn apply_edit(units: &mut Vec<u16>, edit: &Edit) -> Result<(), ReplayError> {
    // All changes of one event are relative to the text before the event;
    // applying back to front keeps earlier offsets valid.
    let mut changes: Vec<&ContentChange> = edit.changes.iter().collect();
    changes.sort_by(|a, b| b.range_offset.cmp(&a.range_offset));

    let mut floor: Option<u64> = None;
    for change in changes {
        let out_of_bounds = |end: u64| ReplayError::OutOfBounds {
            edit: edit.time,
            offset: change.range_offset,
            end,
            len: units.len(),
        };
        let end = change.range_end().ok_or_else(|| out_of_bounds(u64::MAX))?;
        if let Some(next_start) = floor {
            if end > next_start {
                return Err(ReplayError::Overlapping {
                    edit: edit.time,
                    offset: change.range_offset,
                });
            }
        }
        if end > units.len() as u64 {
            return Err(out_of_bounds(end));
        }

        let start = change.range_offset as usize;
        units.splice(start..end as usize, change.text.encode_utf16());
        floor = Some(change.range_offset);
    }
    Ok(())
}

/// Rebuild `file` as it was in the editor at time `at`
///
/// Normally this is the latest checkpoint with key `<= at` plus the edits
/// anchored to it. Checkpoint keys are file mtimes, so a refresh that runs
/// late can store a checkpoint older than edits already logged against the
/// previous one. When the latest edit `<= at` is newer than every checkpoint
/// `<= at`, its own base is replayed instead.
///
/// Only the records in the replay window are read. Returns `None` when no
/// checkpoint that old exists.
pub fn reconstruct_at(
    checkpoints: &CheckpointStore,
    file: &Path,
    at: Millis,
) -> Result<Option<Reconstruction>, ReplayError> {
    let log = EditLog::new(checkpoints);
    let edit_keys: Vec<Millis> = log.keys(file)?.into_iter().filter(|k| *k <= at).collect();
    let latest_checkpoint = checkpoints.keys(file)?.into_iter().rev().find(|k| *k <= at);

    let latest_edit = match edit_keys.last() {
        Some(&key) => log.load(file, key)?,
        None => None,
    };
    let base_key = match (latest_checkpoint, &latest_edit) {
        (Some(cp), Some(edit)) if cp <= edit.time => edit.base_time,
        (None, Some(edit)) => edit.base_time,
        (Some(cp), _) => cp,
        (None, None) => return Ok(None),
    };

    let Some(checkpoint) = checkpoints.load(file, base_key)? else {
        return Err(TrackError::MissingBase(file.to_path_buf()).into());
    };
    let base = checkpoints.resolve(file, checkpoint)?;

    // Edits anchored to `base_key` were logged once it existed
    let mut edits = Vec::new();
    for key in edit_keys.into_iter().filter(|k| *k >= base_key) {
        if let Some(edit) = log.load(file, key)? {
            if edit.base_time == base_key {
                edits.push(edit);
            }
        }
    }
    debug!(
        "Replaying {} edits on checkpoint {} of {}",
        edits.len(),
        base_key,
        file.display()
    );

    let contents = roll_forward(&base.contents, &edits)?;
    Ok(Some(Reconstruction {
        base: base_key,
        applied: edits.len(),
        contents,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vacuum_core::{Position, TextRange};

    fn edit(time: Millis, changes: Vec<ContentChange>) -> Edit {
        Edit {
            file: "/work/a.lean".into(),
            time,
            base_time: 0,
            changes,
        }
    }

    fn replace(offset: u64, length: u64, text: &str) -> ContentChange {
        ContentChange {
            range: TextRange::caret(Position::new(0, offset as u32)),
            text: text.into(),
            range_offset: offset,
            range_length: length,
        }
    }

    #[test]
    fn test_sequential_edits() {
        let edits = vec![
            edit(1, vec![replace(7, 0, " foo")]),
            edit(2, vec![replace(0, 7, "lemma")]),
        ];
        assert_eq!(roll_forward("theorem", &edits).unwrap(), "lemma foo");
    }

    #[test]
    fn test_multi_change_event_uses_original_offsets() {
        // Both offsets refer to "abcdef"
        let edits = vec![edit(1, vec![replace(1, 1, "XX"), replace(4, 2, "")])];
        assert_eq!(roll_forward("abcdef", &edits).unwrap(), "aXXcd");
    }

    #[test]
    fn test_utf16_offsets() {
        // "∀" is one UTF-16 unit, "𝔽" is two
        let edits = vec![edit(1, vec![replace(3, 0, "!")])];
        assert_eq!(roll_forward("∀𝔽x", &edits).unwrap(), "∀𝔽!x");
    }

    #[test]
    fn test_out_of_bounds() {
        let edits = vec![edit(9, vec![replace(2, 5, "")])];
        let err = roll_forward("abc", &edits).unwrap_err();
        assert!(matches!(err, ReplayError::OutOfBounds { edit: 9, len: 3, .. }));
    }

    #[test]
    fn test_overlapping_changes() {
        let edits = vec![edit(4, vec![replace(0, 3, "x"), replace(2, 1, "y")])];
        let err = roll_forward("abcdef", &edits).unwrap_err();
        assert!(matches!(err, ReplayError::Overlapping { edit: 4, .. }));
    }

    #[test]
    fn test_split_surrogate() {
        let edits = vec![edit(5, vec![replace(1, 0, "a")])];
        let err = roll_forward("𝔽", &edits).unwrap_err();
        assert!(matches!(err, ReplayError::InvalidText { edit: 5 }));
    }

    #[test]
    fn test_offset_overflow_is_out_of_bounds() {
        let edits = vec![edit(3, vec![replace(u64::MAX, 1, "x")])];
        let err = roll_forward("abc", &edits).unwrap_err();
        assert!(matches!(err, ReplayError::OutOfBounds { edit: 3, offset: u64::MAX, .. }));
    }

    #[test]
    fn test_no_edits_is_identity() {
        assert_eq!(roll_forward("theorem", &[]).unwrap(), "theorem");
    }
}
