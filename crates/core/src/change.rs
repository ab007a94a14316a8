//! Text change records as reported by the editor
//!
//! Field names follow the editor protocol (camelCase) so that change events
//! can be forwarded verbatim and edits on disk stay readable by other tools.

use crate::time::Millis;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Zero-based line/character position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub const fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// Half-open range between two positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRange {
    pub start: Position,
    pub end: Position,
}

impl TextRange {
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Empty range at a single position
    pub const fn caret(at: Position) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// One replaced span inside a change event
///
/// `range_offset`/`range_length` locate the replaced span in UTF-16 code
/// units. An empty span with text is an insertion, a non-empty span without
/// text is a deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentChange {
    pub range: TextRange,
    pub text: String,
    pub range_offset: u64,
    pub range_length: u64,
}

impl ContentChange {
    pub fn insertion(at: Position, offset: u64, text: impl Into<String>) -> Self {
        Self {
            range: TextRange::caret(at),
            text: text.into(),
            range_offset: offset,
            range_length: 0,
        }
    }

    pub fn deletion(range: TextRange, offset: u64, length: u64) -> Self {
        Self {
            range,
            text: String::new(),
            range_offset: offset,
            range_length: length,
        }
    }

    pub fn is_insertion(&self) -> bool {
        self.range_length == 0 && !self.text.is_empty()
    }

    pub fn is_deletion(&self) -> bool {
        self.range_length > 0 && self.text.is_empty()
    }

    /// End of the replaced span (exclusive), in UTF-16 code units
    ///
    /// `None` when offset plus length does not fit in a `u64`.
    pub fn range_end(&self) -> Option<u64> {
        self.range_offset.checked_add(self.range_length)
    }
}

/// A file-content-change event handed to the tracker by the editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Absolute path of the changed file
    pub file: PathBuf,
    /// Arrival time; the tracker's clock is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<Millis>,
    /// Ordered sub-changes of this event
    pub changes: Vec<ContentChange>,
}

impl ChangeEvent {
    pub fn new(file: impl Into<PathBuf>, changes: Vec<ContentChange>) -> Self {
        Self {
            file: file.into(),
            time: None,
            changes,
        }
    }

    pub fn at(mut self, time: Millis) -> Self {
        self.time = Some(time);
        self
    }
}
