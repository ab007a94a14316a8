//! Checkpoint store and edit log
//!
//! This crate provides:
//! - Checkpoint records (full content or reference to identical content)
//! - The per-file checkpoint store with mtime/content dedup
//! - The append-only edit log anchored to checkpoints
//! - Replay of edits on top of a checkpoint

pub mod checkpoint;
pub mod edits;
pub mod replay;

// Re-exports
pub use checkpoint::{
    Checkpoint, CheckpointKind, CheckpointStore, RefreshOutcome, ResolvedContent,
    DEFAULT_MAX_CHAIN_DEPTH,
};
pub use edits::{Edit, EditLog};
pub use replay::{reconstruct_at, roll_forward, Reconstruction, ReplayError};
