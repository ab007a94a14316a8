//! Vacuum Core - shared primitives for the checkpoint/edit tracking engine
//!
//! This crate provides:
//! - Record types (checkpoints, edits, content changes)
//! - Millisecond timestamps and clocks
//! - Path resolution and on-disk log layout
//! - Identity namespaces (source-control state)
//! - Atomic JSON record storage

pub mod change;
pub mod error;
pub mod identity;
pub mod paths;
pub mod store;
pub mod time;

// Re-export main types for convenience
pub use change::{ChangeEvent, ContentChange, Position, TextRange};
pub use error::{Result, TrackError};
pub use identity::{GitIdentity, Identity, IdentitySource};
pub use paths::{LogLayout, PathResolver, CONCRETE_DIR_NAME, DEFAULT_LOG_DIR_NAME, EDITS_DIR_NAME};
pub use time::{Clock, ManualClock, Millis, SystemClock};
