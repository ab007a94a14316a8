//! Vacuum Tracker - keeps checkpoints and edits of a workspace up to date
//!
//! This crate provides:
//! - File classification and workspace scanning
//! - The serialization gate ordering all log operations
//! - The `Tracker` facade (bulk refresh, edit logging, history, replay)
//! - Debounced refresh scheduling and filesystem save notifications

pub mod classify;
pub mod config;
pub mod debounce;
pub mod gate;
pub mod scan;
pub mod tracker;
pub mod watch;

pub use classify::Classifier;
pub use config::{ClassifierConfig, ConfigError, TrackerConfig};
pub use debounce::CheckpointScheduler;
pub use gate::Gate;
pub use scan::scan;
pub use tracker::{FileHistory, LogOutcome, RefreshReport, Tracker};
pub use watch::{SaveEvent, SaveWatcher, WatchError};
