//! Per-root debouncing of bulk refreshes
//!
//! Saves tend to come in bursts (save-all, formatters, build tools touching
//! files). Each poke restarts the root's timer; only the last poke of a burst
//! actually refreshes.

use crate::tracker::{RefreshReport, Tracker};
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Debounced `refresh_all` per root
#[derive(Clone)]
pub struct CheckpointScheduler {
    tracker: Tracker,
    delay: Duration,
    generations: Arc<DashMap<PathBuf, u64>>,
}

impl CheckpointScheduler {
    pub fn new(tracker: Tracker, delay: Duration) -> Self {
        Self {
            tracker,
            delay,
            generations: Arc::new(DashMap::new()),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// (Re)start the timer for `root`
    ///
    /// The returned task yields the refresh report, or `None` if a later
    /// poke superseded this one (or the refresh failed).
    pub fn poke(&self, root: &Path) -> JoinHandle<Option<RefreshReport>> {
        let generation = {
            let mut entry = self.generations.entry(root.to_path_buf()).or_insert(0);
            *entry += 1;
            *entry
        };

        let root = root.to_path_buf();
        let tracker = self.tracker.clone();
        let generations = self.generations.clone();
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let current = generations.get(&root).map(|g| *g);
            if current != Some(generation) {
                debug!("Refresh of {} superseded by a later save", root.display());
                return None;
            }

            match tracker.refresh_all(&root).await {
                Ok(report) => {
                    if !report.is_clean() {
                        info!("{} files under {} could not be refreshed", report.failed.len(), root.display());
                    }
                    Some(report)
                }
                Err(e) => {
                    warn!("Scheduled refresh of {} failed: {}", root.display(), e);
                    None
                }
            }
        })
    }
}
