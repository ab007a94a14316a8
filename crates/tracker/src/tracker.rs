//! Tracking facade
//!
//! `Tracker` is the entry point editor integrations talk to: bulk refresh on
//! save, edit logging on every change event, and read access to the log.
//! Every operation touching the log goes through the instance's [`Gate`].

use crate::classify::Classifier;
use crate::config::TrackerConfig;
use crate::gate::Gate;
use crate::scan::scan;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use vacuum_core::{
    ChangeEvent, Clock, LogLayout, Millis, PathResolver, Result, SystemClock, TrackError,
};
use vacuum_journal::{
    reconstruct_at, Checkpoint, CheckpointStore, Edit, EditLog, Reconstruction, RefreshOutcome,
    ReplayError,
};

/// Result of refreshing every tracked file under a root
#[derive(Debug, Default)]
pub struct RefreshReport {
    pub root: PathBuf,
    /// Files that received a new checkpoint
    pub created: usize,
    /// Files whose last checkpoint was still current
    pub unchanged: usize,
    /// Files that could not be refreshed; siblings are unaffected
    pub failed: Vec<(PathBuf, TrackError)>,
}

impl RefreshReport {
    pub fn scanned(&self) -> usize {
        self.created + self.unchanged + self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// What happened to a change event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutcome {
    Logged(Edit),
    /// Not a tracked file, or inside an excluded directory
    Ignored,
}

/// Checkpoints and edits of one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileHistory {
    pub checkpoints: Vec<Checkpoint>,
    pub edits: Vec<Edit>,
}

struct Inner {
    config: TrackerConfig,
    resolver: PathResolver,
    classifier: Classifier,
    clock: Arc<dyn Clock>,
}

impl Inner {
    /// Checkpoint store for `root` under its current identity
    fn store_for(&self, root: &Path) -> CheckpointStore {
        let identity = self.config.identity.resolve(root);
        let layout = LogLayout::new(root, &self.config.log_dir, identity.as_ref());
        CheckpointStore::new(layout).with_max_chain_depth(self.config.max_chain_depth)
    }

    fn owning_root(&self, file: &Path) -> Result<PathBuf> {
        self.resolver
            .tracking_root(file)
            .map(Path::to_path_buf)
            .ok_or_else(|| TrackError::OutsideRoot(file.to_path_buf()))
    }

    fn refresh_root(&self, root: &Path) -> Result<RefreshReport> {
        // A subdirectory of a root would own none of its files
        if !self.resolver.roots().iter().any(|r| r == root) {
            return Err(TrackError::OutsideRoot(root.to_path_buf()));
        }
        let store = self.store_for(root);
        let files = scan(root, &self.classifier)?;

        let mut report = RefreshReport {
            root: root.to_path_buf(),
            ..Default::default()
        };
        for file in files {
            // Nested roots keep their own logs
            if let Some(owner) = self.resolver.tracking_root(&file) {
                if owner != root {
                    continue;
                }
            }
            match store.refresh(&file) {
                Ok(RefreshOutcome::Created(cp)) => {
                    debug!("Checkpoint ({}) for {} at {}", cp.kind(), file.display(), cp.mtime());
                    report.created += 1;
                }
                Ok(RefreshOutcome::Unchanged { .. }) => report.unchanged += 1,
                Err(e) => {
                    warn!("Failed to refresh {}: {}", file.display(), e);
                    report.failed.push((file, e));
                }
            }
        }

        info!(
            "Refreshed {}: {} created, {} unchanged, {} failed",
            root.display(),
            report.created,
            report.unchanged,
            report.failed.len()
        );
        Ok(report)
    }
}

/// Tracking engine over a fixed set of roots
///
/// Cheap to clone; clones share the configuration and the gate.
#[derive(Clone)]
pub struct Tracker {
    inner: Arc<Inner>,
    gate: Gate,
}

impl Tracker {
    /// Create a tracker using the wall clock
    ///
    /// Must be called from within a tokio runtime (the gate spawns a task).
    pub fn new(roots: impl IntoIterator<Item = PathBuf>, config: TrackerConfig) -> Self {
        Self::with_clock(roots, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        roots: impl IntoIterator<Item = PathBuf>,
        config: TrackerConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let classifier = Classifier::from_config(&config);
        Self {
            inner: Arc::new(Inner {
                resolver: PathResolver::new(roots),
                classifier,
                config,
                clock,
            }),
            gate: Gate::new(),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        self.inner.resolver.roots()
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.inner.resolver
    }

    pub fn classifier(&self) -> &Classifier {
        &self.inner.classifier
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.inner.config
    }

    /// Refresh the checkpoint of every tracked file under `root`
    ///
    /// Runs as a single gated operation. Queued when called.
    pub fn refresh_all(&self, root: &Path) -> impl Future<Output = Result<RefreshReport>> + Send + 'static {
        let root = root.to_path_buf();
        let inner = self.inner.clone();
        self.gate.run(move || inner.refresh_root(&root))
    }

    /// Log one change event as an edit
    ///
    /// The event time defaults to the tracker's clock at call time. Files
    /// outside every root are an error; files the classifier rejects are
    /// [`LogOutcome::Ignored`] and nothing is written.
    pub fn log_edit(&self, event: ChangeEvent) -> impl Future<Output = Result<LogOutcome>> + Send + 'static {
        let queued = self.queue_edit(event);
        async move {
            match queued? {
                Some(pending) => pending.await.map(LogOutcome::Logged),
                None => Ok(LogOutcome::Ignored),
            }
        }
    }

    fn queue_edit(
        &self,
        event: ChangeEvent,
    ) -> Result<Option<impl Future<Output = Result<Edit>> + Send + 'static>> {
        let root = self.inner.owning_root(&event.file)?;
        let classifier = &self.inner.classifier;
        if !classifier.is_tracked_file(&event.file) || classifier.is_excluded_path(&root, &event.file) {
            debug!("Ignoring change to untracked {}", event.file.display());
            return Ok(None);
        }

        let logged_at = event.time.unwrap_or_else(|| self.inner.clock.now_ms());
        let inner = self.inner.clone();
        Ok(Some(self.gate.run(move || {
            let store = inner.store_for(&root);
            EditLog::new(&store).append(&event.file, event.changes, logged_at)
        })))
    }

    /// Resolves once every operation queued before this call has finished
    pub fn flush(&self) -> impl Future<Output = Result<()>> + Send + 'static {
        self.gate.run(|| Ok::<_, TrackError>(()))
    }

    /// Checkpoints and edits recorded for `file` under the current identity
    pub fn history(&self, file: &Path) -> impl Future<Output = Result<FileHistory>> + Send + 'static {
        let file = file.to_path_buf();
        let inner = self.inner.clone();
        self.gate.run(move || -> Result<FileHistory> {
            let store = inner.store_for(&inner.owning_root(&file)?);
            Ok(FileHistory {
                checkpoints: store.history(&file)?,
                edits: EditLog::new(&store).list(&file)?,
            })
        })
    }

    /// Contents of `file` as of `at`, rebuilt from the log
    pub fn reconstruct(
        &self,
        file: &Path,
        at: Millis,
    ) -> impl Future<Output = std::result::Result<Option<Reconstruction>, ReplayError>> + Send + 'static {
        let file = file.to_path_buf();
        let inner = self.inner.clone();
        self.gate.run(move || -> std::result::Result<_, ReplayError> {
            let store = inner.store_for(&inner.owning_root(&file)?);
            reconstruct_at(&store, &file, at)
        })
    }
}
