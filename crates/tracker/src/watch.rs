//! Save notifications from the filesystem
//!
//! Wraps the platform watcher from `notify` and reports writes to tracked
//! files as [`SaveEvent`]s on a tokio channel.

use crate::classify::Classifier;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};
use vacuum_core::PathResolver;

/// A tracked file was written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveEvent {
    /// Innermost tracked root containing `file`
    pub root: PathBuf,
    pub file: PathBuf,
}

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to create filesystem watcher: {0}")]
    Init(#[source] notify::Error),

    #[error("failed to watch {}: {source}", path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// Recursive watcher over every outermost root
pub struct SaveWatcher {
    // Dropping the watcher stops event delivery
    _watcher: RecommendedWatcher,
    rx: mpsc::UnboundedReceiver<SaveEvent>,
}

impl SaveWatcher {
    pub fn start(resolver: PathResolver, classifier: Classifier) -> Result<Self, WatchError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let roots: Vec<PathBuf> = resolver.outermost_roots().into_iter().map(PathBuf::from).collect();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for save in route(&resolver, &classifier, &event) {
                    trace!("Save detected: {}", save.file.display());
                    if tx.send(save).is_err() {
                        // Receiver gone; the watcher is being torn down
                        return;
                    }
                }
            }
            Err(e) => warn!("Filesystem watcher error: {}", e),
        })
        .map_err(WatchError::Init)?;

        for root in roots {
            watcher
                .watch(&root, RecursiveMode::Recursive)
                .map_err(|source| WatchError::Watch {
                    path: root.clone(),
                    source,
                })?;
            debug!("Watching {}", root.display());
        }

        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    /// Next save, or `None` once the watcher has shut down
    pub async fn next(&mut self) -> Option<SaveEvent> {
        self.rx.recv().await
    }
}

/// Saves to tracked files carried by `event`
fn route(resolver: &PathResolver, classifier: &Classifier, event: &Event) -> Vec<SaveEvent> {
    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
        return Vec::new();
    }

    event
        .paths
        .iter()
        .filter_map(|file| {
            let root = resolver.tracking_root(file)?;
            if !classifier.is_tracked_file(file) || classifier.is_excluded_path(root, file) {
                return None;
            }
            Some(SaveEvent {
                root: root.to_path_buf(),
                file: file.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, ModifyKind};

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        let mut event = Event::new(kind);
        for p in paths {
            event = event.add_path(PathBuf::from(p));
        }
        event
    }

    fn resolver() -> PathResolver {
        PathResolver::new(vec![PathBuf::from("/work"), PathBuf::from("/work/lib")])
    }

    #[test]
    fn test_route_tracked_writes() {
        let classifier = Classifier::default();
        let modify = event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            &["/work/a.lean", "/work/lib/B.lean", "/work/notes.txt"],
        );

        let saves = route(&resolver(), &classifier, &modify);
        assert_eq!(
            saves,
            vec![
                SaveEvent {
                    root: PathBuf::from("/work"),
                    file: PathBuf::from("/work/a.lean"),
                },
                SaveEvent {
                    root: PathBuf::from("/work/lib"),
                    file: PathBuf::from("/work/lib/B.lean"),
                },
            ]
        );
    }

    #[test]
    fn test_route_skips_logs_and_excluded_dirs() {
        let classifier = Classifier::default();
        let create = event(
            EventKind::Create(CreateKind::File),
            &[
                "/work/.changes/no-git/a.lean/concrete-history/1",
                "/work/.lake/build/A.lean",
                "/elsewhere/C.lean",
            ],
        );
        assert!(route(&resolver(), &classifier, &create).is_empty());
    }

    #[test]
    fn test_route_ignores_reads() {
        let classifier = Classifier::default();
        let access = event(EventKind::Access(AccessKind::Any), &["/work/a.lean"]);
        assert!(route(&resolver(), &classifier, &access).is_empty());
    }
}
