//! Serialization gate
//!
//! Checkpoint and edit operations read-modify-write the same log tree, so
//! they must not interleave. The gate runs them strictly one at a time, in
//! the order `run` was called:
//!
//! ```text
//! run(a) ─┐
//! run(b) ─┼─► unbounded queue ─► worker task ─► spawn_blocking(job) ─► oneshot ─► caller
//! run(c) ─┘                      (one job at a time)
//! ```
//!
//! Jobs are plain synchronous closures; they execute on tokio's blocking pool
//! so file I/O never stalls the async workers.

use std::future::Future;
use tokio::sync::{mpsc, oneshot};
use tracing::{trace, warn};
use vacuum_core::TrackError;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// FIFO executor for tracking operations
///
/// Cloning shares the same queue and worker. The worker exits once every
/// handle is dropped and the queue is drained.
#[derive(Debug, Clone)]
pub struct Gate {
    tx: mpsc::UnboundedSender<Job>,
}

impl Gate {
    /// Create a gate and spawn its worker
    ///
    /// Must be called from within a tokio runtime.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(worker(rx));
        Self { tx }
    }

    /// Queue `op` behind every previously queued operation
    ///
    /// The operation is enqueued before this returns, so queue order is
    /// call order no matter when the returned future is first polled.
    /// Dropping the future does not cancel the operation. If `op` panics the
    /// caller sees [`TrackError::GateAborted`] and later operations still run.
    pub fn run<T, E, F>(&self, op: F) -> impl Future<Output = Result<T, E>> + Send + 'static
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<TrackError> + Send + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel();
        let job: Job = Box::new(move || {
            // The caller may have gone away; the work still counts
            let _ = done_tx.send(op());
        });
        let queued = self.tx.send(job).is_ok();

        async move {
            if !queued {
                return Err(TrackError::GateClosed.into());
            }
            match done_rx.await {
                Ok(result) => result,
                Err(_) => Err(TrackError::GateAborted.into()),
            }
        }
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}

async fn worker(mut rx: mpsc::UnboundedReceiver<Job>) {
    while let Some(job) = rx.recv().await {
        if let Err(e) = tokio::task::spawn_blocking(job).await {
            if e.is_panic() {
                warn!("Gated operation panicked; continuing with the next one");
            } else {
                warn!("Gated operation did not complete: {}", e);
            }
        }
    }
    trace!("Gate worker exiting");
}
