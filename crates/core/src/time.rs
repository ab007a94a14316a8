//! Millisecond timestamps
//!
//! Checkpoints and edits are keyed on disk by milliseconds since the Unix
//! epoch. Checkpoint keys come from file modification times, edit keys from
//! the wall clock at logging time.

use std::fs::Metadata;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch
pub type Millis = u64;

/// Source of "now" for edit keys
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> Millis;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> Millis {
        system_time_ms(SystemTime::now())
    }
}

/// Clock that only moves when told to
///
/// Used to make edit keys reproducible.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: Millis) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    pub fn set(&self, now: Millis) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move forward and return the new time
    pub fn advance(&self, by: Millis) -> Millis {
        self.now.fetch_add(by, Ordering::SeqCst) + by
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Millis {
        self.now.load(Ordering::SeqCst)
    }
}

/// Convert a `SystemTime` to epoch milliseconds (pre-epoch clamps to 0)
pub fn system_time_ms(t: SystemTime) -> Millis {
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as Millis)
        .unwrap_or(0)
}

/// Modification time of a file in epoch milliseconds
pub fn mtime_ms(metadata: &Metadata) -> std::io::Result<Millis> {
    Ok(system_time_ms(metadata.modified()?))
}
