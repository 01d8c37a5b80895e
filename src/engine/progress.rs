// Byte-level upload progress: plain event values and the per-transport counter behind them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Progress of one transport's request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub loaded: u64,
    /// Total body size, 0 when unknown.
    pub total: u64,
}

impl ProgressEvent {
    pub fn new(loaded: u64, total: u64) -> Self {
        Self { loaded, total }
    }

    pub fn length_computable(&self) -> bool {
        self.total > 0
    }

    /// Rounded completion percentage in `0..=100`. An unknown total reports 0,
    /// so 100 is only reached once the real total is known and matched.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let pct = (self.loaded as f64 / self.total as f64 * 100.0).round();
        pct.clamp(0.0, 100.0) as u8
    }
}

/// Receives progress events from an uploader.
pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Monotonic byte counter for a single body stream.
pub struct ByteCounter {
    loaded: AtomicU64,
    total: u64,
}

impl ByteCounter {
    pub fn new(total: u64) -> Self {
        Self {
            loaded: AtomicU64::new(0),
            total,
        }
    }

    /// Record `bytes` more as sent and return the resulting event.
    pub fn advance(&self, bytes: u64) -> ProgressEvent {
        let loaded = self.loaded.fetch_add(bytes, Ordering::Relaxed) + bytes;
        ProgressEvent::new(loaded, self.total)
    }

    pub fn loaded(&self) -> u64 {
        self.loaded.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u64 {
        self.total
    }
}
