//! Dispatch metrics collection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::Serialize;

/// Counters shared by the queue and the router.
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Work items accepted by the queue.
    pub enqueued: AtomicU64,

    /// Work items refused because the queue was full.
    pub rejected: AtomicU64,

    /// Work items executed by a drain.
    pub processed: AtomicU64,

    /// Work items that panicked outside the router's own guard.
    pub panicked: AtomicU64,

    /// Drain passes that found at least one item.
    pub drains: AtomicU64,

    /// Requests answered with a result.
    pub succeeded: AtomicU64,

    /// Requests answered with an error.
    pub failed: AtomicU64,

    /// Responses that could not be written back.
    pub undelivered: AtomicU64,

    start_time: parking_lot::RwLock<Option<Instant>>,
}

impl DispatchMetrics {
    /// Create new metrics.
    pub fn new() -> Self {
        let metrics = Self::default();
        metrics.mark_start();
        metrics
    }

    /// Reset the uptime origin.
    pub fn mark_start(&self) {
        *self.start_time.write() = Some(Instant::now());
    }

    /// Uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time
            .read()
            .map(|t| t.elapsed().as_secs())
            .unwrap_or(0)
    }

    pub fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one drain pass over `count` items.
    pub fn record_drain(&self, count: u64) {
        self.drains.fetch_add(1, Ordering::Relaxed);
        self.processed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_panicked(&self) {
        self.panicked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_succeeded(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_undelivered(&self) {
        self.undelivered.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of the metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.uptime_secs(),
            enqueued: self.enqueued.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
            drains: self.drains.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            undelivered: self.undelivered.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub enqueued: u64,
    pub rejected: u64,
    pub processed: u64,
    pub panicked: u64,
    pub drains: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub undelivered: u64,
}

impl MetricsSnapshot {
    /// Items accepted but not yet drained.
    pub fn backlog(&self) -> u64 {
        self.enqueued.saturating_sub(self.processed)
    }

    /// Average items handled per drain pass.
    pub fn avg_batch_size(&self) -> f64 {
        if self.drains == 0 {
            return 0.0;
        }
        self.processed as f64 / self.drains as f64
    }

    /// Fraction of answered requests that succeeded.
    pub fn success_rate(&self) -> f64 {
        let answered = self.succeeded + self.failed;
        if answered == 0 {
            return 0.0;
        }
        self.succeeded as f64 / answered as f64
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
