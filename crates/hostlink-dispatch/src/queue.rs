//! Cross-thread FIFO drained by the owning context.
//!
//! Any number of threads or tasks may [`enqueue`](DispatchQueue::enqueue)
//! work. Exactly one context, the owning context, calls
//! [`drain`](DispatchQueue::drain). A drain runs the items present when it
//! started, in enqueue order. Items enqueued while a drain is running wait for
//! the next call, so a drain never loops until the queue is empty.

use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use hostlink_config::DispatchConfig;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, trace};

use crate::error::{DispatchError, DispatchResult};
use crate::metrics::DispatchMetrics;

/// A unit of work bound for the owning context.
pub type PendingWork = Box<dyn FnOnce() + Send + 'static>;

/// Global FIFO of pending work.
pub struct DispatchQueue {
    items: Mutex<VecDeque<PendingWork>>,
    available: Condvar,
    max_pending: usize,
    metrics: Arc<DispatchMetrics>,
}

impl DispatchQueue {
    /// Create a queue holding at most `max_pending` items.
    pub fn new(max_pending: usize) -> Self {
        Self::with_metrics(max_pending, Arc::new(DispatchMetrics::new()))
    }

    /// Create a queue that reports into shared metrics.
    pub fn with_metrics(max_pending: usize, metrics: Arc<DispatchMetrics>) -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
            max_pending,
            metrics,
        }
    }

    /// Create a queue from the `[dispatch]` section.
    pub fn from_config(config: &DispatchConfig, metrics: Arc<DispatchMetrics>) -> Self {
        Self::with_metrics(config.max_pending, metrics)
    }

    /// Append work to the back of the queue.
    pub fn enqueue<F>(&self, work: F) -> DispatchResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut items = self.items.lock();
        if items.len() >= self.max_pending {
            drop(items);
            self.metrics.record_rejected();
            return Err(DispatchError::QueueFull);
        }
        items.push_back(Box::new(work));
        let pending = items.len();
        drop(items);

        self.metrics.record_enqueued();
        self.available.notify_one();
        trace!(pending, "Work enqueued");
        Ok(())
    }

    /// Run every item present at the moment of the call, in enqueue order.
    ///
    /// Must only be called from the owning context. The lock is released
    /// before any item runs, so items may enqueue further work; that work is
    /// picked up by a later drain. A panicking item is logged and does not
    /// prevent the rest of the batch from running.
    ///
    /// Returns the number of items executed.
    pub fn drain(&self) -> usize {
        let batch = std::mem::take(&mut *self.items.lock());
        if batch.is_empty() {
            return 0;
        }

        let count = batch.len();
        for work in batch {
            if catch_unwind(AssertUnwindSafe(work)).is_err() {
                self.metrics.record_panicked();
                error!("Dispatched work item panicked");
            }
        }

        self.metrics.record_drain(count as u64);
        debug!(count, "Dispatch queue drained");
        count
    }

    /// Block until work is available or `timeout` elapses.
    ///
    /// Returns `true` if the queue is non-empty on return.
    pub fn wait_for_work(&self, timeout: Duration) -> bool {
        let mut items = self.items.lock();
        if items.is_empty() {
            let _ = self.available.wait_for(&mut items, timeout);
        }
        !items.is_empty()
    }

    /// Wake every thread blocked in [`wait_for_work`](Self::wait_for_work).
    pub fn wake_all(&self) {
        self.available.notify_all();
    }

    /// Number of items waiting.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Check if no items are waiting.
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Maximum number of waiting items.
    pub fn capacity(&self) -> usize {
        self.max_pending
    }

    /// Drop every waiting item without running it. Returns how many were dropped.
    pub fn clear(&self) -> usize {
        let dropped = std::mem::take(&mut *self.items.lock());
        dropped.len()
    }

    /// Shared metrics.
    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }
}

impl std::fmt::Debug for DispatchQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchQueue")
            .field("pending", &self.len())
            .field("max_pending", &self.max_pending)
            .finish()
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
