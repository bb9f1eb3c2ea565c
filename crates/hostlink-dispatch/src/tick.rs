//! Owning-context driver for hosts without their own loop.
//!
//! The driver owns one named OS thread. Each tick it sleeps until work
//! arrives or the tick interval passes, then drains the queue. Every handler
//! therefore runs on that single thread.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::queue::DispatchQueue;

const THREAD_NAME: &str = "hostlink-owner";

/// Dedicated thread that drains a [`DispatchQueue`].
pub struct TickDriver {
    queue: Arc<DispatchQueue>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl TickDriver {
    /// Spawn the owning-context thread.
    pub fn spawn(queue: Arc<DispatchQueue>, interval: Duration) -> std::io::Result<Self> {
        let cancel = CancellationToken::new();

        let thread_queue = queue.clone();
        let thread_cancel = cancel.clone();
        let handle = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || run_ticks(&thread_queue, &thread_cancel, interval))?;

        info!(interval_ms = interval.as_millis() as u64, "Tick driver started");
        Ok(Self {
            queue,
            cancel,
            handle: Some(handle),
        })
    }

    /// Whether the thread is still alive.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Token that stops the driver when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop the thread and wait for it to exit.
    ///
    /// Work still queued at this point is drained once more before the thread
    /// exits.
    pub fn stop(&mut self) {
        self.cancel.cancel();
        self.queue.wake_all();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Tick driver thread panicked");
            }
            info!("Tick driver stopped");
        }
    }
}

impl Drop for TickDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_ticks(queue: &DispatchQueue, cancel: &CancellationToken, interval: Duration) {
    while !cancel.is_cancelled() {
        queue.wait_for_work(interval);
        if cancel.is_cancelled() {
            break;
        }
        queue.drain();
    }

    let remaining = queue.drain();
    if remaining > 0 {
        debug!(remaining, "Drained remaining work on shutdown");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    fn wait_until(deadline: Duration, check: impl Fn() -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < deadline {
            if check() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        check()
    }

    #[test]
    fn test_work_runs_on_owner_thread() {
        let queue = Arc::new(DispatchQueue::new(16));
        let mut driver = TickDriver::spawn(queue.clone(), Duration::from_millis(5)).unwrap();

        let seen = Arc::new(parking_lot::Mutex::new(None));
        let record = seen.clone();
        queue
            .enqueue(move || {
                *record.lock() = thread::current().name().map(str::to_string);
            })
            .unwrap();

        assert!(wait_until(Duration::from_secs(2), || seen.lock().is_some()));
        assert_eq!(seen.lock().as_deref(), Some(THREAD_NAME));
        driver.stop();
    }

    #[test]
    fn test_stop_joins_thread() {
        let queue = Arc::new(DispatchQueue::new(16));
        let mut driver = TickDriver::spawn(queue, Duration::from_secs(60)).unwrap();
        assert!(driver.is_running());

        let start = Instant::now();
        driver.stop();
        assert!(!driver.is_running());
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_cancellation_token_stops_driver() {
        let queue = Arc::new(DispatchQueue::new(16));
        let driver = TickDriver::spawn(queue.clone(), Duration::from_millis(5)).unwrap();

        driver.cancellation_token().cancel();
        queue.wake_all();
        assert!(wait_until(Duration::from_secs(2), || !driver.is_running()));
    }

    #[test]
    fn test_many_items_all_processed() {
        let queue = Arc::new(DispatchQueue::new(1000));
        let mut driver = TickDriver::spawn(queue.clone(), Duration::from_millis(5)).unwrap();

        let count = Arc::new(AtomicUsize::new(0));
        for _ in 0..200 {
            let count = count.clone();
            queue
                .enqueue(move || {
                    count.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }

        assert!(wait_until(Duration::from_secs(2), || count.load(Ordering::SeqCst) == 200));
        driver.stop();
    }
}
