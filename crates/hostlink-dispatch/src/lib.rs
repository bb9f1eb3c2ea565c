//! # hostlink Dispatch
//!
//! Marshals requests from network tasks onto a single owning context.
//!
//! - [`DispatchQueue`]: global FIFO, enqueued from any thread, drained by one
//! - [`ActionRegistry`]: immutable name to handler map built at startup
//! - [`ActionRouter`]: runs handlers and writes one correlated response per request
//! - [`TickDriver`]: a ready-made owning context for hosts without their own loop
//! - [`DispatchMetrics`]: counters shared by the queue and the router

pub mod error;
pub mod metrics;
pub mod queue;
pub mod registry;
pub mod router;
pub mod tick;

pub use error::{DispatchError, DispatchResult};
pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use queue::{DispatchQueue, PendingWork};
pub use registry::{ActionRegistry, ActionRegistryBuilder, LIST_ACTIONS};
pub use router::ActionRouter;
pub use tick::TickDriver;
