//! Action routing and response correlation.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use hostlink_protocols::{HandlerError, Request, Response, ResponseSink};
use tracing::{debug, warn};

use crate::error::DispatchResult;
use crate::metrics::DispatchMetrics;
use crate::queue::DispatchQueue;
use crate::registry::ActionRegistry;

/// Routes requests to registered handlers and writes exactly one response
/// per request.
#[derive(Clone)]
pub struct ActionRouter {
    registry: Arc<ActionRegistry>,
    metrics: Arc<DispatchMetrics>,
}

impl ActionRouter {
    /// Create a router over a frozen registry.
    pub fn new(registry: ActionRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            metrics: Arc::new(DispatchMetrics::new()),
        }
    }

    /// Report into the given metrics instead of a private set.
    pub fn with_metrics(mut self, metrics: Arc<DispatchMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }

    /// Run the handler for `request` and build its response.
    ///
    /// Unknown actions, handler errors and handler panics all become error
    /// responses carrying the request id; nothing unwinds past this call.
    pub fn handle(&self, request: &Request) -> Response {
        let Some(handler) = self.registry.get(&request.action) else {
            warn!(id = %request.id, action = %request.action, "Unknown action");
            self.metrics.record_failed();
            return Response::error(
                Some(request.id.clone()),
                format!("Unknown action: {}", request.action),
            );
        };

        let outcome = catch_unwind(AssertUnwindSafe(|| handler.call(&request.params)))
            .unwrap_or_else(|payload| Err(HandlerError::Panicked(panic_message(payload))));

        match outcome {
            Ok(result) => {
                debug!(id = %request.id, action = %request.action, "Action succeeded");
                self.metrics.record_succeeded();
                Response::success(request.id.clone(), result)
            }
            Err(e) => {
                warn!(id = %request.id, action = %request.action, error = %e, "Action failed");
                self.metrics.record_failed();
                Response::error(Some(request.id.clone()), e.to_string())
            }
        }
    }

    /// Handle `request` and write the response to `sink`.
    ///
    /// Must run on the owning context. A write failure means the client is
    /// gone; it is logged and counted, never retried.
    pub fn dispatch(&self, sink: &dyn ResponseSink, request: Request) {
        let response = self.handle(&request);
        if let Err(e) = sink.send_response(&response) {
            self.metrics.record_undelivered();
            warn!(
                sink = %sink.sink_id(),
                id = %request.id,
                error = %e,
                "Failed to deliver response"
            );
        }
    }

    /// Queue `request` for dispatch on the owning context.
    ///
    /// When the queue is full the client is told immediately with an error
    /// response carrying the request id, and the error is returned.
    pub fn submit(
        &self,
        queue: &DispatchQueue,
        sink: Arc<dyn ResponseSink>,
        request: Request,
    ) -> DispatchResult<()> {
        let id = request.id.clone();
        let router = self.clone();
        let work_sink = sink.clone();

        queue
            .enqueue(move || router.dispatch(work_sink.as_ref(), request))
            .inspect_err(|e| {
                warn!(sink = %sink.sink_id(), id = %id, "Request rejected: {}", e);
                self.metrics.record_failed();
                let rejection = Response::error(Some(id.clone()), e.to_string());
                if let Err(delivery) = sink.send_response(&rejection) {
                    self.metrics.record_undelivered();
                    debug!(error = %delivery, "Rejection not delivered");
                }
            })
    }
}

impl std::fmt::Debug for ActionRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRouter")
            .field("registry", &self.registry)
            .finish()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
