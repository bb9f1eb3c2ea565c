//! Write side of a connection as seen by the dispatch layer.

use crate::error::DeliveryError;
use crate::message::Response;

/// Something a response can be written to.
///
/// Implemented by WebSocket connections. Calls come from the owning context
/// while the connection's reader is parked on a socket read, so
/// implementations must hand the bytes to a single writer rather than
/// writing to the socket directly.
pub trait ResponseSink: Send + Sync {
    /// Identifier used in logs.
    fn sink_id(&self) -> &str;

    /// Queue one response for delivery.
    fn send_response(&self, response: &Response) -> Result<(), DeliveryError>;
}
