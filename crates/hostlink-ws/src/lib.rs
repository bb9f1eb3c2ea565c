//! # hostlink WebSocket transport
//!
//! A WebSocket server written against raw TCP sockets.
//!
//! - [`frame`]: frame codec (masking, length headers; 64-bit lengths outbound only)
//! - [`handshake`]: HTTP upgrade and accept-key derivation
//! - [`Connection`]: per-client state machine and read loop
//! - [`WsServer`]: listener, connection set and bounded shutdown
//!
//! Text frames carry JSON requests. Well-formed requests are queued on the
//! server's dispatch queue and answered when the owning context drains it;
//! malformed ones are answered straight from the read loop.
//!
//! ## Usage
//!
//! ```ignore
//! use hostlink_config::Config;
//! use hostlink_dispatch::{ActionRegistry, ActionRouter, TickDriver};
//! use hostlink_ws::WsServer;
//!
//! let registry = ActionRegistry::builder()
//!     .register_action("ping", |_| Ok(serde_json::json!("pong")))?
//!     .build()?;
//! let config = Config::default();
//! let server = WsServer::new(&config, ActionRouter::new(registry));
//! let addr = server.start(config.server.port).await?;
//! let driver = TickDriver::spawn(server.dispatch_queue(), config.dispatch.tick_interval())?;
//! ```

mod connection;
pub mod error;
pub mod frame;
pub mod handshake;
mod server;

pub use connection::{Connection, ConnectionContext, ConnectionSet, ConnectionState};
pub use error::{ConnectionError, FrameError, HandshakeError, ProtocolError, ServerError};
pub use server::WsServer;
