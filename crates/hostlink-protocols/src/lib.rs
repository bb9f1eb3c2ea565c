//! # hostlink Protocols
//!
//! Shared protocol definitions for the hostlink remote command interface.
//! Contains the wire message types and the handler-facing traits; transports
//! and dispatch live in their own crates.
//!
//! ## Core Types
//!
//! - [`Request`] / [`Response`] - the JSON bodies carried in WebSocket text frames
//! - [`ActionHandler`] - trait implemented by every registered action
//! - [`ToolDefinition`] - discovery metadata for an action
//! - [`ResponseSink`] - write side of a client connection, as seen by the router

pub mod action;
pub mod error;
pub mod message;
pub mod sink;

pub use action::{decode_params, ActionHandler, FnAction, ToolDefinition};
pub use error::{DeliveryError, HandlerError, ParseError};
pub use message::{Outcome, Params, RejectedRequest, Request, Response};
pub use sink::ResponseSink;
