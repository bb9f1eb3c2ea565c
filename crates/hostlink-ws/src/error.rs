//! Transport error types.

use std::net::SocketAddr;

use thiserror::Error;

/// The upgrade request could not be accepted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandshakeError {
    #[error("Request is not a WebSocket upgrade")]
    NotAnUpgrade,

    #[error("Missing Sec-WebSocket-Key header")]
    MissingKey,

    #[error("Upgrade request is not valid UTF-8")]
    InvalidEncoding,

    #[error("Upgrade request exceeds {limit} bytes")]
    TooLarge { limit: usize },
}

/// Frame bytes that cannot be decoded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("64-bit payload lengths are not supported")]
    UnsupportedPayloadLength,

    #[error("Fragmented messages are not supported")]
    Fragmented,
}

/// Malformed handshake or frame; always terminal for the connection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Handshake failed: {0}")]
    Handshake(#[from] HandshakeError),

    #[error("Invalid frame: {0}")]
    Frame(#[from] FrameError),
}

/// Reason a connection's read loop ended abnormally.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl From<HandshakeError> for ConnectionError {
    fn from(err: HandshakeError) -> Self {
        Self::Protocol(err.into())
    }
}

impl From<FrameError> for ConnectionError {
    fn from(err: FrameError) -> Self {
        Self::Protocol(err.into())
    }
}

/// Server lifecycle errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid listen address: {0}")]
    InvalidAddress(String),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),
}
