//! HTTP upgrade handshake.

use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;
use sha1::{Digest, Sha1};

use crate::error::HandshakeError;

/// Fixed GUID appended to the client key before hashing.
pub const WEBSOCKET_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

const REQUEST_TERMINATOR: &[u8] = b"\r\n\r\n";

static UPGRADE_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^Upgrade:[ \t]*websocket[ \t]*\r?$").expect("valid upgrade pattern")
});

static KEY_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^Sec-WebSocket-Key:[ \t]*(\S+)[ \t]*\r?$").expect("valid key pattern")
});

/// Derive `Sec-WebSocket-Accept` from the client's `Sec-WebSocket-Key`.
pub fn accept_key(client_key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(client_key.as_bytes());
    hasher.update(WEBSOCKET_GUID.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(hasher.finalize())
}

/// Length of the request head in `buf`, including the blank line, once it
/// has fully arrived.
pub fn request_end(buf: &[u8]) -> Option<usize> {
    buf.windows(REQUEST_TERMINATOR.len())
        .position(|w| w == REQUEST_TERMINATOR)
        .map(|pos| pos + REQUEST_TERMINATOR.len())
}

/// Validate an upgrade request and build the `101 Switching Protocols`
/// response to send back.
pub fn negotiate(request: &[u8]) -> Result<String, HandshakeError> {
    let request = std::str::from_utf8(request).map_err(|_| HandshakeError::InvalidEncoding)?;

    if !request.starts_with("GET ") || !UPGRADE_HEADER.is_match(request) {
        return Err(HandshakeError::NotAnUpgrade);
    }

    let key = KEY_HEADER
        .captures(request)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or(HandshakeError::MissingKey)?;

    Ok(switching_protocols(&accept_key(key)))
}

/// The literal `101` response for an accept key.
pub fn switching_protocols(accept: &str) -> String {
    format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {accept}\r\n\r\n"
    )
}
