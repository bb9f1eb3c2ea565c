//! Connection lifecycle and read loop.

use std::net::SocketAddr;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use bytes::{Buf, Bytes, BytesMut};
use dashmap::DashMap;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use hostlink_config::ConnectionConfig;
use hostlink_dispatch::{ActionRouter, DispatchQueue};
use hostlink_protocols::{
    DeliveryError, ParseError, RejectedRequest, Request, Response, ResponseSink,
};

use crate::error::{ConnectionError, HandshakeError};
use crate::frame::{self, Message};
use crate::handshake;

/// Connection state. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum ConnectionState {
    AwaitingHandshake = 0,
    Established = 1,
    Closed = 2,
}

impl From<u8> for ConnectionState {
    fn from(v: u8) -> Self {
        match v {
            0 => ConnectionState::AwaitingHandshake,
            1 => ConnectionState::Established,
            _ => ConnectionState::Closed,
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::AwaitingHandshake => write!(f, "awaiting_handshake"),
            ConnectionState::Established => write!(f, "established"),
            ConnectionState::Closed => write!(f, "closed"),
        }
    }
}

/// One client connection.
///
/// The read loop owns the socket's read half. Writes from any thread go
/// through an unbounded channel to a single writer, so the owning context
/// never blocks on the socket and frames are never interleaved.
///
/// The outbound channel has no limit: a client that stops reading keeps its
/// unsent responses in memory until it disconnects or the server stops.
/// At most one response is queued per request, so the backlog is bounded by
/// what that client itself sent.
pub struct Connection {
    id: String,
    peer: SocketAddr,
    state: AtomicU8,
    outbound: mpsc::UnboundedSender<Bytes>,
    cancel: CancellationToken,
}

impl Connection {
    /// Create a connection in `AwaitingHandshake`.
    pub fn new(
        peer: SocketAddr,
        outbound: mpsc::UnboundedSender<Bytes>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            peer,
            state: AtomicU8::new(ConnectionState::AwaitingHandshake as u8),
            outbound,
            cancel,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from(self.state.load(Ordering::SeqCst))
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Established
    }

    /// Move to `next` if it is ahead of the current state.
    fn advance(&self, next: ConnectionState) -> bool {
        let next = next as u8;
        self.state
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                (current < next).then_some(next)
            })
            .is_ok()
    }

    /// Send one text frame.
    pub fn send_text(&self, text: &str) -> Result<(), DeliveryError> {
        if !self.is_open() {
            return Err(DeliveryError::Closed(self.id.clone()));
        }
        self.write_raw(Bytes::from(frame::encode_text(text)))
    }

    fn write_raw(&self, bytes: Bytes) -> Result<(), DeliveryError> {
        self.outbound
            .send(bytes)
            .map_err(|_| DeliveryError::Closed(self.id.clone()))
    }

    /// Close the connection and stop its tasks.
    pub fn close(&self) {
        if self.advance(ConnectionState::Closed) {
            debug!(conn = %self.id, "Connection closing");
        }
        self.cancel.cancel();
    }
}

impl ResponseSink for Connection {
    fn sink_id(&self) -> &str {
        &self.id
    }

    fn send_response(&self, response: &Response) -> Result<(), DeliveryError> {
        self.send_text(&response.to_json()?)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("peer", &self.peer)
            .field("state", &self.state())
            .finish()
    }
}

/// Everything a read loop needs besides its socket.
#[derive(Clone)]
pub struct ConnectionContext {
    pub router: ActionRouter,
    pub queue: Arc<DispatchQueue>,
    pub settings: ConnectionConfig,
}

/// Active connections keyed by id.
pub type ConnectionSet = DashMap<String, Arc<Connection>>;

/// Serve one accepted socket until it closes, then remove it from `connections`.
pub(crate) async fn serve(
    stream: TcpStream,
    peer: SocketAddr,
    ctx: ConnectionContext,
    connections: Arc<ConnectionSet>,
    cancel: CancellationToken,
) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!(%peer, "Failed to set TCP_NODELAY: {}", e);
    }
    let (reader, writer) = stream.into_split();
    let (tx, rx) = mpsc::unbounded_channel();

    let conn = Arc::new(Connection::new(peer, tx, cancel));
    connections.insert(conn.id().to_string(), conn.clone());
    info!(conn = %conn.id(), %peer, "Connection accepted");

    drive(conn.clone(), reader, writer, rx, &ctx).await;

    connections.remove(conn.id());
    debug!(conn = %conn.id(), remaining = connections.len(), "Connection removed");
}

/// Run the read loop and the writer side by side until both finish.
pub(crate) async fn drive<R, W>(
    conn: Arc<Connection>,
    reader: R,
    writer: W,
    outbound: mpsc::UnboundedReceiver<Bytes>,
    ctx: &ConnectionContext,
) where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let reading = async {
        let result = read_loop(&conn, reader, ctx).await;
        conn.close();
        result
    };
    let writing = write_loop(&conn, writer, outbound);

    let (result, ()) = tokio::join!(reading, writing);
    match result {
        Ok(()) => info!(conn = %conn.id(), peer = %conn.peer_addr(), "Connection closed"),
        Err(ConnectionError::Protocol(e)) => {
            warn!(conn = %conn.id(), peer = %conn.peer_addr(), "Closing connection: {}", e)
        }
        Err(ConnectionError::Transport(e)) => {
            debug!(conn = %conn.id(), peer = %conn.peer_addr(), "Transport error: {}", e)
        }
    }
}

async fn read_loop<R>(
    conn: &Arc<Connection>,
    mut reader: R,
    ctx: &ConnectionContext,
) -> Result<(), ConnectionError>
where
    R: AsyncRead + Unpin,
{
    let chunk = ctx.settings.read_buffer_size;
    let mut buf = BytesMut::with_capacity(chunk);

    loop {
        if buf.capacity() - buf.len() < chunk / 2 {
            buf.reserve(chunk);
        }

        let read = tokio::select! {
            biased;
            _ = conn.cancel.cancelled() => return Ok(()),
            read = reader.read_buf(&mut buf) => read?,
        };
        if read == 0 {
            debug!(conn = %conn.id(), "Peer closed the socket");
            return Ok(());
        }
        trace!(conn = %conn.id(), bytes = read, "Read");

        if conn.state() == ConnectionState::AwaitingHandshake {
            let limit = ctx.settings.max_handshake_bytes;
            let Some(end) = handshake::request_end(&buf) else {
                if buf.len() > limit {
                    return Err(HandshakeError::TooLarge { limit }.into());
                }
                continue;
            };
            if end > limit {
                return Err(HandshakeError::TooLarge { limit }.into());
            }

            let request = buf.split_to(end);
            let response = handshake::negotiate(&request)?;
            if conn.write_raw(Bytes::from(response)).is_err() {
                return Ok(());
            }
            conn.advance(ConnectionState::Established);
            info!(conn = %conn.id(), "Handshake complete");
        }

        if process_frames(conn, &mut buf, ctx)?.is_break() {
            debug!(conn = %conn.id(), "Close frame received");
            return Ok(());
        }
    }
}

/// Decode and handle every complete frame in `buf`.
fn process_frames(
    conn: &Arc<Connection>,
    buf: &mut BytesMut,
    ctx: &ConnectionContext,
) -> Result<ControlFlow<()>, ConnectionError> {
    while let Some((frame, consumed)) = frame::decode(&buf[..])? {
        buf.advance(consumed);
        match frame.into_message()? {
            Message::Text(payload) => handle_text(conn, payload, ctx),
            Message::Close => return Ok(ControlFlow::Break(())),
            Message::Ignored(opcode) => {
                trace!(conn = %conn.id(), ?opcode, "Ignoring frame");
            }
        }
    }
    Ok(ControlFlow::Continue(()))
}

/// Queue a well-formed request, or answer a malformed one right away.
fn handle_text(conn: &Arc<Connection>, payload: Vec<u8>, ctx: &ConnectionContext) {
    let parsed = String::from_utf8(payload)
        .map_err(|_| RejectedRequest::anonymous(ParseError::InvalidUtf8))
        .and_then(|text| Request::parse(&text));

    match parsed {
        Ok(request) => {
            trace!(conn = %conn.id(), id = %request.id, action = %request.action, "Request queued");
            let sink: Arc<dyn ResponseSink> = conn.clone();
            // A full queue has already been reported to the client.
            let _ = ctx.router.submit(&ctx.queue, sink, request);
        }
        Err(rejected) => {
            warn!(conn = %conn.id(), error = %rejected.error, "Rejected request");
            if let Err(e) = conn.send_response(&rejected.into_response()) {
                debug!(conn = %conn.id(), "Rejection not delivered: {}", e);
            }
        }
    }
}

/// Single writer for the socket. On cancellation, flushes what is already
/// queued and shuts the write half down.
async fn write_loop<W>(conn: &Connection, mut writer: W, mut outbound: mpsc::UnboundedReceiver<Bytes>)
where
    W: AsyncWrite + Unpin,
{
    loop {
        tokio::select! {
            biased;
            next = outbound.recv() => match next {
                Some(bytes) => {
                    if let Err(e) = writer.write_all(&bytes).await {
                        debug!(conn = %conn.id(), "Write failed: {}", e);
                        conn.close();
                        return;
                    }
                }
                None => break,
            },
            _ = conn.cancel.cancelled() => break,
        }
    }

    while let Ok(bytes) = outbound.try_recv() {
        if writer.write_all(&bytes).await.is_err() {
            break;
        }
    }
    let _ = writer.shutdown().await;
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;
