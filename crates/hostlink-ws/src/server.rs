//! Listener, connection tracking and shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use hostlink_config::Config;
use hostlink_dispatch::{ActionRouter, DispatchQueue};

use crate::connection::{self, ConnectionContext, ConnectionSet};
use crate::error::ServerError;

/// State that exists only while the server is listening.
struct Running {
    local_addr: SocketAddr,
    cancel: CancellationToken,
    accept_task: JoinHandle<()>,
}

/// WebSocket server.
///
/// Requests from every connection land on one [`DispatchQueue`]. The host
/// drains it from its owning context, either directly through
/// [`drain_dispatch_queue`](Self::drain_dispatch_queue) or by handing
/// [`dispatch_queue`](Self::dispatch_queue) to a
/// [`TickDriver`](hostlink_dispatch::TickDriver).
pub struct WsServer {
    host: String,
    join_timeout: Duration,
    ctx: ConnectionContext,
    connections: Arc<ConnectionSet>,
    running: Mutex<Option<Running>>,
}

impl WsServer {
    /// Create a stopped server.
    pub fn new(config: &Config, router: ActionRouter) -> Self {
        let queue = Arc::new(DispatchQueue::from_config(
            &config.dispatch,
            router.metrics().clone(),
        ));
        Self {
            host: config.server.host.clone(),
            join_timeout: config.shutdown.join_timeout(),
            ctx: ConnectionContext {
                router,
                queue,
                settings: config.connection.clone(),
            },
            connections: Arc::new(ConnectionSet::new()),
            running: Mutex::new(None),
        }
    }

    /// Start listening on `port`. Port 0 picks an ephemeral port.
    ///
    /// `server.host` may be an IP literal or a name such as `localhost`;
    /// names bind to the first address they resolve to.
    ///
    /// Calling `start` while already running returns the current address.
    pub async fn start(&self, port: u16) -> Result<SocketAddr, ServerError> {
        let mut running = self.running.lock().await;
        if let Some(current) = running.as_ref() {
            debug!(addr = %current.local_addr, "Server already running");
            return Ok(current.local_addr);
        }

        let addr = resolve(&self.host, port).await?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;

        let cancel = CancellationToken::new();
        let accept_task = tokio::spawn(accept_loop(
            listener,
            self.ctx.clone(),
            self.connections.clone(),
            cancel.clone(),
            self.join_timeout,
        ));

        info!(addr = %local_addr, "WebSocket server listening");
        *running = Some(Running {
            local_addr,
            cancel,
            accept_task,
        });
        Ok(local_addr)
    }

    /// Stop listening and close every connection.
    ///
    /// Reader tasks get `shutdown.join_timeout` to exit after cancellation,
    /// then any stragglers are aborted. A no-op when not running.
    pub async fn stop(&self) {
        let Some(running) = self.running.lock().await.take() else {
            return;
        };

        info!(addr = %running.local_addr, "Stopping WebSocket server");
        running.cancel.cancel();
        if let Err(e) = running.accept_task.await {
            error!("Accept task failed: {}", e);
        }

        for entry in self.connections.iter() {
            entry.value().close();
        }
        self.connections.clear();
        info!("WebSocket server stopped");
    }

    /// Whether the listener is open.
    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    /// Bound address while running.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.running.lock().await.as_ref().map(|r| r.local_addr)
    }

    /// Number of open connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Run every queued request. Call only from the owning context.
    pub fn drain_dispatch_queue(&self) -> usize {
        self.ctx.queue.drain()
    }

    /// Queue shared by every connection.
    pub fn dispatch_queue(&self) -> Arc<DispatchQueue> {
        self.ctx.queue.clone()
    }

    pub fn router(&self) -> &ActionRouter {
        &self.ctx.router
    }
}

/// Resolve `host` to the address to bind.
async fn resolve(host: &str, port: u16) -> Result<SocketAddr, ServerError> {
    let mut addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(|_| ServerError::InvalidAddress(host.to_string()))?;
    addrs
        .next()
        .ok_or_else(|| ServerError::InvalidAddress(host.to_string()))
}

async fn accept_loop(
    listener: TcpListener,
    ctx: ConnectionContext,
    connections: Arc<ConnectionSet>,
    cancel: CancellationToken,
    join_timeout: Duration,
) {
    let mut readers = JoinSet::new();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    readers.spawn(connection::serve(
                        stream,
                        peer,
                        ctx.clone(),
                        connections.clone(),
                        cancel.child_token(),
                    ));
                }
                Err(e) => {
                    warn!("Accept failed: {}", e);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
            },
            Some(joined) = readers.join_next(), if !readers.is_empty() => {
                if let Err(e) = joined {
                    error!("Connection task failed: {}", e);
                }
            }
        }
    }
    drop(listener);

    let pending = readers.len();
    let joined = tokio::time::timeout(join_timeout, async {
        while readers.join_next().await.is_some() {}
    })
    .await;
    if joined.is_err() {
        warn!(
            pending,
            remaining = readers.len(),
            "Reader tasks did not stop in time, aborting"
        );
        readers.shutdown().await;
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
