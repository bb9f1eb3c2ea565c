use super::*;
use hostlink_dispatch::ActionRegistry;
use hostlink_protocols::Params;
use serde_json::Value;
use std::time::Instant;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

fn server() -> WsServer {
    let registry = ActionRegistry::builder()
        .register_action("echo", |params: &Params| Ok(Value::Object(params.clone())))
        .unwrap()
        .build()
        .unwrap();
    WsServer::new(&Config::default(), ActionRouter::new(registry))
}

#[tokio::test]
async fn test_new_server_is_stopped() {
    let server = server();
    assert!(!server.is_running().await);
    assert!(server.local_addr().await.is_none());
    assert_eq!(server.connection_count(), 0);
    assert_eq!(server.drain_dispatch_queue(), 0);
}

#[tokio::test]
async fn test_start_is_idempotent() {
    let server = server();
    let first = server.start(0).await.unwrap();
    let second = server.start(0).await.unwrap();
    assert_eq!(first, second);
    assert!(server.is_running().await);
    server.stop().await;
}

#[tokio::test]
async fn test_stop_then_restart() {
    let server = server();
    server.start(0).await.unwrap();
    server.stop().await;
    assert!(!server.is_running().await);

    server.stop().await;

    let addr = server.start(0).await.unwrap();
    assert_eq!(server.local_addr().await, Some(addr));
    server.stop().await;
}

#[tokio::test]
async fn test_stop_closes_listener() {
    let server = server();
    let addr = server.start(0).await.unwrap();
    server.stop().await;
    assert!(tokio::net::TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn test_invalid_host() {
    let mut config = Config::default();
    config.server.host = "hostlink.invalid".to_string();
    let registry = ActionRegistry::builder().build().unwrap();
    let server = WsServer::new(&config, ActionRouter::new(registry));

    let err = server.start(0).await.unwrap_err();
    assert!(matches!(err, ServerError::InvalidAddress(_)));
}

#[tokio::test]
async fn test_bind_conflict() {
    let first = server();
    let addr = first.start(0).await.unwrap();

    let second = server();
    let err = second.start(addr.port()).await.unwrap_err();
    assert!(matches!(err, ServerError::Bind { .. }));
    first.stop().await;
}

#[tokio::test]
async fn test_queue_shares_router_metrics() {
    let server = server();
    server.dispatch_queue().enqueue(|| {}).unwrap();
    assert_eq!(server.router().metrics().snapshot().enqueued, 1);
    assert_eq!(server.drain_dispatch_queue(), 1);
}

#[tokio::test]
async fn test_start_resolves_host_name() {
    let mut config = Config::default();
    config.server.host = "localhost".to_string();
    let registry = ActionRegistry::builder().build().unwrap();
    let server = WsServer::new(&config, ActionRouter::new(registry));

    let addr = server.start(0).await.unwrap();
    assert!(addr.ip().is_loopback());
    assert!(TcpStream::connect(addr).await.is_ok());
    server.stop().await;
}

async fn upgraded_client(addr: SocketAddr) -> TcpStream {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(
            b"GET / HTTP/1.1\r\n\
              Host: localhost\r\n\
              Upgrade: websocket\r\n\
              Connection: Upgrade\r\n\
              Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
              Sec-WebSocket-Version: 13\r\n\r\n",
        )
        .await
        .unwrap();

    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        stream.read_exact(&mut byte).await.unwrap();
        head.push(byte[0]);
    }
    assert!(head.starts_with(b"HTTP/1.1 101"));
    stream
}

#[tokio::test]
async fn test_stop_aborts_reader_stuck_flushing() {
    let mut config = Config::default();
    config.shutdown.join_timeout_ms = 200;
    let registry = ActionRegistry::builder().build().unwrap();
    let server = WsServer::new(&config, ActionRouter::new(registry));
    let addr = server.start(0).await.unwrap();

    // The client never reads, so the writer blocks once the socket buffers fill.
    let _client = upgraded_client(addr).await;
    let conn = loop {
        let established = server
            .connections
            .iter()
            .map(|entry| entry.value().clone())
            .find(|conn| conn.is_open());
        if let Some(conn) = established {
            break conn;
        }
        tokio::task::yield_now().await;
    };
    let chunk = "x".repeat(1 << 20);
    for _ in 0..64 {
        conn.send_text(&chunk).unwrap();
    }
    tokio::time::sleep(Duration::from_millis(50)).await;

    let started = Instant::now();
    tokio::time::timeout(Duration::from_secs(5), server.stop())
        .await
        .expect("stop returned after aborting the stuck reader");
    assert!(started.elapsed() >= Duration::from_millis(200));
    assert!(!server.is_running().await);
    assert_eq!(server.connection_count(), 0);
}
