//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use gatewarden::auth::{Authenticator, MemoryUserStore};
use gatewarden::config::{GatewayConfig, RouteEntry, RouteInfoConfig};
use gatewarden::GatewayServer;

/// Start a mock backend that returns a fixed body and counts its calls.
pub async fn start_counting_backend(
    addr: SocketAddr,
    body: &'static str,
) -> Arc<AtomicU32> {
    let listener = TcpListener::bind(addr).await.unwrap();
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(async move {
                        let mut buf = [0u8; 4096];
                        let _ = socket.read(&mut buf).await;
                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    calls
}

/// Start a mock backend that echoes the received request head (request
/// line plus headers) back as the response body, so tests can assert on
/// what the gateway actually forwarded.
#[allow(dead_code)]
pub async fn start_echo_backend(addr: SocketAddr) {
    let listener = TcpListener::bind(addr).await.unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut head = Vec::new();
                        let mut buf = [0u8; 1024];
                        loop {
                            match socket.read(&mut buf).await {
                                Ok(0) => break,
                                Ok(n) => {
                                    head.extend_from_slice(&buf[..n]);
                                    if head.windows(4).any(|w| w == b"\r\n\r\n") {
                                        break;
                                    }
                                }
                                Err(_) => break,
                            }
                        }
                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                            head.len()
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.write_all(&head).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });
}

/// Build a route entry for the given template and backends.
pub fn route_entry(path: &str, backends: &[&str]) -> RouteEntry {
    RouteEntry {
        route_info: RouteInfoConfig {
            path: Some(path.to_string()),
            backends: backends.iter().map(ToString::to_string).collect(),
            remove_prefix: false,
        },
        ..Default::default()
    }
}

/// Spin up a gateway on `addr` with an in-memory user store. Returns the
/// authenticator handle, which shares state with the running server.
pub async fn start_gateway(addr: SocketAddr, entries: Vec<RouteEntry>) -> Arc<Authenticator> {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = addr.to_string();

    let store = Arc::new(MemoryUserStore::new());
    let authenticator = Arc::new(Authenticator::new(store, &config.auth));

    let listener = TcpListener::bind(addr).await.unwrap();
    let server = GatewayServer::new(config, authenticator.clone(), &entries);
    tokio::spawn(async move {
        server.run(listener).await.unwrap();
    });

    authenticator
}
