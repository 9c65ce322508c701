//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::Router;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;

use telemetry_gateway::config::{GatewayConfig, ServiceConfig, UpstreamScheme};
use telemetry_gateway::{HttpServer, Shutdown};

/// Serve an axum app as a mock upstream on an ephemeral port.
pub async fn spawn_upstream(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// An upstream that accepts connections and never responds.
///
/// The returned flag flips once the peer (the gateway) closes its
/// connection.
#[allow(dead_code)]
pub async fn spawn_silent_upstream() -> (SocketAddr, Arc<AtomicBool>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let peer_closed = Arc::new(AtomicBool::new(false));
    let flag = peer_closed.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let flag = flag.clone();
                    tokio::spawn(async move {
                        let mut buf = [0u8; 1024];
                        loop {
                            match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => {
                                    flag.store(true, Ordering::SeqCst);
                                    break;
                                }
                                Ok(_) => {}
                            }
                        }
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, peer_closed)
}

/// A socket address with nothing listening on it.
#[allow(dead_code)]
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Start a gateway routing the given services, on an ephemeral port.
pub async fn spawn_gateway(
    services: &[(&str, SocketAddr)],
    upstream_secs: u64,
) -> (SocketAddr, Shutdown) {
    let mut config = GatewayConfig::default();
    config.services = services
        .iter()
        .map(|(name, addr)| ServiceConfig {
            name: name.to_string(),
            host: addr.ip().to_string(),
            port: addr.port(),
            scheme: UpstreamScheme::Http,
        })
        .collect();
    config.timeouts.upstream_secs = upstream_secs;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    let server = HttpServer::new(config);
    tokio::spawn(async move {
        let _ = server.run_until(listener, receiver).await;
    });

    (addr, shutdown)
}

/// HTTP client for driving the gateway in tests.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
