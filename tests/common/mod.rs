//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use hook_router::{App, CompiledApp, DispatchRequest, HttpServer, ServerConfig, Shutdown};
use tokio::net::TcpListener;

/// A POST request with a JSON content type and the given raw body.
#[allow(dead_code)]
pub fn json_request(method: Method, path: &str, body: &str) -> DispatchRequest {
    DispatchRequest::new(method, path)
        .header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .body(body.to_string())
}

/// Compile an app, failing the test on conflict.
#[allow(dead_code)]
pub fn compile(app: &App) -> Arc<CompiledApp> {
    Arc::new(app.compile().expect("app should compile"))
}

/// Serve `app` on an ephemeral local port.
#[allow(dead_code)]
pub async fn start_server(app: &App) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut config = ServerConfig::default();
    config.listener.bind_address = addr.to_string();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, compile(app));
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    (addr, shutdown)
}
