//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router that forwards every request to the dispatcher
//! - Wire up middleware (tracing, limits, request ID, timeout)
//! - Bind server to listener, shut down gracefully
//!
//! # Design Decisions
//! - The axum router has no routes of its own; matching is the dispatcher's job
//! - Bodies are buffered up to `limits.max_body_size` before dispatch

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderName, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::dispatch::{CompiledApp, DispatchRequest, X_REQUEST_ID};

/// State injected into the adapter handler.
#[derive(Clone)]
struct AdapterState {
    app: Arc<CompiledApp>,
    max_body_size: usize,
}

/// HTTP server exposing a compiled application.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig, app: Arc<CompiledApp>) -> Self {
        let router = Self::build_router(&config, app);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, app: Arc<CompiledApp>) -> Router {
        let state = AdapterState {
            app,
            max_body_size: config.limits.max_body_size,
        };
        let request_id = HeaderName::from_static(X_REQUEST_ID);

        Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::SERVER,
                HeaderValue::from_static(concat!("hook-router/", env!("CARGO_PKG_VERSION"))),
            ))
            .layer(PropagateRequestIdLayer::new(request_id.clone()))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
    }

    /// The router, for embedding or driving with `tower::ServiceExt`.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Bridge between axum and the dispatcher.
async fn dispatch_handler(State(state): State<AdapterState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();

    let body = match axum::body::to_bytes(body, state.max_body_size).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Request body rejected");
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };

    let target = parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path().to_string(), ToString::to_string);

    let request = DispatchRequest {
        method: parts.method,
        path: target,
        headers: parts.headers,
        body,
    };

    let response = state.app.handle(request).await;

    let mut out = Response::new(Body::from(response.body));
    *out.status_mut() = response.status;
    out.headers_mut().extend(response.headers);
    out
}
