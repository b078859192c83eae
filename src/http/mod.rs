//! HTTP transport adapter.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, tower-http layers)
//!         - request id (UUID v4, propagated to the response)
//!         - body limit, timeout, trace
//!     → adapter: axum Request → DispatchRequest
//!     → CompiledApp::handle (dispatch pipeline)
//!     → adapter: Response → axum Response
//!     → Send to client
//! ```

pub mod server;

pub use server::HttpServer;
