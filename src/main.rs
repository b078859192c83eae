//! hook-router demo server.
//!
//! Serves a small application through the dispatch pipeline:
//!
//! ```text
//! GET  /          → "hi"                      (text)
//! GET  /static    → "hi"                      (static route)
//! POST /json      → echoes the parsed body    (JSON in, JSON out)
//! POST /api/v1    → {"message":"Yugiri"}      (plugin mounted at /api/v1)
//! ```

use std::path::PathBuf;

use axum::http::Method;
use clap::Parser;
use serde_json::json;

use hook_router::config::{load_config, ServerConfig};
use hook_router::lifecycle::{self, signals, Shutdown};
use hook_router::observability::logging;
use hook_router::{App, Derived, Json, RegistrationError, RequestContext, RouteOptions, Scope};

#[derive(Parser)]
#[command(name = "hook-router")]
#[command(about = "Demo server for the hook-router dispatch pipeline", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

fn demo_app() -> Result<App, RegistrationError> {
    let mut api = App::with_prefix("/api/v1");
    api.route_with(
        Method::POST,
        "/",
        |_ctx| async { Json(json!({ "message": "Yugiri" })) },
        RouteOptions::new().before_handle(|ctx: RequestContext| async move {
            tracing::debug!(request_id = %ctx.request_id(), "api call");
        }),
    )?;

    let mut app = App::new();
    app.apply(|app| {
        app.derive(Scope::Global, |ctx: RequestContext| async move {
            Ok(match ctx.cookie("session") {
                Some(session) => Derived::new().with("session", session),
                None => Derived::new(),
            })
        })
        .on_after_handle(Scope::Global, |ctx: RequestContext| async move {
            ctx.response().cloned()
        });
        Ok(())
    })?
    .get("/", |_ctx| async { "hi" })?
    .static_route(Method::GET, "/static", "hi")?
    .post("/json", |ctx: RequestContext| async move { ctx.body().cloned() })?
    .mount(&api)?;

    Ok(app)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability);
    tracing::info!("hook-router v{} starting", env!("CARGO_PKG_VERSION"));

    let shutdown = Shutdown::new();
    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));

    lifecycle::start(config, demo_app()?, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
