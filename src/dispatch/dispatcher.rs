//! The per-request pipeline.
//!
//! # Stages
//! ```text
//! Matching ──no route──────────────────────────────────────────▶ Serializing (404)
//!    │
//!    ▼
//! Deriving ──raised reply──┐
//!    │                     │
//!    ▼                     │
//! BeforeHandle ──reply─────┤   (short-circuit: handler skipped)
//!    │                     │
//!    ▼                     │
//! Handling ────────────────┤
//!                          ▼
//!                     AfterHandle ──▶ Serializing ──▶ Done
//!
//! any failure or panic ───────────────────────────▶ Serializing (500)
//! ```
//!
//! # Design Decisions
//! - `afterHandle` runs over whatever response exists, short-circuited or not
//! - A failure skips `afterHandle`; the client gets a bare 500
//! - Panics are caught per hook and treated as failures

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use axum::body::Bytes;
use axum::http::{Method, StatusCode};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tracing::Instrument;
use uuid::Uuid;

use crate::dispatch::{DispatchRequest, RequestContext};
use crate::error::{HookError, HookResult, RegistrationError};
use crate::hooks::{HookAction, HookRegistry, ResolvedHooks};
use crate::observability::metrics;
use crate::plugin::app::{RouteDef, RouteHandler};
use crate::response::{serialize, Reply, Response};
use crate::routing::{RouteLookup, RouteTable};

/// Header carrying the request id, set by the transport or generated here.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Pipeline stages, used in logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Matching,
    Deriving,
    BeforeHandle,
    Handling,
    AfterHandle,
    Serializing,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Matching => "matching",
            Stage::Deriving => "deriving",
            Stage::BeforeHandle => "before_handle",
            Stage::Handling => "handling",
            Stage::AfterHandle => "after_handle",
            Stage::Serializing => "serializing",
        }
    }
}

/// A route ready for dispatch.
struct CompiledRoute {
    path: String,
    handler: RouteHandler,
    hooks: ResolvedHooks,
}

/// What a hook or handler call produced.
enum Outcome<T> {
    Value(T),
    /// A reply raised through `HookError::Reply`.
    Raised(Reply),
}

/// A hook or handler failed; the request ends with 500.
struct StageFailure {
    stage: Stage,
    reason: String,
}

/// Frozen routing and hook tables. Safe to share across tasks.
pub struct CompiledApp {
    routes: RouteTable<CompiledRoute>,
    not_found: Option<Reply>,
}

impl CompiledApp {
    pub(crate) fn build(
        routes: Vec<RouteDef>,
        registry: &HookRegistry,
        not_found: Option<Reply>,
    ) -> Result<Self, RegistrationError> {
        let mut table = RouteTable::new();
        for route in routes {
            let compiled = CompiledRoute {
                path: route.path.clone(),
                handler: route.handler,
                hooks: registry.resolve(&route.bound),
            };
            table.insert(route.method, route.path, compiled)?;
        }

        tracing::info!(routes = table.len(), "Application compiled");
        Ok(Self {
            routes: table,
            not_found,
        })
    }

    /// Number of routes in the table.
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Dispatch one request.
    pub async fn handle(&self, request: DispatchRequest) -> Response {
        let start = Instant::now();
        let method = request.method.clone();
        let request_id = request
            .headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let span = tracing::debug_span!(
            "dispatch",
            request_id = %request_id,
            method = %method,
            path = %request.path
        );

        let mut response = self.dispatch(request, request_id).instrument(span).await;
        if method == Method::HEAD {
            response.body = Bytes::new();
        }

        metrics::record_request(method.as_str(), response.status.as_u16(), start);
        response
    }

    /// Dispatch one request unless `cancelled` completes first.
    ///
    /// On cancellation the current stage is dropped where it stands and
    /// `None` is returned; work already done is not undone.
    pub async fn handle_until<C>(&self, request: DispatchRequest, cancelled: C) -> Option<Response>
    where
        C: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            () = cancelled => {
                tracing::debug!("Request cancelled before completion");
                None
            }
            response = self.handle(request) => Some(response),
        }
    }

    async fn dispatch(&self, request: DispatchRequest, request_id: String) -> Response {
        let mut ctx = RequestContext::new(request, request_id);

        let route = match self.routes.lookup(ctx.method(), ctx.path()) {
            RouteLookup::Match(route) => route,
            RouteLookup::NotFound => {
                tracing::debug!("No route matched");
                return self.not_found_response();
            }
        };

        let reply = match run_pipeline(route, &mut ctx).await {
            Ok(reply) => reply,
            Err(failure) => {
                tracing::error!(
                    stage = failure.stage.as_str(),
                    route = %route.path,
                    reason = %failure.reason,
                    "Request failed"
                );
                metrics::record_hook_failure(failure.stage.as_str());
                return Response::empty(StatusCode::INTERNAL_SERVER_ERROR);
            }
        };

        match serialize(reply) {
            Ok(response) => {
                tracing::debug!(status = response.status.as_u16(), "Request handled");
                response
            }
            Err(e) => {
                tracing::error!(error = %e, route = %route.path, "Response serialization failed");
                metrics::record_hook_failure(Stage::Serializing.as_str());
                Response::empty(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    fn not_found_response(&self) -> Response {
        let fallback = self.not_found.clone().unwrap_or(Reply::Empty);
        let mut response =
            serialize(fallback).unwrap_or_else(|_| Response::empty(StatusCode::NOT_FOUND));
        response.status = StatusCode::NOT_FOUND;
        response
    }
}

impl std::fmt::Debug for CompiledApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledApp")
            .field("routes", &self.routes.len())
            .finish_non_exhaustive()
    }
}

/// Deriving → BeforeHandle → Handling → AfterHandle.
async fn run_pipeline(
    route: &CompiledRoute,
    ctx: &mut RequestContext,
) -> Result<Reply, StageFailure> {
    let early = match run_derive(route, ctx).await? {
        Some(reply) => Some(reply),
        None => run_before_handle(route, ctx).await?,
    };

    let reply = match early {
        Some(reply) => {
            tracing::debug!("Short-circuited before handler");
            reply
        }
        None => run_handler(route, ctx).await?,
    };

    run_after_handle(route, ctx, reply).await
}

async fn run_derive(
    route: &CompiledRoute,
    ctx: &mut RequestContext,
) -> Result<Option<Reply>, StageFailure> {
    for hook in &route.hooks.derive {
        let HookAction::Derive(derive) = &hook.action else {
            continue;
        };
        let snapshot = ctx.clone();
        match guarded(Stage::Deriving, move || derive(snapshot)).await? {
            Outcome::Value(derived) => ctx.merge_derived(derived),
            Outcome::Raised(reply) => return Ok(Some(reply)),
        }
    }
    Ok(None)
}

async fn run_before_handle(
    route: &CompiledRoute,
    ctx: &RequestContext,
) -> Result<Option<Reply>, StageFailure> {
    for hook in &route.hooks.before_handle {
        let HookAction::BeforeHandle(before) = &hook.action else {
            continue;
        };
        match guarded(Stage::BeforeHandle, || before(ctx.clone())).await? {
            Outcome::Value(reply) if reply.is_empty() => {}
            Outcome::Value(reply) | Outcome::Raised(reply) => return Ok(Some(reply)),
        }
    }
    Ok(None)
}

async fn run_handler(route: &CompiledRoute, ctx: &RequestContext) -> Result<Reply, StageFailure> {
    match &route.handler {
        RouteHandler::Static(reply) => Ok(reply.clone()),
        RouteHandler::Dynamic(handler) => {
            match guarded(Stage::Handling, || handler(ctx.clone())).await? {
                Outcome::Value(reply) | Outcome::Raised(reply) => Ok(reply),
            }
        }
    }
}

async fn run_after_handle(
    route: &CompiledRoute,
    ctx: &mut RequestContext,
    reply: Reply,
) -> Result<Reply, StageFailure> {
    ctx.set_response(reply);
    for hook in &route.hooks.after_handle {
        let HookAction::AfterHandle(after) = &hook.action else {
            continue;
        };
        let snapshot = ctx.clone();
        match guarded(Stage::AfterHandle, move || after(snapshot)).await? {
            Outcome::Value(reply) if reply.is_empty() => {}
            Outcome::Value(reply) | Outcome::Raised(reply) => ctx.set_response(reply),
        }
    }
    Ok(ctx.take_response().unwrap_or(Reply::Empty))
}

/// Call one hook or handler and await it, turning errors and panics into
/// outcomes. A panic while building the future counts the same as one
/// while polling it.
async fn guarded<T, F>(stage: Stage, call: F) -> Result<Outcome<T>, StageFailure>
where
    F: FnOnce() -> BoxFuture<'static, HookResult<T>>,
{
    let result = match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(future) => AssertUnwindSafe(future).catch_unwind().await,
        Err(panic) => Err(panic),
    };

    match result {
        Ok(Ok(value)) => Ok(Outcome::Value(value)),
        Ok(Err(HookError::Reply(reply))) => Ok(Outcome::Raised(reply)),
        Ok(Err(err)) => Err(StageFailure {
            stage,
            reason: err.to_string(),
        }),
        Err(panic) => Err(StageFailure {
            stage,
            reason: format!("panic: {}", panic_message(panic.as_ref())),
        }),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown")
}
