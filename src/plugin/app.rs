//! The application / plugin builder.
//!
//! # Responsibilities
//! - Register routes (with optional per-route hooks) under the instance prefix
//! - Register lifecycle hooks with a scope
//! - Freeze everything into a `CompiledApp`
//!
//! # Design Decisions
//! - One type serves as both application and plugin
//! - Registration errors are returned from the call that caused them
//! - `compile` borrows: the builder stays usable and can be compiled again

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::http::Method;

use crate::dispatch::{CompiledApp, RequestContext};
use crate::error::{HookResult, RegistrationError};
use crate::hooks::hook::{erase_derive, erase_reply, ReplyFn};
use crate::hooks::{Derived, Hook, HookAction, HookRegistry, PluginId, Scope};
use crate::response::{Reply, Responder};
use crate::routing::path;

/// What a route runs once its hooks let it through.
#[derive(Clone)]
pub(crate) enum RouteHandler {
    Dynamic(ReplyFn),
    /// A fixed reply, built once at registration.
    Static(Reply),
}

/// A route as held by the builder, before compile.
#[derive(Clone)]
pub(crate) struct RouteDef {
    /// `None` matches any method.
    pub(crate) method: Option<Method>,
    pub(crate) path: String,
    pub(crate) handler: RouteHandler,
    /// Local and scoped hooks already bound to this route.
    pub(crate) bound: Vec<Arc<Hook>>,
    /// The instance the route was registered on.
    pub(crate) origin: PluginId,
}

impl RouteDef {
    pub(crate) fn key(&self) -> (Option<Method>, String) {
        (self.method.clone(), self.path.clone())
    }
}

/// Hooks attached to a single route at registration.
#[derive(Default)]
pub struct RouteOptions {
    actions: Vec<HookAction>,
}

impl RouteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn derive<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult<Derived>> + Send + 'static,
    {
        self.actions.push(HookAction::Derive(erase_derive(f)));
        self
    }

    #[must_use]
    pub fn before_handle<F, Fut, R>(mut self, f: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: Responder,
    {
        self.actions.push(HookAction::BeforeHandle(erase_reply(f)));
        self
    }

    #[must_use]
    pub fn after_handle<F, Fut, R>(mut self, f: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: Responder,
    {
        self.actions.push(HookAction::AfterHandle(erase_reply(f)));
        self
    }
}

/// An application, or a plugin to be mounted into one.
///
/// ```ignore
/// let mut plugin = App::with_prefix("/api/v1");
/// plugin.post("/", |_ctx| async { Json(json!({ "message": "Yugiri" })) })?;
///
/// let mut app = App::new();
/// app.get("/", |_ctx| async { "hi" })?.mount(&plugin)?;
/// let app = app.compile()?;
/// ```
pub struct App {
    pub(crate) id: PluginId,
    pub(crate) prefix: String,
    pub(crate) routes: Vec<RouteDef>,
    pub(crate) taken: HashSet<(Option<Method>, String)>,
    pub(crate) hooks: HookRegistry,
    pub(crate) not_found: Option<Reply>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self::with_prefix("")
    }

    /// An instance whose routes live under `prefix`.
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            id: PluginId::next(),
            prefix: path::normalize_prefix(prefix),
            routes: Vec::new(),
            taken: HashSet::new(),
            hooks: HookRegistry::new(),
            not_found: None,
        }
    }

    pub fn id(&self) -> PluginId {
        self.id
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Number of routes, including mounted ones.
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    // --- Routes ---

    pub fn route<F, Fut, R>(
        &mut self,
        method: Method,
        path: &str,
        handler: F,
    ) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: Responder,
    {
        self.route_with(method, path, handler, RouteOptions::default())
    }

    /// Register a route with hooks of its own.
    pub fn route_with<F, Fut, R>(
        &mut self,
        method: Method,
        path: &str,
        handler: F,
        options: RouteOptions,
    ) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: Responder,
    {
        let handler = RouteHandler::Dynamic(erase_reply(handler));
        self.add_route(Some(method), path, handler, options)
    }

    /// Register a route that always answers with the same reply.
    pub fn static_route(
        &mut self,
        method: Method,
        path: &str,
        reply: impl Into<Reply>,
    ) -> Result<&mut Self, RegistrationError> {
        let handler = RouteHandler::Static(reply.into());
        self.add_route(Some(method), path, handler, RouteOptions::default())
    }

    /// Register a route answering every method.
    pub fn all<F, Fut, R>(&mut self, path: &str, handler: F) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: Responder,
    {
        let handler = RouteHandler::Dynamic(erase_reply(handler));
        self.add_route(None, path, handler, RouteOptions::default())
    }

    pub fn get<F, Fut, R>(&mut self, path: &str, handler: F) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: Responder,
    {
        self.route(Method::GET, path, handler)
    }

    pub fn post<F, Fut, R>(&mut self, path: &str, handler: F) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: Responder,
    {
        self.route(Method::POST, path, handler)
    }

    pub fn put<F, Fut, R>(&mut self, path: &str, handler: F) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: Responder,
    {
        self.route(Method::PUT, path, handler)
    }

    pub fn patch<F, Fut, R>(&mut self, path: &str, handler: F) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: Responder,
    {
        self.route(Method::PATCH, path, handler)
    }

    pub fn delete<F, Fut, R>(&mut self, path: &str, handler: F) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: Responder,
    {
        self.route(Method::DELETE, path, handler)
    }

    pub fn options<F, Fut, R>(&mut self, path: &str, handler: F) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: Responder,
    {
        self.route(Method::OPTIONS, path, handler)
    }

    pub fn head<F, Fut, R>(&mut self, path: &str, handler: F) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: Responder,
    {
        self.route(Method::HEAD, path, handler)
    }

    fn add_route(
        &mut self,
        method: Option<Method>,
        route_path: &str,
        handler: RouteHandler,
        options: RouteOptions,
    ) -> Result<&mut Self, RegistrationError> {
        let full_path = path::join(&self.prefix, route_path);
        let key = (method, full_path);
        if self.taken.contains(&key) {
            return Err(RegistrationError::conflict(key.0.as_ref(), &key.1));
        }

        let owner = self.id;
        let bound = options
            .actions
            .into_iter()
            .map(|action| Arc::new(Hook::new(Scope::Local, owner, action)))
            .collect();

        let (method, full_path) = key.clone();
        tracing::debug!(
            method = %method.as_ref().map_or("ALL", Method::as_str),
            path = %full_path,
            "Route registered"
        );

        self.taken.insert(key);
        self.routes.push(RouteDef {
            method,
            path: full_path,
            handler,
            bound,
            origin: self.id,
        });
        Ok(self)
    }

    // --- Hooks ---

    /// Register a `derive` hook. Its values are readable through
    /// `RequestContext::derived` by later hooks and the handler.
    pub fn derive<F, Fut>(&mut self, scope: Scope, f: F) -> &mut Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult<Derived>> + Send + 'static,
    {
        self.add_hook(scope, HookAction::Derive(erase_derive(f)))
    }

    /// Register a `beforeHandle` hook. Returning a value other than
    /// `()`/`Reply::Empty` answers the request without running the handler.
    pub fn on_before_handle<F, Fut, R>(&mut self, scope: Scope, f: F) -> &mut Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: Responder,
    {
        self.add_hook(scope, HookAction::BeforeHandle(erase_reply(f)))
    }

    /// Register an `afterHandle` hook. Returning a value other than
    /// `()`/`Reply::Empty` replaces the response.
    pub fn on_after_handle<F, Fut, R>(&mut self, scope: Scope, f: F) -> &mut Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: Responder,
    {
        self.add_hook(scope, HookAction::AfterHandle(erase_reply(f)))
    }

    fn add_hook(&mut self, scope: Scope, action: HookAction) -> &mut Self {
        let hook = Hook::new(scope, self.id, action);
        tracing::debug!(kind = hook.kind().as_str(), scope = %scope, "Hook registered");
        self.hooks.register(Arc::new(hook));
        self
    }

    /// Reply sent with 404 when no route matches.
    pub fn not_found(&mut self, reply: impl Into<Reply>) -> &mut Self {
        self.not_found = Some(reply.into());
        self
    }

    // --- Compile ---

    /// Freeze routes and resolve every route's hooks.
    pub fn compile(&self) -> Result<CompiledApp, RegistrationError> {
        CompiledApp::build(self.sealed_routes(), &self.hooks, self.not_found.clone())
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("id", &self.id)
            .field("prefix", &self.prefix)
            .field("routes", &self.routes.len())
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_applies_at_registration() {
        let mut app = App::with_prefix("/api/v1/");
        app.post("/", |_ctx| async { "root" }).unwrap();
        app.get("/users", |_ctx| async { "users" }).unwrap();

        let paths: Vec<_> = app.routes.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["/api/v1", "/api/v1/users"]);
    }

    #[test]
    fn test_duplicate_route_is_rejected() {
        let mut app = App::new();
        app.get("/", |_ctx| async { "first" }).unwrap();

        let err = app.get("/", |_ctx| async { "second" }).unwrap_err();
        assert_eq!(
            err,
            RegistrationError::Conflict {
                method: "GET".into(),
                path: "/".into()
            }
        );
        assert_eq!(app.route_count(), 1);

        // Same path, other method, is fine.
        app.post("/", |_ctx| async { "post" }).unwrap();
        // Duplicate slashes normalize to the same path.
        assert!(app.post("//", |_ctx| async { "again" }).is_err());
    }

    #[test]
    fn test_route_options_bind_local_hooks() {
        let mut app = App::new();
        app.route_with(
            Method::GET,
            "/",
            |_ctx| async { "ok" },
            RouteOptions::new()
                .before_handle(|_ctx| async {})
                .after_handle(|_ctx| async {}),
        )
        .unwrap();

        let route = &app.routes[0];
        assert_eq!(route.bound.len(), 2);
        assert!(route.bound.iter().all(|h| h.scope() == Scope::Local));
        assert!(app.hooks().is_empty());
    }

    #[test]
    fn test_hooks_are_registered_with_scope() {
        let mut app = App::new();
        app.derive(Scope::Global, |_ctx| async { Ok(Derived::new()) })
            .on_after_handle(Scope::Scoped, |ctx: RequestContext| async move {
                ctx.response().cloned()
            });

        assert_eq!(app.hooks().len(), 2);
        assert_eq!(app.hooks().with_scope(Scope::Global).count(), 1);
    }
}
