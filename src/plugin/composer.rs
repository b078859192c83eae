//! Mounting plugins into a parent.
//!
//! # Scope Rules
//! - `local`: bound to routes registered directly on the owning instance
//! - `scoped`: bound to every route the owning instance holds when it is
//!   mounted (or compiled), including routes from its own nested plugins
//! - `global`: copied into the parent registry, and from there into every
//!   ancestor; applies to every route of the compiled application

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::RegistrationError;
use crate::hooks::{Hook, Scope};
use crate::plugin::app::{App, RouteDef};
use crate::routing::path;

impl App {
    /// Mount `plugin` into this instance under this instance's prefix.
    ///
    /// Either every route of the plugin is installed or, on conflict,
    /// nothing is.
    pub fn mount(&mut self, plugin: &App) -> Result<&mut Self, RegistrationError> {
        let incoming: Vec<RouteDef> = plugin
            .sealed_routes()
            .into_iter()
            .map(|mut route| {
                route.path = path::join(&self.prefix, &route.path);
                route
            })
            .collect();

        let mut staged = HashSet::with_capacity(incoming.len());
        for route in &incoming {
            let key = route.key();
            if self.taken.contains(&key) || staged.contains(&key) {
                tracing::warn!(
                    plugin_prefix = %plugin.prefix,
                    path = %route.path,
                    "Mount rejected: route conflict"
                );
                return Err(RegistrationError::conflict(route.method.as_ref(), &route.path));
            }
            staged.insert(key);
        }

        let globals: Vec<Arc<Hook>> = plugin.hooks.with_scope(Scope::Global).cloned().collect();

        tracing::debug!(
            plugin_prefix = %plugin.prefix,
            parent_prefix = %self.prefix,
            routes = incoming.len(),
            global_hooks = globals.len(),
            "Plugin mounted"
        );

        self.taken.extend(staged);
        self.routes.extend(incoming);
        for hook in globals {
            self.hooks.register(hook);
        }
        Ok(self)
    }

    /// Run a functional plugin against this instance.
    ///
    /// Unlike `mount`, the function registers directly on `self`, so its
    /// hooks are owned by this instance.
    pub fn apply<F>(&mut self, plugin: F) -> Result<&mut Self, RegistrationError>
    where
        F: FnOnce(&mut App) -> Result<(), RegistrationError>,
    {
        plugin(self)?;
        Ok(self)
    }

    /// Routes with this instance's local and scoped hooks bound to them.
    pub(crate) fn sealed_routes(&self) -> Vec<RouteDef> {
        let scoped: Vec<&Arc<Hook>> = self.hooks.with_scope(Scope::Scoped).collect();
        let local: Vec<&Arc<Hook>> = self.hooks.with_scope(Scope::Local).collect();

        self.routes
            .iter()
            .map(|route| {
                let mut route = route.clone();
                route.bound.extend(scoped.iter().map(|hook| Arc::clone(hook)));
                if route.origin == self.id {
                    route.bound.extend(local.iter().map(|hook| Arc::clone(hook)));
                }
                route
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::Derived;

    fn bound_scopes(app: &App, path: &str) -> Vec<Scope> {
        app.sealed_routes()
            .into_iter()
            .find(|r| r.path == path)
            .map(|r| r.bound.iter().map(|h| h.scope()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_mount_prefixes_compose() {
        let mut inner = App::with_prefix("/v1");
        inner.get("/users", |_ctx| async { "users" }).unwrap();

        let mut outer = App::with_prefix("/api");
        outer.mount(&inner).unwrap();

        let mut app = App::new();
        app.mount(&outer).unwrap();

        let paths: Vec<_> = app.routes.iter().map(|r| r.path.clone()).collect();
        assert_eq!(paths, vec!["/api/v1/users"]);
        // The plugin is copied, not moved.
        assert_eq!(inner.route_count(), 1);
    }

    #[test]
    fn test_mount_conflict_is_all_or_nothing() {
        let mut app = App::new();
        app.get("/b", |_ctx| async { "b" }).unwrap();

        let mut plugin = App::new();
        plugin.get("/a", |_ctx| async { "a" }).unwrap();
        plugin.get("/b", |_ctx| async { "b2" }).unwrap();
        plugin.derive(Scope::Global, |_ctx| async { Ok(Derived::new()) });

        assert!(app.mount(&plugin).is_err());
        assert_eq!(app.route_count(), 1);
        assert!(app.hooks().is_empty());
    }

    #[test]
    fn test_scopes_bind_on_mount() {
        let mut child = App::new();
        child.get("/child", |_ctx| async { "child" }).unwrap();
        child.on_before_handle(Scope::Local, |_ctx| async {});

        let mut parent = App::new();
        parent.get("/parent", |_ctx| async { "parent" }).unwrap();
        parent.on_before_handle(Scope::Local, |_ctx| async {});
        parent.on_before_handle(Scope::Scoped, |_ctx| async {});
        parent.on_before_handle(Scope::Global, |_ctx| async {});
        parent.mount(&child).unwrap();

        // Child routes keep the child's local hook and get the parent's
        // scoped hook, but not the parent's local one.
        assert_eq!(bound_scopes(&parent, "/child"), vec![Scope::Local, Scope::Scoped]);
        assert_eq!(bound_scopes(&parent, "/parent"), vec![Scope::Scoped, Scope::Local]);
    }

    #[test]
    fn test_globals_propagate_to_parent() {
        let mut plugin = App::new();
        plugin.on_after_handle(Scope::Global, |_ctx| async {});
        plugin.on_after_handle(Scope::Scoped, |_ctx| async {});

        let mut app = App::new();
        app.mount(&plugin).unwrap();
        app.mount(&plugin).unwrap();

        // Same hook mounted twice is registered once.
        assert_eq!(app.hooks().len(), 1);
        assert_eq!(app.hooks().with_scope(Scope::Global).count(), 1);
    }

    #[test]
    fn test_apply_registers_on_self() {
        let mut app = App::new();
        app.apply(|app| {
            app.derive(Scope::Global, |_ctx| async { Ok(Derived::new()) });
            app.get("/", |_ctx| async { "ok" })?;
            Ok(())
        })
        .unwrap();

        assert_eq!(app.route_count(), 1);
        assert_eq!(app.hooks().len(), 1);
    }
}
