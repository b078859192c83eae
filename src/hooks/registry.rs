//! Hook storage and resolution.
//!
//! # Responsibilities
//! - Keep hooks in registration order, one list per kind
//! - Resolve the hooks that apply to a route
//!
//! # Design Decisions
//! - Resolution order: global hooks first, then hooks bound to the route
//! - Within each group, registration order (hook id order)
//! - A hook reachable through several paths runs once

use std::collections::HashSet;
use std::sync::Arc;

use crate::hooks::{Hook, HookKind, Scope};

/// Hooks registered on one `App`, in registration order per kind.
#[derive(Debug, Clone, Default)]
pub struct HookRegistry {
    derive: Vec<Arc<Hook>>,
    before_handle: Vec<Arc<Hook>>,
    after_handle: Vec<Arc<Hook>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook to the list for its kind. A hook already present
    /// (same id) is not added twice.
    pub fn register(&mut self, hook: Arc<Hook>) {
        let list = self.list_mut(hook.kind());
        if list.iter().all(|existing| existing.id != hook.id) {
            list.push(hook);
        }
    }

    /// Hooks of one kind, in registration order.
    pub fn of_kind(&self, kind: HookKind) -> &[Arc<Hook>] {
        match kind {
            HookKind::Derive => &self.derive,
            HookKind::BeforeHandle => &self.before_handle,
            HookKind::AfterHandle => &self.after_handle,
        }
    }

    /// All hooks with the given scope, grouped by kind.
    pub fn with_scope(&self, scope: Scope) -> impl Iterator<Item = &Arc<Hook>> + '_ {
        self.iter().filter(move |hook| hook.scope == scope)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Hook>> + '_ {
        self.derive
            .iter()
            .chain(&self.before_handle)
            .chain(&self.after_handle)
    }

    pub fn len(&self) -> usize {
        self.derive.len() + self.before_handle.len() + self.after_handle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve the ordered hooks for a route: this registry's global hooks
    /// followed by the hooks bound to the route.
    pub fn resolve(&self, bound: &[Arc<Hook>]) -> ResolvedHooks {
        let mut globals: Vec<&Arc<Hook>> = self.with_scope(Scope::Global).collect();
        globals.sort_by_key(|hook| hook.id);

        let mut local: Vec<&Arc<Hook>> = bound.iter().collect();
        local.sort_by_key(|hook| hook.id);

        let mut seen = HashSet::new();
        let mut resolved = ResolvedHooks::default();
        for hook in globals.into_iter().chain(local) {
            if seen.insert(hook.id) {
                resolved.list_mut(hook.kind()).push(Arc::clone(hook));
            }
        }
        resolved
    }

    fn list_mut(&mut self, kind: HookKind) -> &mut Vec<Arc<Hook>> {
        match kind {
            HookKind::Derive => &mut self.derive,
            HookKind::BeforeHandle => &mut self.before_handle,
            HookKind::AfterHandle => &mut self.after_handle,
        }
    }
}

/// The hooks that run for one compiled route, in execution order.
#[derive(Debug, Clone, Default)]
pub struct ResolvedHooks {
    pub derive: Vec<Arc<Hook>>,
    pub before_handle: Vec<Arc<Hook>>,
    pub after_handle: Vec<Arc<Hook>>,
}

impl ResolvedHooks {
    fn list_mut(&mut self, kind: HookKind) -> &mut Vec<Arc<Hook>> {
        match kind {
            HookKind::Derive => &mut self.derive,
            HookKind::BeforeHandle => &mut self.before_handle,
            HookKind::AfterHandle => &mut self.after_handle,
        }
    }

    pub fn len(&self) -> usize {
        self.derive.len() + self.before_handle.len() + self.after_handle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::hook::{erase_derive, erase_reply};
    use crate::hooks::{Derived, HookAction, PluginId};

    fn before(scope: Scope, owner: PluginId) -> Arc<Hook> {
        Arc::new(Hook::new(
            scope,
            owner,
            HookAction::BeforeHandle(erase_reply(|_ctx| async {})),
        ))
    }

    fn derive(scope: Scope, owner: PluginId) -> Arc<Hook> {
        Arc::new(Hook::new(
            scope,
            owner,
            HookAction::Derive(erase_derive(|_ctx| async { Ok(Derived::new()) })),
        ))
    }

    fn ids(hooks: &[Arc<Hook>]) -> Vec<crate::hooks::HookId> {
        hooks.iter().map(|h| h.id()).collect()
    }

    #[test]
    fn test_register_keeps_order_per_kind() {
        let owner = PluginId::next();
        let a = before(Scope::Local, owner);
        let b = derive(Scope::Local, owner);
        let c = before(Scope::Global, owner);

        let mut registry = HookRegistry::new();
        registry.register(a.clone());
        registry.register(b.clone());
        registry.register(c.clone());

        assert_eq!(ids(registry.of_kind(HookKind::BeforeHandle)), vec![a.id(), c.id()]);
        assert_eq!(ids(registry.of_kind(HookKind::Derive)), vec![b.id()]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_resolve_puts_globals_first_and_dedups() {
        let owner = PluginId::next();
        let local_early = before(Scope::Local, owner);
        let global_late = before(Scope::Global, owner);

        let mut registry = HookRegistry::new();
        registry.register(local_early.clone());
        registry.register(global_late.clone());

        // The global hook is also bound to the route; it must run once.
        let bound = vec![local_early.clone(), global_late.clone()];
        let resolved = registry.resolve(&bound);

        assert_eq!(
            ids(&resolved.before_handle),
            vec![global_late.id(), local_early.id()]
        );
        assert!(resolved.derive.is_empty());
    }

    #[test]
    fn test_resolve_ignores_unbound_local_hooks() {
        let owner = PluginId::next();
        let mut registry = HookRegistry::new();
        registry.register(before(Scope::Local, owner));
        registry.register(before(Scope::Scoped, owner));

        assert!(registry.resolve(&[]).is_empty());
    }
}
