//! Hook records and type-erased callbacks.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde_json::{Map, Value};

use crate::dispatch::RequestContext;
use crate::error::HookResult;
use crate::hooks::Scope;
use crate::response::{Reply, Responder};

static NEXT_HOOK_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_PLUGIN_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a registered hook. Allocation order is registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HookId(u64);

impl HookId {
    fn next() -> Self {
        Self(NEXT_HOOK_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Identity of an `App` instance, used to decide hook ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PluginId(u64);

impl PluginId {
    pub(crate) fn next() -> Self {
        Self(NEXT_PLUGIN_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// The dispatch stage a hook runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    Derive,
    BeforeHandle,
    AfterHandle,
}

impl HookKind {
    pub fn as_str(self) -> &'static str {
        match self {
            HookKind::Derive => "derive",
            HookKind::BeforeHandle => "before_handle",
            HookKind::AfterHandle => "after_handle",
        }
    }
}

/// Values a `derive` hook adds to the request context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Derived(Map<String, Value>);

impl Derived {
    /// Nothing to add.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named value.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Derived {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

pub(crate) type DeriveFn =
    Arc<dyn Fn(RequestContext) -> BoxFuture<'static, HookResult<Derived>> + Send + Sync>;

/// Shared shape of handlers and `beforeHandle`/`afterHandle` callbacks.
pub(crate) type ReplyFn =
    Arc<dyn Fn(RequestContext) -> BoxFuture<'static, HookResult<Reply>> + Send + Sync>;

pub(crate) fn erase_derive<F, Fut>(f: F) -> DeriveFn
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HookResult<Derived>> + Send + 'static,
{
    Arc::new(move |ctx| f(ctx).boxed())
}

pub(crate) fn erase_reply<F, Fut, R>(f: F) -> ReplyFn
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: Responder,
{
    Arc::new(move |ctx| f(ctx).map(Responder::into_reply).boxed())
}

/// The callback of a hook, tagged with its stage.
#[derive(Clone)]
pub enum HookAction {
    Derive(DeriveFn),
    BeforeHandle(ReplyFn),
    AfterHandle(ReplyFn),
}

/// A registered lifecycle hook.
#[derive(Clone)]
pub struct Hook {
    pub(crate) id: HookId,
    pub(crate) scope: Scope,
    pub(crate) owner: PluginId,
    pub(crate) action: HookAction,
}

impl Hook {
    pub(crate) fn new(scope: Scope, owner: PluginId, action: HookAction) -> Self {
        Self {
            id: HookId::next(),
            scope,
            owner,
            action,
        }
    }

    pub fn id(&self) -> HookId {
        self.id
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn owner(&self) -> PluginId {
        self.owner
    }

    pub fn kind(&self) -> HookKind {
        match self.action {
            HookAction::Derive(_) => HookKind::Derive,
            HookAction::BeforeHandle(_) => HookKind::BeforeHandle,
            HookAction::AfterHandle(_) => HookKind::AfterHandle,
        }
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("scope", &self.scope)
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}
