//! Lifecycle hook subsystem.
//!
//! # Data Flow
//! ```text
//! App::derive / on_before_handle / on_after_handle (scope, fn)
//!     → hook.rs (erase the callback, assign id + owner)
//!     → registry.rs (append to the list for its kind)
//!
//! Mount / compile:
//!     scope.rs decides where each hook applies
//!     → registry.rs resolve(route) → ordered, de-duplicated lists
//! ```
//!
//! # Design Decisions
//! - Hook ids are allocated from one counter, so id order is registration order
//! - Scope is resolved once, at mount/compile time, never per request
//! - Global hooks run before route-bound hooks of the same kind

pub mod hook;
pub mod registry;
pub mod scope;

pub use hook::{Derived, Hook, HookAction, HookId, HookKind, PluginId};
pub use registry::{HookRegistry, ResolvedHooks};
pub use scope::Scope;
