//! Request dispatch and plugin composition for HTTP applications.
//!
//! An `App` collects routes and lifecycle hooks (`derive`, `beforeHandle`,
//! `afterHandle`), possibly spread over nested plugins mounted under
//! prefixes. `App::compile` freezes it into a `CompiledApp`, which
//! dispatches requests concurrently without locks.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod hooks;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod plugin;
pub mod response;
pub mod routing;

pub use config::ServerConfig;
pub use dispatch::{CompiledApp, DispatchRequest, ParsedBody, RequestContext};
pub use error::{BodyError, HookError, HookResult, RegistrationError, SerializationError};
pub use hooks::{Derived, Scope};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use plugin::{App, RouteOptions};
pub use response::{Json, Reply, Responder, Response};
