//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → used once at startup to build the server and the application
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart, matching
//!   the compile-once routing tables
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    LimitsConfig, ListenerConfig, ObservabilityConfig, RoutingConfig, ServerConfig,
    TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
