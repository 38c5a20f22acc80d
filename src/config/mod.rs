//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! gateway.toml
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!
//! routes/*.json
//!     → routes.rs (per-document: deep-merge each entry over `default`)
//!     → validation.rs (template / backend checks)
//!     → RouteEntry[] (compiled into the registry at startup)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod routes;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use routes::{
    load_route_entries, AccountConfig, CacheConfig, HostnameConfig, RouteEntry, RouteInfoConfig,
};
pub use schema::{AuthConfig, GatewayConfig, ListenerConfig, ObservabilityConfig, TimeoutConfig};
