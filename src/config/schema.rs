//! Configuration schema definitions.
//!
//! This module defines the gateway's main configuration structure. All
//! types derive Serde traits for deserialization from the TOML config
//! file; every section has defaults so a minimal file works.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, body cap).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Authenticator configuration.
    pub auth: AuthConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Directory holding the JSON route documents.
    pub routes_dir: String,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

/// Timeout configuration for inbound and outbound calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total inbound request timeout in seconds.
    pub request_secs: u64,

    /// Outbound backend call timeout in seconds. Expiry surfaces as
    /// `backend_disconnected`.
    pub backend_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            backend_secs: 10,
        }
    }
}

/// Authenticator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for bearer-token signing.
    pub token_secret: String,

    /// Active lifetime of issued tokens in seconds.
    pub token_lifetime_secs: u64,

    /// TTL for the authenticator's identity/credential caches in seconds.
    pub cache_ttl_secs: u64,

    /// Shared static key required by `POST /register`.
    pub registration_key: String,

    /// Path of the JSON user-store file.
    pub store_path: String,

    /// Metadata every new user starts from; supplied metadata overrides it.
    pub default_metadata: Map<String, Value>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            // WARNING: placeholders! Change these in production.
            token_secret: "CHANGE_ME_IN_PRODUCTION".to_string(),
            token_lifetime_secs: 3600,
            cache_ttl_secs: 300,
            registration_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            store_path: "users.json".to_string(),
            default_metadata: Map::new(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            timeouts: TimeoutConfig::default(),
            auth: AuthConfig::default(),
            observability: ObservabilityConfig::default(),
            routes_dir: "routes".to_string(),
        }
    }
}
