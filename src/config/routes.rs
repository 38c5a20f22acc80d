//! Route documents.
//!
//! # Responsibilities
//! - Deserialize the per-route configuration shape (one sub-object per
//!   capability, keyed by capability name)
//! - Load a directory of JSON route documents (`default` + `routes[]`)
//! - Deep-merge each entry over its document's `default` block
//!
//! # Design Decisions
//! - Merging is leaf-level: nested objects merge key by key, everything
//!   else is replaced by the entry's value
//! - A document without a `default` object is skipped with a warning
//! - A missing capability sub-object deserializes to its empty default,
//!   which every capability treats as "disabled / allow all"

use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

use crate::config::loader::ConfigError;

/// One fully merged route entry, keyed by capability name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RouteEntry {
    pub route_info: RouteInfoConfig,
    pub account: AccountConfig,
    pub cache: CacheConfig,
    pub hostname: HostnameConfig,
}

/// Path, backends and prefix handling.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RouteInfoConfig {
    /// Path template, e.g. `"/svc/<id>"`.
    pub path: Option<String>,
    /// Upstream base addresses; empty means the route is never dispatched.
    pub backends: Vec<String>,
    /// Strip the matched template prefix before forwarding.
    pub remove_prefix: bool,
}

/// Group-based access control.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccountConfig {
    /// Groups allowed through; empty disables the check.
    pub allowed_groups: Vec<String>,
    /// Metadata keys relayed to the backend as identity headers.
    pub public_meta_key: Vec<String>,
}

/// Response memoization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    /// Freshness window in seconds; `0` disables caching.
    pub interval: u64,
    pub user_cached: bool,
    pub global_cached: bool,
}

/// Hostname allow-listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HostnameConfig {
    /// Exact hostnames accepted; empty means unrestricted.
    pub allowed_hosts: Vec<String>,
}

/// Merge `overlay` onto `base` at leaf level.
fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Load every `*.json` document under `dir` and expand it into merged
/// route entries.
pub fn load_route_entries(dir: &Path) -> Result<Vec<RouteEntry>, ConfigError> {
    let mut entries = Vec::new();
    if !dir.is_dir() {
        tracing::warn!(dir = %dir.display(), "Routes directory not found; no routes loaded");
        return Ok(entries);
    }

    let mut paths: Vec<_> = std::fs::read_dir(dir)
        .map_err(ConfigError::Io)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    for path in paths {
        let raw = std::fs::read_to_string(&path).map_err(ConfigError::Io)?;
        let document: Value = serde_json::from_str(&raw).map_err(ConfigError::ParseRoutes)?;

        let Some(default) = document.get("default").filter(|d| d.is_object()) else {
            tracing::warn!(file = %path.display(), "Route document has no default block; skipped");
            continue;
        };

        let routes = document
            .get("routes")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        for route in routes {
            let merged = deep_merge(default.clone(), route);
            let entry: RouteEntry =
                serde_json::from_value(merged).map_err(ConfigError::ParseRoutes)?;
            entries.push(entry);
        }
    }

    tracing::info!(count = entries.len(), "Route entries loaded");
    Ok(entries)
}
