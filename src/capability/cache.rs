//! Response memoization per route.
//!
//! # Responsibilities
//! - Serve a recent identical response instead of re-forwarding
//! - Keep one slot per resolved user plus one global slot
//!
//! # Design Decisions
//! - `interval == 0` disables both hooks entirely
//! - Per-user caching takes precedence: once an identity resolves, the
//!   global slot is neither consulted nor written for that request
//! - Slots hold fully buffered responses; a hit short-circuits the chain
//!   before any backend is selected

use async_trait::async_trait;
use axum::http::header::AUTHORIZATION;
use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::auth::Authenticator;
use crate::capability::{
    ForwardedRequest, InboundRequest, ProxiedResponse, RouteCapability, Verdict,
};
use crate::config::CacheConfig;

#[derive(Debug, Clone)]
struct CachedEntry {
    response: ProxiedResponse,
    stored_at: Instant,
}

impl CachedEntry {
    fn fresh(&self, interval: Duration) -> bool {
        self.stored_at.elapsed() < interval
    }
}

/// Time-bounded response memoization, per user and/or global.
pub struct ResponseCache {
    interval: Duration,
    user_cached: bool,
    global_cached: bool,
    authenticator: Arc<Authenticator>,
    per_user: DashMap<String, CachedEntry>,
    global: Mutex<Option<CachedEntry>>,
}

impl ResponseCache {
    pub fn new(config: &CacheConfig, authenticator: Arc<Authenticator>) -> Self {
        Self {
            interval: Duration::from_secs(config.interval),
            user_cached: config.user_cached,
            global_cached: config.global_cached,
            authenticator,
            per_user: DashMap::new(),
            global: Mutex::new(None),
        }
    }

    fn disabled(&self) -> bool {
        self.interval.is_zero()
    }

    async fn resolve_user_id(&self, request: &InboundRequest) -> Option<String> {
        let credential = request.headers.get(AUTHORIZATION)?.to_str().ok()?;
        self.authenticator
            .resolve_credential(credential)
            .await
            .map(|user| user.user_id)
    }
}

#[async_trait]
impl RouteCapability for ResponseCache {
    fn name(&self) -> &'static str {
        "cache"
    }

    async fn handle_request(
        &self,
        request: &InboundRequest,
        _forward: &mut ForwardedRequest,
    ) -> Verdict {
        if self.disabled() {
            return Verdict::Pass;
        }

        if self.user_cached {
            if let Some(user_id) = self.resolve_user_id(request).await {
                if let Some(entry) = self.per_user.get(&user_id) {
                    if entry.fresh(self.interval) {
                        tracing::debug!(user_id = %user_id, "Serving per-user cached response");
                        return Verdict::Serve(entry.response.clone());
                    }
                }
                // identity resolved: the global slot does not apply
                return Verdict::Pass;
            }
        }

        if self.global_cached {
            let slot = self.global.lock().expect("cache mutex poisoned");
            if let Some(entry) = slot.as_ref() {
                if entry.fresh(self.interval) {
                    tracing::debug!("Serving global cached response");
                    return Verdict::Serve(entry.response.clone());
                }
            }
        }

        Verdict::Pass
    }

    async fn after_response(&self, request: &InboundRequest, response: &ProxiedResponse) {
        if self.disabled() {
            return;
        }

        let entry = CachedEntry {
            response: response.clone(),
            stored_at: Instant::now(),
        };

        if self.user_cached {
            if let Some(user_id) = self.resolve_user_id(request).await {
                self.per_user.insert(user_id, entry);
                return;
            }
        }

        if self.global_cached {
            *self.global.lock().expect("cache mutex poisoned") = Some(entry);
        }
    }
}
