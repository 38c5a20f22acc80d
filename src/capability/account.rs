//! Group-based access control and identity header injection.
//!
//! # Responsibilities
//! - Gate the route on the caller's `group` metadata
//! - Strip the raw `Authorization` header before forwarding
//! - Assert the resolved identity to the backend via `x-User-*` headers
//!
//! # Design Decisions
//! - An empty allowed-group list disables the check entirely
//! - Backends trust gateway-asserted identity instead of re-resolving
//!   credentials; only allow-listed metadata keys are relayed

use async_trait::async_trait;
use axum::http::{
    header::AUTHORIZATION,
    HeaderName, HeaderValue,
};
use serde_json::Value;
use std::sync::Arc;

use crate::auth::{AuthenticatedUser, Authenticator};
use crate::capability::{ForwardedRequest, InboundRequest, RouteCapability, Verdict};
use crate::config::AccountConfig;
use crate::http::response::ApiResponse;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_METADATA_PREFIX: &str = "x-user-metadata-";

/// Requires the caller's identity to belong to one of the allowed groups.
pub struct AccountAuth {
    allowed_groups: Vec<String>,
    public_meta_keys: Vec<String>,
    authenticator: Arc<Authenticator>,
}

impl AccountAuth {
    pub fn new(config: &AccountConfig, authenticator: Arc<Authenticator>) -> Self {
        Self {
            allowed_groups: config.allowed_groups.clone(),
            public_meta_keys: config.public_meta_key.clone(),
            authenticator,
        }
    }

    async fn resolve(&self, request: &InboundRequest) -> Option<AuthenticatedUser> {
        let credential = request.headers.get(AUTHORIZATION)?.to_str().ok()?;
        self.authenticator.resolve_credential(credential).await
    }

    fn inject_identity(&self, forward: &mut ForwardedRequest, user: &AuthenticatedUser) {
        // never relay raw credentials upstream
        forward.headers.remove(AUTHORIZATION);

        if let Ok(value) = HeaderValue::from_str(&user.user_id) {
            forward.headers.insert(USER_ID_HEADER, value);
        }
        if let Ok(value) = HeaderValue::from_str(&user.username) {
            forward.headers.insert(USER_NAME_HEADER, value);
        }
        for key in &self.public_meta_keys {
            let Some(meta) = user.metadata.get(key) else {
                continue;
            };
            let text = match meta {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let name = format!("{USER_METADATA_PREFIX}{}", key.to_lowercase());
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&text),
            ) {
                (Ok(name), Ok(value)) => {
                    forward.headers.insert(name, value);
                }
                _ => {
                    tracing::debug!(key = %key, "Metadata key not representable as header; skipped")
                }
            }
        }
    }
}

#[async_trait]
impl RouteCapability for AccountAuth {
    fn name(&self) -> &'static str {
        "account"
    }

    async fn authorize(&self, request: &InboundRequest) -> Verdict {
        if self.allowed_groups.is_empty() {
            return Verdict::Pass;
        }
        if !request.headers.contains_key(AUTHORIZATION) {
            return Verdict::Deny(ApiResponse::unauthorized());
        }
        let Some(user) = self.resolve(request).await else {
            tracing::debug!("Authorization rejected: credential did not resolve");
            return Verdict::Deny(ApiResponse::unauthorized());
        };
        let Some(group) = user.metadata.get("group").and_then(Value::as_str) else {
            tracing::debug!(user_id = %user.user_id, "Authorization rejected: no group");
            return Verdict::Deny(ApiResponse::unauthorized());
        };
        if !self.allowed_groups.iter().any(|allowed| allowed == group) {
            tracing::debug!(user_id = %user.user_id, group = %group, "Authorization rejected: group not allowed");
            return Verdict::Deny(ApiResponse::unauthorized());
        }
        Verdict::Pass
    }

    async fn handle_request(
        &self,
        request: &InboundRequest,
        forward: &mut ForwardedRequest,
    ) -> Verdict {
        match self.resolve(request).await {
            Some(user) => {
                self.inject_identity(forward, &user);
                Verdict::Pass
            }
            // without an identity the header rewrite is moot; the gate
            // itself only applies when groups are configured
            None if self.allowed_groups.is_empty() => Verdict::Pass,
            None => Verdict::Deny(ApiResponse::unauthorized()),
        }
    }
}
