//! Per-route capability chain.
//!
//! # Data Flow
//! ```text
//! Matched Route
//!     → authorize phase   (registration order, first non-pass wins)
//!     → request phase     (may short-circuit, e.g. cache hit)
//!     → [dispatcher forwards to a backend]
//!     → response phase    (all run, side effects only)
//! ```
//!
//! # Design Decisions
//! - One trait, three hooks, each defaulting to a success no-op
//! - Capabilities are an ordered list of trait objects, not a dispatch
//!   table; registration order is the execution order
//! - No back-reference to the owning Route: each capability is built at
//!   route-load time from its own configuration sub-object
//! - Hooks see the immutable inbound request plus the mutable outbound
//!   parts, so a later capability never observes another's header edits
//!   on the inbound side

use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::http::response::ApiResponse;

pub mod account;
pub mod cache;
pub mod host;

pub use account::AccountAuth;
pub use cache::ResponseCache;
pub use host::HostFilter;

/// Immutable view of the inbound request, shared by every hook.
#[derive(Debug)]
pub struct InboundRequest {
    pub method: Method,
    /// Cleaned path: query stripped, trailing slashes stripped.
    pub path: String,
    /// Raw query string, if any; forwarded untouched.
    pub query: Option<String>,
    /// Lowercased hostname without port, if the request carried one.
    pub host: Option<String>,
    pub headers: HeaderMap,
}

/// Mutable outbound parts handed through the request phase.
#[derive(Debug)]
pub struct ForwardedRequest {
    /// Headers for the backend call; hop-by-hop headers already removed.
    pub headers: HeaderMap,
    /// Raw body bytes, forwarded verbatim unless `json` is set.
    pub body: Bytes,
    /// Decoded body for body-carrying methods; `None` means the bytes
    /// were not structured and go out unparsed.
    pub json: Option<Value>,
}

/// A buffered upstream (or cached) response.
#[derive(Debug, Clone)]
pub struct ProxiedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl IntoResponse for ProxiedResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Outcome of a single hook invocation.
#[derive(Debug)]
pub enum Verdict {
    /// Continue with the next capability.
    Pass,
    /// Stop the chain and answer with an envelope.
    Deny(ApiResponse),
    /// Stop the chain and serve a full response (e.g. a cache hit).
    Serve(ProxiedResponse),
}

/// A pluggable unit of route behavior with three extension points.
#[async_trait]
pub trait RouteCapability: Send + Sync {
    /// Capability name; also the key of its config sub-object.
    fn name(&self) -> &'static str;

    /// Authorization check, run before anything is forwarded.
    async fn authorize(&self, _request: &InboundRequest) -> Verdict {
        Verdict::Pass
    }

    /// Request-phase hook; may mutate the outbound parts or short-circuit.
    async fn handle_request(
        &self,
        _request: &InboundRequest,
        _forward: &mut ForwardedRequest,
    ) -> Verdict {
        Verdict::Pass
    }

    /// Response-phase hook; side effects only, never short-circuits.
    async fn after_response(&self, _request: &InboundRequest, _response: &ProxiedResponse) {}
}
