//! Gateway dispatcher.
//!
//! # Responsibilities
//! - Select the route for an inbound request
//! - Run the capability chain: authorize → request phase → response phase
//! - Forward to a uniformly random backend with a bounded outbound call
//! - Relay the backend response, hop-by-hop headers stripped
//!
//! # Design Decisions
//! - Authorization and request phases short-circuit on the first non-pass
//!   verdict; the response phase always runs in full (side effects only)
//! - Stateless load balancing: uniform random choice, no health checks,
//!   no session affinity, no retries
//! - Bodies are buffered: capabilities may inspect the decoded JSON and
//!   the cache capability needs a reusable response
//! - A parse failure on a body-carrying method is not an error; the raw
//!   bytes are forwarded unparsed

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, HeaderValue, Method, Request},
    response::{IntoResponse, Response},
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use rand::seq::SliceRandom;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::capability::{ForwardedRequest, InboundRequest, ProxiedResponse, Verdict};
use crate::config::{ListenerConfig, TimeoutConfig};
use crate::http::response::ApiResponse;
use crate::observability::metrics;
use crate::routing::{clean_path, Route, RouteRegistry};

/// Error type for the forwarding leg.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("backend call timed out")]
    Timeout,
    #[error("upstream error: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),
    #[error("invalid outbound request: {0}")]
    InvalidRequest(#[from] axum::http::Error),
    #[error("failed to encode outbound body: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to read upstream body: {0}")]
    UpstreamBody(#[source] axum::Error),
    #[error("route has no backends")]
    NoBackends,
}

/// Owns the route registry and orchestrates request handling.
pub struct Dispatcher {
    registry: RouteRegistry,
    client: Client<HttpConnector, Body>,
    backend_timeout: Duration,
    max_body_bytes: usize,
}

impl Dispatcher {
    pub fn new(registry: RouteRegistry, timeouts: &TimeoutConfig, listener: &ListenerConfig) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            registry,
            client,
            backend_timeout: Duration::from_secs(timeouts.backend_secs),
            max_body_bytes: listener.max_body_bytes,
        }
    }

    /// Handle one proxied request end to end.
    pub async fn dispatch(&self, request: Request<Body>) -> Response {
        let (parts, body) = request.into_parts();
        let method = parts.method.clone();
        let host = host_of(&parts.headers);
        let raw_path = parts.uri.path().to_string();
        let query = parts.uri.query().map(str::to_string);
        let path = clean_path(&raw_path);

        tracing::debug!(method = %method, path = %raw_path, host = ?host, "Dispatching request");

        let Some(route) = self.registry.select(host.as_deref(), &path) else {
            tracing::debug!(path = %raw_path, "No route matched");
            return finish(&method, ApiResponse::route_not_found().into_response());
        };
        if route.backends().is_empty() {
            tracing::warn!(template = %route.template().source(), "Matched route has no backends");
            return finish(&method, ApiResponse::backend_not_found().into_response());
        }

        let bytes = match to_bytes(body, self.max_body_bytes).await {
            Ok(bytes) => bytes,
            Err(error) => {
                tracing::warn!(%error, "Failed to read request body");
                return finish(&method, ApiResponse::internal_error().into_response());
            }
        };
        let json = if carries_body(&method) && !bytes.is_empty() {
            serde_json::from_slice::<Value>(&bytes).ok()
        } else {
            None
        };

        let inbound = InboundRequest {
            method: method.clone(),
            path,
            query,
            host,
            headers: parts.headers,
        };

        // authorization phase: first non-pass verdict wins
        for capability in route.capabilities() {
            match capability.authorize(&inbound).await {
                Verdict::Pass => {}
                Verdict::Deny(envelope) => {
                    tracing::debug!(capability = capability.name(), "Request denied");
                    return finish(&method, envelope.into_response());
                }
                Verdict::Serve(response) => {
                    return finish(&method, response.into_response());
                }
            }
        }

        let mut forward_headers = inbound.headers.clone();
        for name in [header::HOST, header::CONNECTION, header::CONTENT_LENGTH] {
            forward_headers.remove(&name);
        }
        let mut forward = ForwardedRequest {
            headers: forward_headers,
            body: bytes,
            json,
        };

        // request phase: capabilities may rewrite the outbound parts or
        // short-circuit (cache hit)
        for capability in route.capabilities() {
            match capability.handle_request(&inbound, &mut forward).await {
                Verdict::Pass => {}
                Verdict::Deny(envelope) => {
                    tracing::debug!(capability = capability.name(), "Request-phase denial");
                    return finish(&method, envelope.into_response());
                }
                Verdict::Serve(response) => {
                    return finish(&method, response.into_response());
                }
            }
        }

        let proxied = match self.forward(&route, &inbound, forward).await {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!(%error, "Backend call failed");
                return finish(&method, ApiResponse::backend_disconnected().into_response());
            }
        };

        // response phase: all capabilities run, no short-circuit
        for capability in route.capabilities() {
            capability.after_response(&inbound, &proxied).await;
        }

        finish(&method, proxied.into_response())
    }

    async fn forward(
        &self,
        route: &Route,
        inbound: &InboundRequest,
        forward: ForwardedRequest,
    ) -> Result<ProxiedResponse, ForwardError> {
        let backend = route
            .backends()
            .choose(&mut rand::thread_rng())
            .ok_or(ForwardError::NoBackends)?;

        let mut path = inbound.path.as_str();
        if route.remove_prefix() {
            let consumed = route.template().matched_len(&inbound.path).unwrap_or(0);
            path = &inbound.path[consumed..];
        }

        let mut target = format!("{}{}", backend.as_str().trim_end_matches('/'), path);
        if let Some(query) = &inbound.query {
            target.push('?');
            target.push_str(query);
        }

        let body = match &forward.json {
            Some(json) => Body::from(serde_json::to_vec(json)?),
            None => Body::from(forward.body.clone()),
        };

        let mut builder = Request::builder().method(inbound.method.clone()).uri(target.as_str());
        if let Some(headers) = builder.headers_mut() {
            *headers = forward.headers.clone();
            if forward.json.is_some() {
                headers.insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                );
            }
        }
        let outbound = builder.body(body)?;

        tracing::debug!(backend = %target, "Forwarding request");
        let response = tokio::time::timeout(self.backend_timeout, self.client.request(outbound))
            .await
            .map_err(|_| ForwardError::Timeout)??;

        let (parts, body) = response.into_parts();
        let bytes = to_bytes(Body::new(body), usize::MAX)
            .await
            .map_err(ForwardError::UpstreamBody)?;

        // the relay re-frames the buffered body
        let mut headers = parts.headers;
        headers.remove(header::CONTENT_LENGTH);
        headers.remove(header::CONTENT_ENCODING);

        Ok(ProxiedResponse {
            status: parts.status,
            headers,
            body: bytes,
        })
    }
}

fn finish(method: &Method, response: Response) -> Response {
    metrics::record_request(method.as_str(), response.status().as_u16());
    response
}

/// Methods that conventionally carry a structured body.
fn carries_body(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT || *method == Method::PATCH
}

/// Lowercased hostname from the `Host` header, port stripped.
fn host_of(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::HOST)?.to_str().ok()?;
    let host = match raw.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => raw,
    };
    Some(host.trim_matches(['[', ']']).to_lowercase())
}
