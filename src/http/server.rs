//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the axum router: auth endpoints plus the catch-all proxy
//! - Wire up middleware (timeout, request ID, tracing)
//! - Serve with graceful shutdown
//!
//! # Design Decisions
//! - `/register` and `/authenticate` are the only non-proxied paths;
//!   everything else flows through the dispatcher
//! - Middleware mirrors the inbound surface only; the outbound leg is the
//!   dispatcher's concern

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::{any, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::Authenticator;
use crate::config::{GatewayConfig, RouteEntry};
use crate::dispatch::Dispatcher;
use crate::http::handlers;
use crate::routing::RouteRegistry;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub authenticator: Arc<Authenticator>,
    pub registration_key: String,
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
}

impl GatewayServer {
    /// Compile the route registry and assemble the server.
    pub fn new(
        config: GatewayConfig,
        authenticator: Arc<Authenticator>,
        entries: &[RouteEntry],
    ) -> Self {
        let registry = RouteRegistry::compile(entries, authenticator.clone());
        let dispatcher = Arc::new(Dispatcher::new(
            registry,
            &config.timeouts,
            &config.listener,
        ));

        let state = AppState {
            dispatcher,
            authenticator,
            registration_key: config.auth.registration_key.clone(),
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/register", post(handlers::register))
            .route("/authenticate", post(handlers::authenticate))
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Gateway listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Gateway stopped");
        Ok(())
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Catch-all handler: every unclaimed path goes through the dispatcher.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.dispatcher.dispatch(request).await
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
