use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;

use gatewarden::auth::{Authenticator, JsonUserStore};
use gatewarden::config::{self, validation, GatewayConfig};
use gatewarden::observability::{logging, metrics};
use gatewarden::GatewayServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config/gateway.toml"));

    let config = if config_path.exists() {
        config::load_config(&config_path)?
    } else {
        GatewayConfig::default()
    };

    logging::init(&config.observability.log_level);
    tracing::info!("gatewarden v{} starting", env!("CARGO_PKG_VERSION"));
    if !config_path.exists() {
        tracing::warn!(path = %config_path.display(), "Config file not found; using defaults");
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes_dir = %config.routes_dir,
        request_timeout_secs = config.timeouts.request_secs,
        backend_timeout_secs = config.timeouts.backend_secs,
        "Configuration loaded"
    );

    // Route documents: fatal on semantic errors, the registry must be
    // trustworthy before traffic arrives.
    let entries = config::load_route_entries(Path::new(&config.routes_dir))?;
    if let Err(errors) = validation::validate_routes(&entries) {
        for error in &errors {
            tracing::error!(%error, "Route validation failed");
        }
        return Err("invalid route configuration".into());
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let store = Arc::new(JsonUserStore::open(&config.auth.store_path)?);
    let authenticator = Arc::new(Authenticator::new(store, &config.auth));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let server = GatewayServer::new(config, authenticator, &entries);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
