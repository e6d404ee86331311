//! Dashboard HTTP Server Binary
//!
//! Serves the single-page dashboard and its JSON API.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin tsml-server
//!
//! # With an explicit configuration file
//! DASHBOARD_CONFIG=./dashboard.toml cargo run --bin tsml-server
//! ```
//!
//! # Environment Variables
//!
//! - `DASHBOARD_CONFIG`: Path to a TOML config file (default: search for `dashboard.toml`)
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `RUST_LOG`: Log filter (default: info)

use std::env;
use std::net::SocketAddr;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tsml::config::{ConfigError, DashboardConfig};
use tsml::http::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting dashboard HTTP server");

    let config = load_config()?.apply_overrides(|name| env::var(name).ok())?;
    info!(
        cache_tables = config.cache.max_tables,
        criterion = %config.forecast.criterion,
        "Configuration loaded"
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let app = create_router(AppState::new(config));

    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn load_config() -> anyhow::Result<DashboardConfig> {
    if let Ok(path) = env::var("DASHBOARD_CONFIG") {
        info!(path = %path, "Loading configuration");
        return Ok(DashboardConfig::from_file(path)?);
    }

    match DashboardConfig::from_default_location() {
        Ok(config) => Ok(config),
        Err(ConfigError::NotFound) => {
            warn!("No dashboard.toml found, using defaults");
            Ok(DashboardConfig::default())
        }
        Err(e) => Err(e.into()),
    }
}
