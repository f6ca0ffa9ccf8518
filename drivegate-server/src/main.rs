mod config;
mod handlers;
mod routes;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use drivegate_graph::{ClientFactory, GraphOptions, MemoryCache, StaticToken};

use config::ServerConfig;
use state::AppState;

const DEFAULT_CONFIG_PATH: &str = "server.toml";
const TOKEN_ENV: &str = "DRIVEGATE_TOKEN";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    info!("drivegate-server starting");

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = ServerConfig::load(&PathBuf::from(&config_path))?;
    info!(config = %config_path, "Configuration loaded");

    let tokens = Arc::new(StaticToken::from_env(TOKEN_ENV)?);
    let factory = ClientFactory::new(
        GraphOptions {
            base_url: config.graph_base_url.clone(),
            site_host: config.site_host.clone(),
        },
        Arc::new(MemoryCache::new()),
        tokens,
    );

    let state = Arc::new(AppState::new(factory));
    let app = routes::build_router(state).layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.listen_port));
    info!(port = config.listen_port, "Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
