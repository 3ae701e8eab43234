use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gps_ingest::{
    config,
    server,
    services::store::{self, DynStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gps_ingest=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenv::dotenv().ok();
    let config = config::Config::from_env().context("Failed to load configuration")?;

    info!("Starting GPS ingest service");

    // Store client is created once and shared by every request
    let database = store::shared_database(&config.firebase)
        .await
        .context("Failed to initialize Realtime Database client")?;
    let app = server::router(&config, database as DynStore);

    let addr: std::net::SocketAddr = format!("0.0.0.0:{}", config.port)
        .parse()
        .context("Invalid listen address")?;
    info!("HTTP server listening on {}", addr);
    info!(
        "Accepting coordinates at {} (stored under {})",
        config.gps_endpoint_path, config.gps_collection_path
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .await
        .context("HTTP server failed")?;

    info!("Shutting down...");
    Ok(())
}
