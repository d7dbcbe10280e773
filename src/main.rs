//! nodeprobe: node identity and backing-store health endpoint.
//!
//! This is the application entry point. It loads configuration from a TOML file
//! and the environment, initializes tracing, builds the probes, sets up the
//! Axum router and starts the HTTP server.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nodeprobe::config::{AppConfig, DEFAULT_CONFIG_PATH, DEFAULT_LOG_FILTER};
use nodeprobe::http::start_server;
use nodeprobe::{create_router, AppState};

/// nodeprobe: reports node identity and cache/database health
#[derive(Parser, Debug)]
#[command(name = "nodeprobe", version, about)]
struct Args {
    /// Path to configuration file (optional when configured via environment)
    #[arg(short, long)]
    config: Option<String>,

    /// Log level filter (e.g., "nodeprobe=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // An explicitly named file must exist; the default path is optional
    let config = match &args.config {
        Some(path) => AppConfig::load(path, true)?,
        None => AppConfig::load(DEFAULT_CONFIG_PATH, false)?,
    };

    // Initialize tracing with priority: CLI > env > default
    let log_filter = args
        .log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let registry =
        tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(&log_filter));
    if config.logging.is_json() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    match &config.source {
        Some(path) => {
            tracing::info!(node = %config.node.name, path = %path.display(), "Loaded configuration")
        }
        None => tracing::info!(
            node = %config.node.name,
            "No config file found, using defaults and environment"
        ),
    }
    tracing::info!(
        host = %config.cache.host,
        port = config.cache.port,
        timeout_secs = config.cache.timeout_seconds,
        "Cache probe configured"
    );
    tracing::info!(
        driver = %config.database.driver,
        username = %config.database.username,
        has_password = config.database.has_password(),
        ensure_schema = config.database.ensure_schema,
        timeout_secs = config.database.timeout_seconds,
        "Database probe configured"
    );

    let state = AppState::new(config.clone());
    let app = create_router(state);

    start_server(app, &config).await?;

    Ok(())
}
