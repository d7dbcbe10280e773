//! HTTP server startup logic.

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;

use crate::config::AppConfig;

/// Server startup error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid http.host or http.port: {0}")]
    Address(#[from] std::net::AddrParseError),

    #[error("Failed to bind server: {0}")]
    Bind(std::io::Error),

    #[error("Server error: {0}")]
    Server(std::io::Error),
}

/// Resolve the listen address from configuration.
pub fn listen_addr(config: &AppConfig) -> Result<SocketAddr, ServerError> {
    let host = &config.http.host;
    // Bare IPv6 literals need brackets to parse as a socket address
    let addr = if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, config.http.port)
    } else {
        format!("{}:{}", host, config.http.port)
    };
    Ok(addr.parse()?)
}

/// Start the HTTP server.
///
/// This function blocks until the server stops.
pub async fn start_server(app: Router, config: &AppConfig) -> Result<(), ServerError> {
    let addr = listen_addr(config)?;
    let listener = TcpListener::bind(addr).await.map_err(ServerError::Bind)?;

    tracing::info!(%addr, "Starting HTTP server");

    axum::serve(listener, app).await.map_err(ServerError::Server)
}
