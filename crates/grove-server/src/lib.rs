//! HTTP server for Grove.
//!
//! Serves a discovered [`RouteTable`] with axum: every route is registered
//! under its URL pattern and method, requests are rendered through the
//! route's layout chain, and failures go through the application's root
//! error handlers.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use grove_namespace_fs::FsNamespace;
//! use grove_router::{RenderOptions, discover};
//! use grove_server::{ServerConfig, run_server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let table = discover(&FsNamespace::new("app"), RenderOptions::default())?;
//!     run_server(ServerConfig::default(), Arc::new(table)).await?;
//!     Ok(())
//! }
//! ```

mod app;
mod error;
mod handlers;
mod response;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use grove_router::RouteTable;

pub use app::create_router;
pub use error::ServerError;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 7878,
        }
    }
}

impl ServerConfig {
    fn address(&self) -> Result<SocketAddr, ServerError> {
        let address = format!("{}:{}", self.host, self.port);
        address
            .parse()
            .map_err(|source| ServerError::InvalidAddress { address, source })
    }
}

/// Run the server until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address is invalid, the listener can't be bound,
/// or serving fails.
pub async fn run_server(config: ServerConfig, table: Arc<RouteTable>) -> Result<(), ServerError> {
    let routes = table.len();
    let app = create_router(table);

    let addr = config.address()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            address: addr.to_string(),
            source,
        })?;
    tracing::info!(address = %addr, routes, "Starting server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C, serving until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}

/// Create server configuration from Grove config.
#[must_use]
pub fn server_config_from_config(config: &grove_config::Config) -> ServerConfig {
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    }
}
