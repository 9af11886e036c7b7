//! `grove serve` command implementation.

use std::sync::Arc;

use clap::Args;
use grove_server::{run_server, server_config_from_config};

use super::{AppArgs, discover_routes};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    #[command(flatten)]
    app: AppArgs,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose output (log discovery and per-request details).
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration or discovery fails, or the server
    /// fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.app.load(self.host, self.port)?;

        output.info(&format!(
            "Starting server on {}:{}",
            config.server.host, config.server.port
        ));
        output.info(&format!(
            "App directory: {}",
            config.app_resolved.dir.display()
        ));

        let table = discover_routes(&config)?;
        output.info(&format!("Discovered {} routes", table.len()));

        run_server(server_config_from_config(&config), Arc::new(table)).await?;

        Ok(())
    }
}
