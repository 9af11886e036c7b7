//! `grove routes` command implementation.

use clap::Args;
use grove_router::{RouteEntry, RouteTable};

use super::{AppArgs, discover_routes};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the routes command.
#[derive(Args)]
pub(crate) struct RoutesArgs {
    #[command(flatten)]
    app: AppArgs,

    /// Also list each route's layout chain.
    #[arg(short, long)]
    layouts: bool,

    /// Enable verbose output (log discovery details).
    #[arg(short, long)]
    pub verbose: bool,
}

impl RoutesArgs {
    /// Execute the routes command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration or discovery fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.app.load(None, None)?;
        let table = discover_routes(&config)?;

        if table.is_empty() {
            output.info(&format!(
                "No routes found in {}",
                config.app_resolved.dir.display()
            ));
            return Ok(());
        }

        output.heading(&format!("{} routes", table.len()));
        for (route, line) in table.routes().iter().zip(route_lines(&table)) {
            output.line(&line);
            if self.layouts {
                for layout in layout_lines(route) {
                    output.note(&layout);
                }
            }
        }

        Ok(())
    }
}

/// One aligned `METHOD PATTERN NAME (kind)` line per route.
fn route_lines(table: &RouteTable) -> Vec<String> {
    let width = table
        .routes()
        .iter()
        .map(|r| r.url_pattern.len())
        .max()
        .unwrap_or(0);

    table
        .routes()
        .iter()
        .map(|r| {
            format!(
                "{:<6} {:<width$} {} ({})",
                r.method.as_str(),
                r.url_pattern,
                r.name,
                r.kind
            )
        })
        .collect()
}

/// Layout chain of `route`, outermost first.
fn layout_lines(route: &RouteEntry) -> Vec<String> {
    if !route.wrapped {
        return vec!["    unwrapped".to_owned()];
    }
    if route.layout_chain.is_empty() {
        return vec!["    no layouts".to_owned()];
    }
    route
        .layout_chain
        .iter()
        .map(|layout| {
            let path = if layout.path().is_empty() {
                "/"
            } else {
                layout.path()
            };
            format!("    layout {path}")
        })
        .collect()
}
