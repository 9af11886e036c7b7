//! CLI command implementations.

pub(crate) mod routes;
pub(crate) mod serve;

use std::path::PathBuf;

use clap::Args;
use grove_config::{CliSettings, Config, MissingMetadataPolicy};
use grove_namespace::Markup;
use grove_namespace_fs::{FsNamespace, MarkerFiles};
use grove_router::{MissingMetadata, RenderOptions, RouteTable, discover};

use crate::error::CliError;

pub(crate) use routes::RoutesArgs;
pub(crate) use serve::ServeArgs;

/// Options shared by every command that discovers routes.
#[derive(Args)]
pub(crate) struct AppArgs {
    /// Path to configuration file (default: auto-discover grove.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Namespace root directory (overrides config).
    #[arg(short, long, env = "GROVE_APP_DIR")]
    app_dir: Option<PathBuf>,
}

impl AppArgs {
    /// Load configuration, applying the given server overrides.
    pub(crate) fn load(
        self,
        host: Option<String>,
        port: Option<u16>,
    ) -> Result<Config, CliError> {
        let cli_settings = CliSettings {
            host,
            port,
            app_dir: self.app_dir,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        tracing::debug!(
            config_path = ?config.config_path,
            app_dir = %config.app_resolved.dir.display(),
            "Loaded configuration"
        );
        Ok(config)
    }
}

/// Directory-backed namespace described by `config`.
fn build_namespace(config: &Config) -> Result<FsNamespace, CliError> {
    let dir = &config.app_resolved.dir;
    if !dir.is_dir() {
        return Err(CliError::Validation(format!(
            "App directory does not exist: {}",
            dir.display()
        )));
    }

    Ok(FsNamespace::new(dir.clone()).with_files(MarkerFiles {
        layout: config.files.layout.clone(),
        page: config.files.page.clone(),
        metadata: config.files.metadata.clone(),
    }))
}

/// Render options from the `[render]` and `[slots]` sections.
fn render_options(config: &Config) -> Result<RenderOptions, CliError> {
    let default_slots = config
        .read_default_slots()?
        .into_iter()
        .map(|(name, content)| (name, Markup::raw(content)))
        .collect();
    let missing_metadata = match config.render.missing_metadata {
        MissingMetadataPolicy::Error => MissingMetadata::Error,
        MissingMetadataPolicy::Empty => MissingMetadata::Empty,
    };
    Ok(RenderOptions {
        default_slots,
        missing_metadata,
    })
}

/// Discover the route table for `config`.
pub(crate) fn discover_routes(config: &Config) -> Result<RouteTable, CliError> {
    let namespace = build_namespace(config)?;
    let options = render_options(config)?;
    Ok(discover(&namespace, options)?)
}
