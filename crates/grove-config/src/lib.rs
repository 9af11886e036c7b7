//! Configuration management for Grove.
//!
//! Parses `grove.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `server.host`
//! - `app.dir`

mod expand;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override application namespace directory.
    pub app_dir: Option<PathBuf>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "grove.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Application configuration (paths are relative strings from TOML).
    app: AppConfigRaw,
    /// Marker file names.
    pub files: FilesConfig,
    /// Render behavior.
    pub render: RenderConfig,
    /// Default slot content files, keyed by slot name.
    slots: BTreeMap<String, String>,

    /// Resolved application configuration (set after loading).
    #[serde(skip)]
    pub app_resolved: AppConfig,
    /// Resolved default slot files (set after loading).
    #[serde(skip)]
    pub slots_resolved: BTreeMap<String, PathBuf>,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
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

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct AppConfigRaw {
    dir: Option<String>,
}

/// Resolved application configuration with absolute paths.
#[derive(Debug, Default)]
pub struct AppConfig {
    /// Root directory of the routing namespace.
    pub dir: PathBuf,
}

/// File names recognized as markers inside namespace directories.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Template layout file.
    pub layout: String,
    /// Static page file.
    pub page: String,
    /// Page metadata file.
    pub metadata: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            layout: "layout.html".to_owned(),
            page: "page.html".to_owned(),
            metadata: "meta.yaml".to_owned(),
        }
    }
}

/// What to do when a template references a metadata key nobody supplied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingMetadataPolicy {
    /// Fail the request.
    #[default]
    Error,
    /// Interpolate an empty string.
    Empty,
}

/// Render configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Policy for missing metadata keys.
    pub missing_metadata: MissingMetadataPolicy,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`server.host`").
        field: String,
        /// Error message (e.g., "${`GROVE_HOST`} not set").
        message: String,
    },
    /// A default slot file could not be read.
    #[error("Cannot read slot '{name}' from {}: {source}", .path.display())]
    SlotFile {
        /// Slot name.
        name: String,
        /// Resolved file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a marker file name to be a single path component.
fn require_file_name(value: &str, field: &str) -> Result<(), ConfigError> {
    require_non_empty(value, field)?;
    if value.contains(['/', '\\']) || value == "." || value == ".." {
        return Err(ConfigError::Validation(format!(
            "{field} must be a plain file name, got '{value}'"
        )));
    }
    Ok(())
}

/// Check that a slot name matches `[A-Za-z_][A-Za-z0-9_]*`.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `grove.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(app_dir) = &settings.app_dir {
            self.app_resolved.dir.clone_from(app_dir);
        }
    }

    /// Read every configured default slot file.
    ///
    /// Returns slot name to file content, in slot name order.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::SlotFile` naming the first slot whose file can't be read.
    pub fn read_default_slots(&self) -> Result<BTreeMap<String, String>, ConfigError> {
        self.slots_resolved
            .iter()
            .map(|(name, path)| {
                std::fs::read_to_string(path)
                    .map(|content| (name.clone(), content))
                    .map_err(|source| ConfigError::SlotFile {
                        name: name.clone(),
                        path: path.clone(),
                        source,
                    })
            })
            .collect()
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            server: ServerConfig::default(),
            app: AppConfigRaw::default(),
            files: FilesConfig::default(),
            render: RenderConfig::default(),
            slots: BTreeMap::new(),
            app_resolved: AppConfig {
                dir: base.join("app"),
            },
            slots_resolved: BTreeMap::new(),
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_files()?;
        self.validate_slots()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        // Port 0 lets the OS pick, which is never what a config file means
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        Ok(())
    }

    fn validate_files(&self) -> Result<(), ConfigError> {
        require_file_name(&self.files.layout, "files.layout")?;
        require_file_name(&self.files.page, "files.page")?;
        require_file_name(&self.files.metadata, "files.metadata")?;

        let names = [&self.files.layout, &self.files.page, &self.files.metadata];
        for (i, name) in names.iter().enumerate() {
            if names[i + 1..].contains(name) {
                return Err(ConfigError::Validation(format!(
                    "file name '{name}' is used for more than one marker in [files]"
                )));
            }
        }
        Ok(())
    }

    fn validate_slots(&self) -> Result<(), ConfigError> {
        for name in self.slots.keys().chain(self.slots_resolved.keys()) {
            if !is_identifier(name) {
                return Err(ConfigError::Validation(format!(
                    "slots.{name}: slot names must match [A-Za-z_][A-Za-z0-9_]*"
                )));
            }
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;

        if let Some(ref dir) = self.app.dir {
            self.app.dir = Some(expand::expand_env(dir, "app.dir")?);
        }

        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.app_resolved = AppConfig {
            dir: config_dir.join(self.app.dir.as_deref().unwrap_or("app")),
        };

        self.slots_resolved = self
            .slots
            .iter()
            .map(|(name, file)| (name.clone(), config_dir.join(file)))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 7878);
        assert_eq!(config.app_resolved.dir, PathBuf::from("/test/app"));
        assert_eq!(config.files.layout, "layout.html");
        assert_eq!(config.files.page, "page.html");
        assert_eq!(config.files.metadata, "meta.yaml");
        assert_eq!(
            config.render.missing_metadata,
            MissingMetadataPolicy::Error
        );
        assert!(config.slots_resolved.is_empty());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 7878);
    }

    #[test]
    fn test_parse_server_config() {
        let toml = r#"
[server]
host = "0.0.0.0"
port = 9000
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_parse_render_policy() {
        let toml = r#"
[render]
missing_metadata = "empty"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.render.missing_metadata,
            MissingMetadataPolicy::Empty
        );
    }

    #[test]
    fn test_parse_unknown_policy_fails() {
        let toml = r#"
[render]
missing_metadata = "ignore"
"#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn test_parse_files_config() {
        let toml = r#"
[files]
layout = "_layout.html"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.files.layout, "_layout.html");
        assert_eq!(config.files.page, "page.html");
    }

    #[test]
    fn test_resolve_paths() {
        let toml = r#"
[app]
dir = "routes"

[slots]
navbar = "partials/navbar.html"
footer = "footer.html"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(config.app_resolved.dir, PathBuf::from("/project/routes"));
        assert_eq!(
            config.slots_resolved.get("navbar"),
            Some(&PathBuf::from("/project/partials/navbar.html"))
        );
        assert_eq!(
            config.slots_resolved.get("footer"),
            Some(&PathBuf::from("/project/footer.html"))
        );
    }

    #[test]
    fn test_apply_cli_settings_host() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let settings = CliSettings {
            host: Some("0.0.0.0".to_owned()),
            ..Default::default()
        };
        config.apply_cli_settings(&settings);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 7878);
    }

    #[test]
    fn test_apply_cli_settings_multiple() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let settings = CliSettings {
            host: None,
            port: Some(3000),
            app_dir: Some(PathBuf::from("/elsewhere")),
        };
        config.apply_cli_settings(&settings);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.app_resolved.dir, PathBuf::from("/elsewhere"));
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.apply_cli_settings(&CliSettings::default());
        assert_eq!(config.server.port, 7878);
        assert_eq!(config.app_resolved.dir, PathBuf::from("/test/app"));
    }

    #[test]
    fn test_expand_env_vars_server_host() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("GROVE_CFG_HOST", "0.0.0.0");
        }
        let toml = r#"
[server]
host = "${GROVE_CFG_HOST}"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.expand_env_vars().unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        unsafe {
            std::env::remove_var("GROVE_CFG_HOST");
        }
    }

    #[test]
    fn test_expand_env_vars_app_dir_default() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("GROVE_CFG_APP_DIR");
        }
        let toml = r#"
[app]
dir = "${GROVE_CFG_APP_DIR:-site}"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.expand_env_vars().unwrap();
        config.resolve_paths(Path::new("/project"));
        assert_eq!(config.app_resolved.dir, PathBuf::from("/project/site"));
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let result = Config::load(Some(Path::new("/nonexistent/grove.toml")), None);
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_from_file_resolves_relative_to_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grove.toml");
        std::fs::write(&path, "[app]\ndir = \"pages\"\n[server]\nport = 8001\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(config.app_resolved.dir, dir.path().join("pages"));
        assert_eq!(config.server.port, 8001);
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_read_default_slots() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("nav.html"), "<nav>home</nav>").unwrap();
        let path = dir.path().join("grove.toml");
        std::fs::write(&path, "[slots]\nnavbar = \"nav.html\"\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();
        let slots = config.read_default_slots().unwrap();
        assert_eq!(slots.get("navbar").map(String::as_str), Some("<nav>home</nav>"));
    }

    #[test]
    fn test_read_default_slots_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grove.toml");
        std::fs::write(&path, "[slots]\nnavbar = \"missing.html\"\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();
        let err = config.read_default_slots().unwrap_err();
        assert!(matches!(err, ConfigError::SlotFile { ref name, .. } if name == "navbar"));
    }

    // Validation tests

    /// Assert that validation fails with expected substrings in the error message.
    fn assert_validation_error(config: &Config, expected_substrings: &[&str]) {
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        let msg = err.to_string();
        for s in expected_substrings {
            assert!(
                msg.contains(s),
                "Expected error to contain '{s}', got: {msg}"
            );
        }
    }

    #[test]
    fn test_validate_default_config_passes() {
        let config = Config::default_with_base(Path::new("/test"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_server_host_empty() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.server.host = String::new();
        assert_validation_error(&config, &["server.host", "empty"]);
    }

    #[test]
    fn test_validate_server_port_zero() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.server.port = 0;
        assert_validation_error(&config, &["server.port"]);
    }

    #[test]
    fn test_validate_file_name_with_separator() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.files.layout = "nested/layout.html".to_owned();
        assert_validation_error(&config, &["files.layout", "plain file name"]);
    }

    #[test]
    fn test_validate_duplicate_file_names() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.files.page = "layout.html".to_owned();
        assert_validation_error(&config, &["layout.html", "more than one"]);
    }

    #[test]
    fn test_validate_slot_name() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config
            .slots_resolved
            .insert("nav-bar".to_owned(), PathBuf::from("/test/nav.html"));
        assert_validation_error(&config, &["nav-bar"]);
    }
}
