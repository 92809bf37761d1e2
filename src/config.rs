//! Application configuration.
//!
//! Configuration is layered: stock defaults, then the user's `plex-shelf.toml`,
//! then command-line / environment overrides (`--url`/`PLEX_SERVER`,
//! `--token`/`PLEX_TOKEN`, `--port`/`PORT`). Each layer is a sparse TOML table
//! merged on top of the previous one with [`merge_toml`], so a user file only
//! needs the keys it changes. It is read once at startup; there is no reload.
//!
//! ## Configuration Options
//!
//! ```toml
//! [upstream]
//! url = "http://plex.local:32400"  # required
//! token = "xxxxxxxx"               # required, sent as X-Plex-Token
//!
//! [sections]
//! ids = [6, 5, 1, 2]               # library sections to mirror, in display order
//!
//! [server]
//! bind = "127.0.0.1"
//! port = 3000
//!
//! [paths]
//! data_dir = "data"                # library.json lives here
//! images_dir = "images"            # served under /images
//! assets_dir = "html"              # extra static assets, served at /
//!
//! [images]
//! quality = 80                     # JPEG quality for the 400/200 variants
//!
//! [processing]
//! max_downloads = 4                # concurrent artwork downloads
//! timeout_secs = 30                # per-request upstream timeout
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "plex-shelf.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Full application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Upstream media server address and credential.
    pub upstream: UpstreamConfig,
    /// Allow-list of library sections.
    pub sections: SectionsConfig,
    /// Listening address.
    pub server: ServerConfig,
    /// On-disk locations.
    pub paths: PathsConfig,
    /// Resized variant encoding.
    pub images: ImagesConfig,
    /// Download concurrency and timeouts.
    pub processing: ProcessingConfig,
}

impl AppConfig {
    /// Validate config values are present and within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upstream.url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "upstream.url must be set (or PLEX_SERVER)".into(),
            ));
        }
        if !(self.upstream.url.starts_with("http://") || self.upstream.url.starts_with("https://"))
        {
            return Err(ConfigError::Validation(format!(
                "upstream.url must start with http:// or https://, got '{}'",
                self.upstream.url
            )));
        }
        if self.upstream.token.trim().is_empty() {
            return Err(ConfigError::Validation(
                "upstream.token must be set (or PLEX_TOKEN)".into(),
            ));
        }
        if self.sections.ids.is_empty() {
            return Err(ConfigError::Validation(
                "sections.ids must not be empty".into(),
            ));
        }
        let mut seen = HashSet::new();
        for id in &self.sections.ids {
            if !seen.insert(id) {
                return Err(ConfigError::Validation(format!(
                    "sections.ids contains duplicate id {id}"
                )));
            }
        }
        if self.images.quality == 0 || self.images.quality > 100 {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        if self.processing.max_downloads == 0 {
            return Err(ConfigError::Validation(
                "processing.max_downloads must be at least 1".into(),
            ));
        }
        if self.processing.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "processing.timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Path of the persisted snapshot.
    pub fn snapshot_path(&self) -> PathBuf {
        self.paths.data_dir.join(crate::snapshot::SNAPSHOT_FILENAME)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpstreamConfig {
    /// Base URL, e.g. `http://plex.local:32400`. Trailing slashes are ignored.
    pub url: String,
    /// Shared secret passed as the `X-Plex-Token` query parameter.
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SectionsConfig {
    /// Section ids to mirror. Order is preserved in the snapshot.
    pub ids: Vec<u32>,
}

impl Default for SectionsConfig {
    fn default() -> Self {
        Self {
            ids: vec![6, 5, 1, 2],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
    pub images_dir: PathBuf,
    pub assets_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            images_dir: PathBuf::from("images"),
            assets_dir: PathBuf::from("html"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// JPEG quality for the resized variants (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self { quality: 80 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of artwork downloads in flight.
    pub max_downloads: usize,
    /// Per-request upstream timeout.
    pub timeout_secs: u64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_downloads: 4,
            timeout_secs: 30,
        }
    }
}

/// Values supplied on the command line or via environment variables.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub url: Option<String>,
    pub token: Option<String>,
    pub port: Option<u16>,
}

impl Overrides {
    /// Express the overrides as a sparse TOML table for merging.
    pub fn to_toml(&self) -> toml::Value {
        let mut root = toml::map::Map::new();

        let mut upstream = toml::map::Map::new();
        if let Some(url) = &self.url {
            upstream.insert("url".into(), toml::Value::String(url.clone()));
        }
        if let Some(token) = &self.token {
            upstream.insert("token".into(), toml::Value::String(token.clone()));
        }
        if !upstream.is_empty() {
            root.insert("upstream".into(), toml::Value::Table(upstream));
        }

        if let Some(port) = self.port {
            let mut server = toml::map::Map::new();
            server.insert("port".into(), toml::Value::Integer(i64::from(port)));
            root.insert("server".into(), toml::Value::Table(server));
        }

        toml::Value::Table(root)
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(AppConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge the given layers onto the stock defaults, deserialize and validate.
pub fn resolve_config(layers: Vec<toml::Value>) -> Result<AppConfig, ConfigError> {
    let merged = layers
        .into_iter()
        .fold(stock_defaults_value(), merge_toml);
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective configuration: defaults ← file ← overrides.
pub fn load_config(path: &Path, overrides: &Overrides) -> Result<AppConfig, ConfigError> {
    let mut layers = Vec::new();
    if let Some(file) = load_raw_config(path)? {
        layers.push(file);
    }
    layers.push(overrides.to_toml());
    resolve_config(layers)
}

/// Returns a fully-commented stock config file.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# plex-shelf configuration
# ========================
# Values shown below are the defaults. Remove any you don't need to change.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Upstream media server
# ---------------------------------------------------------------------------
[upstream]
# Base URL of the server, e.g. "http://plex.local:32400".
# Required. Can also be given with --url or PLEX_SERVER.
url = ""

# Access token, sent as the X-Plex-Token query parameter.
# Required. Can also be given with --token or PLEX_TOKEN.
token = ""

# ---------------------------------------------------------------------------
# Library sections to mirror
# ---------------------------------------------------------------------------
[sections]
# Section ids, in the order they appear in the gallery.
ids = [6, 5, 1, 2]

# ---------------------------------------------------------------------------
# HTTP server
# ---------------------------------------------------------------------------
[server]
bind = "127.0.0.1"
# Can also be given with --port or PORT.
port = 3000

# ---------------------------------------------------------------------------
# Paths
# ---------------------------------------------------------------------------
[paths]
# Snapshot directory (library.json).
data_dir = "data"
# Materialized artwork, served under /images.
images_dir = "images"
# Extra static assets served at the site root.
assets_dir = "html"

# ---------------------------------------------------------------------------
# Resized images
# ---------------------------------------------------------------------------
[images]
# JPEG quality for the 400px and 200px variants (1-100).
quality = 80

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum number of artwork downloads in flight.
max_downloads = 4
# Upstream request timeout in seconds.
timeout_secs = 30
"##
}
