//! Configuration loading and config file resolution
//!
//! Bootstrap configuration lives in a small TOML file. Every section has
//! built-in defaults so a missing file or a missing key never prevents startup.
//!
//! Config file resolution order:
//! 1. Explicit path (command line)
//! 2. `RIGHTS_CONFIG` environment variable
//! 3. OS-dependent user config directory (`<config_dir>/rights/rights-ingest.toml`)
//! 4. `/etc/rights/rights-ingest.toml` (Linux only)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "RIGHTS_CONFIG";

/// File name looked up inside the config directories
pub const CONFIG_FILE_NAME: &str = "rights-ingest.toml";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TomlConfig {
    /// Interface the HTTP server binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Host (and port) clients should use to reach the progress socket
    ///
    /// Defaults to `localhost:<port>` when unset.
    #[serde(default)]
    pub public_host: Option<String>,

    /// SQLite database for registration audit records
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub pipeline: PipelineSettings,

    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub ledger: LedgerSettings,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            public_host: None,
            database_path: None,
            logging: LoggingConfig::default(),
            pipeline: PipelineSettings::default(),
            storage: StorageSettings::default(),
            ledger: LedgerSettings::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Pipeline timing and buffering knobs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineSettings {
    /// A submission with no observable progress for this long is failed with a timeout.
    /// Ledger confirmation is slow, so this is generous.
    #[serde(default = "default_stall_timeout_secs")]
    pub stall_timeout_secs: u64,

    /// Number of events retained per submission for replay on attach
    #[serde(default = "default_replay_buffer")]
    pub replay_buffer: usize,

    /// Events younger than this are replayed to a newly attached subscriber
    #[serde(default = "default_replay_window_ms")]
    pub replay_window_ms: u64,

    /// How long finished submissions and closed channels are kept before eviction
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,

    /// Server liveness ping interval on the progress socket
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,

    /// Synthesize placeholders for unresolved required fields instead of leaving them blank
    #[serde(default)]
    pub best_effort_fill: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            stall_timeout_secs: default_stall_timeout_secs(),
            replay_buffer: default_replay_buffer(),
            replay_window_ms: default_replay_window_ms(),
            retention_secs: default_retention_secs(),
            heartbeat_secs: default_heartbeat_secs(),
            best_effort_fill: false,
        }
    }
}

/// Content-addressed storage (pinning service) settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageSettings {
    /// Pinning service base URL
    #[serde(default = "default_storage_url")]
    pub base_url: String,

    /// Bearer token for the pinning service
    #[serde(default)]
    pub jwt: Option<String>,
}

/// Ledger registration gateway settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerSettings {
    /// Registration gateway base URL
    #[serde(default)]
    pub base_url: Option<String>,

    /// NFT collection contract the assets are minted into
    #[serde(default)]
    pub spg_nft_contract: Option<String>,

    /// Network label recorded alongside audit records
    #[serde(default = "default_network")]
    pub network: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            base_url: default_storage_url(),
            jwt: None,
        }
    }
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            spg_nft_contract: None,
            network: default_network(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5730
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_stall_timeout_secs() -> u64 {
    120
}

fn default_replay_buffer() -> usize {
    64
}

fn default_replay_window_ms() -> u64 {
    2000
}

fn default_retention_secs() -> u64 {
    300
}

fn default_heartbeat_secs() -> u64 {
    30
}

fn default_storage_url() -> String {
    "https://api.pinata.cloud".to_string()
}

fn default_network() -> String {
    "aeneid".to_string()
}

/// Resolve the config file to load, if any exists
///
/// Returns `Ok(None)` when no candidate exists; built-in defaults apply then.
/// An explicit path that does not exist is an error.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = cli_arg {
        if path.exists() {
            return Ok(Some(path.to_path_buf()));
        }
        return Err(Error::Config(format!(
            "Config file not found: {}",
            path.display()
        )));
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Ok(Some(path));
        }
        return Err(Error::Config(format!(
            "{} points to a missing file: {}",
            CONFIG_ENV_VAR,
            path.display()
        )));
    }

    if let Some(user_config) = default_config_path() {
        if user_config.exists() {
            return Ok(Some(user_config));
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/rights").join(CONFIG_FILE_NAME);
        if system_config.exists() {
            return Ok(Some(system_config));
        }
    }

    Ok(None)
}

/// Per-user config file location for this platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("rights").join(CONFIG_FILE_NAME))
}

/// OS-dependent default location of the audit database
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("rights").join("rights.db"))
        .unwrap_or_else(|| PathBuf::from("./rights_data/rights.db"))
}

/// Load a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load configuration following the resolution order, falling back to defaults
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    match resolve_config_path(cli_arg)? {
        Some(path) => {
            tracing::info!("Loading configuration from {}", path.display());
            load_toml_config(&path)
        }
        None => {
            tracing::info!("No configuration file found, using built-in defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Write config atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;

    Ok(())
}
