//! Service configuration for rights-ingest
//!
//! Resolution priority, highest first:
//! 1. Command line flags
//! 2. `RIGHTS_*` environment variables (handled by clap's `env` fallback)
//! 3. TOML config file (see [`rights_common::config::resolve_config_path`])
//! 4. Built-in defaults

use clap::Parser;
use rights_common::config::{
    default_database_path, LedgerSettings, PipelineSettings, StorageSettings, TomlConfig,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

use crate::normalize::NormalizeMode;
use crate::workflow::{ChannelConfig, PipelineConfig};

/// Command line arguments
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "rights-ingest", version, about = "Music rights metadata intake and registration service")]
pub struct Cli {
    /// Config file (overrides RIGHTS_CONFIG and the default locations)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Interface to bind
    #[arg(long, env = "RIGHTS_BIND_ADDRESS")]
    pub bind_address: Option<String>,

    /// HTTP port
    #[arg(long, short = 'p', env = "RIGHTS_PORT")]
    pub port: Option<u16>,

    /// Host clients use to reach the progress socket
    #[arg(long, env = "RIGHTS_PUBLIC_HOST")]
    pub public_host: Option<String>,

    /// SQLite audit database
    #[arg(long, env = "RIGHTS_DATABASE")]
    pub database: Option<PathBuf>,

    /// Log level or filter directive
    #[arg(long, env = "RIGHTS_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Pinning service base URL
    #[arg(long, env = "RIGHTS_STORAGE_URL")]
    pub storage_url: Option<String>,

    /// Pinning service bearer token
    #[arg(long, env = "RIGHTS_STORAGE_JWT", hide_env_values = true)]
    pub storage_jwt: Option<String>,

    /// Registration gateway base URL
    #[arg(long, env = "RIGHTS_LEDGER_URL")]
    pub ledger_url: Option<String>,

    /// NFT collection contract address
    #[arg(long, env = "RIGHTS_SPG_NFT_CONTRACT")]
    pub spg_nft_contract: Option<String>,

    /// Network label for audit records
    #[arg(long, env = "RIGHTS_NETWORK")]
    pub network: Option<String>,

    /// Seconds before a stalled submission is failed
    #[arg(long, env = "RIGHTS_STALL_TIMEOUT_SECS")]
    pub stall_timeout_secs: Option<u64>,

    /// Fill unresolved required fields with marked placeholders
    #[arg(long, env = "RIGHTS_BEST_EFFORT_FILL")]
    pub best_effort_fill: bool,

    /// Write the resolved configuration to the config file and exit
    #[arg(long)]
    pub write_config: bool,
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub bind_address: String,
    pub port: u16,
    pub public_host: Option<String>,
    pub database_path: PathBuf,
    pub log_level: String,
    pub pipeline: PipelineSettings,
    pub storage: StorageSettings,
    pub ledger: LedgerSettings,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::resolve(&Cli::default(), TomlConfig::default())
    }
}

impl ServiceConfig {
    /// Overlay command line (and environment) values onto the file config
    pub fn resolve(cli: &Cli, file: TomlConfig) -> Self {
        let mut pipeline = file.pipeline;
        if let Some(secs) = cli.stall_timeout_secs {
            pipeline.stall_timeout_secs = secs;
        }
        if cli.best_effort_fill {
            pipeline.best_effort_fill = true;
        }

        let mut storage = file.storage;
        if let Some(url) = &cli.storage_url {
            storage.base_url = url.clone();
        }
        if let Some(jwt) = &cli.storage_jwt {
            storage.jwt = Some(jwt.clone());
        }

        let mut ledger = file.ledger;
        if let Some(url) = &cli.ledger_url {
            ledger.base_url = Some(url.clone());
        }
        if let Some(contract) = &cli.spg_nft_contract {
            ledger.spg_nft_contract = Some(contract.clone());
        }
        if let Some(network) = &cli.network {
            ledger.network = network.clone();
        }

        Self {
            bind_address: cli.bind_address.clone().unwrap_or(file.bind_address),
            port: cli.port.unwrap_or(file.port),
            public_host: cli.public_host.clone().or(file.public_host),
            database_path: cli
                .database
                .clone()
                .or(file.database_path)
                .unwrap_or_else(default_database_path),
            log_level: cli.log_level.clone().unwrap_or(file.logging.level),
            pipeline,
            storage,
            ledger,
        }
    }

    /// Back to file form, for `--write-config`
    pub fn to_toml(&self) -> TomlConfig {
        let mut config = TomlConfig {
            bind_address: self.bind_address.clone(),
            port: self.port,
            public_host: self.public_host.clone(),
            database_path: Some(self.database_path.clone()),
            pipeline: self.pipeline.clone(),
            storage: self.storage.clone(),
            ledger: self.ledger.clone(),
            ..TomlConfig::default()
        };
        config.logging.level = self.log_level.clone();
        config
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.bind_address, self.port);
        addr.parse()
            .map_err(|e| anyhow::anyhow!("Invalid bind address {}: {}", addr, e))
    }

    /// Progress socket URL handed back to submitters
    pub fn ws_endpoint(&self, submission_id: Uuid) -> String {
        let host = self
            .public_host
            .clone()
            .unwrap_or_else(|| format!("localhost:{}", self.port));
        format!("ws://{}/ws?submissionId={}", host, submission_id)
    }

    /// Filter directive for the tracing subscriber
    ///
    /// A bare level applies to this crate and the HTTP trace layer; anything
    /// else is taken as a full directive.
    pub fn log_filter(&self) -> String {
        let level = self.log_level.trim();
        match level {
            "trace" | "debug" | "info" | "warn" | "error" => {
                format!("rights_ingest={level},rights_common={level},tower_http={level}")
            }
            _ => level.to_string(),
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            stall_timeout: Duration::from_secs(self.pipeline.stall_timeout_secs),
            normalize_mode: if self.pipeline.best_effort_fill {
                NormalizeMode::BestEffortFill
            } else {
                NormalizeMode::Plain
            },
            network: self.ledger.network.clone(),
        }
    }

    pub fn channel_config(&self) -> ChannelConfig {
        ChannelConfig {
            replay_buffer: self.pipeline.replay_buffer,
            replay_window: Duration::from_millis(self.pipeline.replay_window_ms),
            retention: self.retention(),
        }
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.pipeline.retention_secs)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.pipeline.heartbeat_secs.max(1))
    }
}
