//! rights-ingest - music rights metadata intake and registration service
//!
//! Accepts release metadata over HTTP, normalizes and validates it, stores
//! the registration documents and registers the release as an IP asset.
//! Progress streams over a WebSocket per submission.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rights_ingest::config::{Cli, ServiceConfig};
use rights_ingest::db::SqliteAuditSink;
use rights_ingest::services::{GatewayRegistrar, PinningServiceUploader};
use rights_ingest::workflow::{PipelineOrchestrator, ProgressChannel, SubmissionRegistry};
use rights_ingest::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let file_config = rights_common::config::load_config(cli.config.as_deref())?;
    let config = ServiceConfig::resolve(&cli, file_config);

    if cli.write_config {
        let path = cli
            .config
            .clone()
            .or_else(rights_common::config::default_config_path)
            .ok_or_else(|| anyhow::anyhow!("No config directory available on this platform"))?;
        rights_common::config::write_toml_config(&config.to_toml(), &path)?;
        println!("Configuration written to {}", path.display());
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter()));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting rights-ingest");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    info!("Database: {}", config.database_path.display());
    let db_pool = rights_ingest::db::init_database_pool(&config.database_path).await?;
    info!("Database connection established");

    let jwt = config.storage.jwt.clone().unwrap_or_default();
    if jwt.is_empty() {
        warn!("Storage token not configured (RIGHTS_STORAGE_JWT); uploads will fail");
    }
    let uploader = PinningServiceUploader::new(config.storage.base_url.clone(), jwt)?;

    let ledger_url = config.ledger.base_url.clone().unwrap_or_default();
    let contract = config.ledger.spg_nft_contract.clone().unwrap_or_default();
    if ledger_url.is_empty() || contract.is_empty() {
        warn!("Ledger gateway or collection contract not configured; registrations will fail");
    }
    let registrar = GatewayRegistrar::new(ledger_url, contract, config.ledger.network.clone())?;

    let registry = Arc::new(SubmissionRegistry::new());
    let channel = Arc::new(ProgressChannel::new(config.channel_config()));
    let orchestrator = Arc::new(
        PipelineOrchestrator::new(
            registry,
            channel,
            Arc::new(uploader),
            Arc::new(registrar),
            config.pipeline_config(),
        )
        .with_audit(Arc::new(SqliteAuditSink::new(db_pool.clone()))),
    );

    let addr = config.socket_addr()?;
    let state = AppState::new(db_pool, config, orchestrator);

    let sweeper = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(30));
        loop {
            interval.tick().await;
            sweeper.sweep();
        }
    });

    let app = rights_ingest::build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
