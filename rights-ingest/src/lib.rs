//! rights-ingest library interface
//!
//! Music-rights metadata intake: normalizes submissions of any reasonable
//! shape into one canonical document, validates it, stores the derived
//! registration documents and registers the release on the ledger, while
//! streaming progress to a subscriber.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod normalize;
pub mod services;
pub mod utils;
pub mod validators;
pub mod workflow;

pub use crate::config::ServiceConfig;
pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::workflow::{PipelineOrchestrator, ProgressChannel, SubmissionRegistry};

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Audit database connection pool
    pub db: SqlitePool,
    /// Resolved service configuration
    pub config: Arc<ServiceConfig>,
    pub registry: Arc<SubmissionRegistry>,
    pub channel: Arc<ProgressChannel>,
    pub orchestrator: Arc<PipelineOrchestrator>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, config: ServiceConfig, orchestrator: Arc<PipelineOrchestrator>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            registry: Arc::clone(orchestrator.registry()),
            channel: Arc::clone(orchestrator.channel()),
            orchestrator,
            startup_time: Utc::now(),
        }
    }

    /// Evict finished submissions and closed channels past their retention
    pub fn sweep(&self) -> (usize, usize) {
        let records = self.registry.evict_finished(self.config.retention());
        let channels = self.channel.sweep();
        if records > 0 || channels > 0 {
            tracing::debug!(records, channels, "Swept finished submissions");
        }
        (records, channels)
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::submission_routes())
        .merge(api::ws_routes())
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
