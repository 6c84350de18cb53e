//! Test Helper Utilities
//!
//! Shared utilities for testing rights-ingest

#![allow(dead_code)]

pub mod db_utils;
pub mod doubles;
pub mod fixtures;

use rights_common::events::ProgressEvent;
use rights_ingest::db::AuditSink;
use rights_ingest::workflow::{
    ChannelConfig, PipelineConfig, PipelineOrchestrator, ProgressChannel, SubmissionRegistry,
};
use rights_ingest::{AppState, ServiceConfig};
use std::sync::Arc;
use uuid::Uuid;

// Re-export commonly used items
pub use db_utils::{
    assert_has_column, create_test_db, get_table_columns, has_column, memory_db,
    registration_count,
};
pub use doubles::{MemoryAuditSink, MockRegistrar, MockUploader, ASSET_ID, TX_HASH};
pub use fixtures::{complete_release, flat_record, variant_release, WALLET};

/// Orchestrator wired to the given doubles with default settings
pub fn orchestrator(
    uploader: Arc<MockUploader>,
    registrar: Arc<MockRegistrar>,
) -> Arc<PipelineOrchestrator> {
    orchestrator_with(uploader, registrar, PipelineConfig::default(), ChannelConfig::default())
}

pub fn orchestrator_with(
    uploader: Arc<MockUploader>,
    registrar: Arc<MockRegistrar>,
    pipeline: PipelineConfig,
    channel: ChannelConfig,
) -> Arc<PipelineOrchestrator> {
    Arc::new(PipelineOrchestrator::new(
        Arc::new(SubmissionRegistry::new()),
        Arc::new(ProgressChannel::new(channel)),
        uploader,
        registrar,
        pipeline,
    ))
}

/// Orchestrator that also writes audit records to `audit`
pub fn audited_orchestrator(
    uploader: Arc<MockUploader>,
    registrar: Arc<MockRegistrar>,
    audit: Arc<dyn AuditSink>,
) -> Arc<PipelineOrchestrator> {
    Arc::new(
        PipelineOrchestrator::new(
            Arc::new(SubmissionRegistry::new()),
            Arc::new(ProgressChannel::default()),
            uploader,
            registrar,
            PipelineConfig::default(),
        )
        .with_audit(audit),
    )
}

/// Create test app state with in-memory database and succeeding doubles
pub async fn test_app_state() -> AppState {
    test_app_state_with(MockUploader::succeeding(), MockRegistrar::succeeding()).await
}

pub async fn test_app_state_with(
    uploader: Arc<MockUploader>,
    registrar: Arc<MockRegistrar>,
) -> AppState {
    let db_pool = memory_db().await;
    let orchestrator = orchestrator(uploader, registrar);
    AppState::new(db_pool, ServiceConfig::default(), orchestrator)
}

/// Every event recorded for `id`, in publication order
pub fn recorded_events(orchestrator: &PipelineOrchestrator, id: Uuid) -> Vec<ProgressEvent> {
    orchestrator
        .registry()
        .events(id)
        .expect("submission should be registered")
}

/// Assert the invariants every finished event sequence must hold
///
/// Sequence numbers count up from 1, percentages never decrease, and the
/// sequence ends in exactly one terminal event.
pub fn assert_well_formed(events: &[ProgressEvent]) {
    assert!(!events.is_empty(), "no events recorded");

    for (index, event) in events.iter().enumerate() {
        assert_eq!(event.sequence, index as u64 + 1, "sequence gap at {}", index);
    }
    for pair in events.windows(2) {
        assert!(
            pair[0].percentage <= pair[1].percentage,
            "percentage went backwards: {} -> {}",
            pair[0].percentage,
            pair[1].percentage
        );
    }

    let terminals = events.iter().filter(|e| e.is_terminal()).count();
    assert_eq!(terminals, 1, "expected exactly one terminal event");
    let last = events.last().unwrap();
    assert!(last.is_terminal(), "last event must be terminal");
    assert_eq!(last.percentage, 100);
}
