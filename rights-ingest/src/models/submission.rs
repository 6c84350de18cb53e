//! Submission record owned by the registry
//!
//! A record is created once per accepted submission and only the pipeline
//! mutates it, always through [`crate::workflow::SubmissionRegistry`].

use chrono::{DateTime, Utc};
use rights_common::events::{PipelineOutcome, ProgressEvent, Stage};
use serde::Serialize;
use uuid::Uuid;

use super::CanonicalMetadata;

/// In-flight or finished submission
#[derive(Debug, Clone)]
pub struct SubmissionRecord {
    /// Unique submission identifier (immutable)
    pub id: Uuid,

    /// Current pipeline stage
    pub stage: Stage,

    /// Submission exactly as received (immutable)
    pub raw_input: serde_json::Value,

    /// Set once normalization has run
    pub canonical: Option<CanonicalMetadata>,

    /// Set once the pipeline reaches a terminal stage
    pub outcome: Option<PipelineOutcome>,

    /// Every event published for this submission, in order
    pub events: Vec<ProgressEvent>,

    /// Paths corrected after the submission stopped as incomplete
    pub amendments: Vec<String>,

    /// Ledger integration plan, built when enrichment runs
    pub integration: Option<serde_json::Value>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubmissionRecord {
    pub fn new(raw_input: serde_json::Value) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            stage: Stage::Received,
            raw_input,
            canonical: None,
            outcome: None,
            events: Vec::new(),
            amendments: Vec::new(),
            integration: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal()
    }

    /// Point-in-time view for status queries
    pub fn snapshot(&self) -> SubmissionSnapshot {
        let last_percentage = self.events.last().map(|e| e.percentage).unwrap_or(0);
        SubmissionSnapshot {
            submission_id: self.id,
            stage: self.stage,
            percentage: last_percentage,
            canonical: self.canonical.clone(),
            outcome: self.outcome.clone(),
            event_count: self.events.len(),
            amendments: self.amendments.clone(),
            integration: self.integration.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Read-only copy of a submission's state, possibly one event stale
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionSnapshot {
    pub submission_id: Uuid,
    pub stage: Stage,
    pub percentage: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical: Option<CanonicalMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<PipelineOutcome>,
    pub event_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub amendments: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integration: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
