//! Progress event types for the registration pipeline
//!
//! Shared wire definitions pushed to subscribers over the progress socket.
//! Every event carries the submission id, a per-submission sequence number
//! and a millisecond timestamp, so a client can order and de-duplicate
//! replayed events after a reconnect.

mod outcome;
mod stage;

pub use outcome::{ContentRef, DocumentKind, FailureKind, PipelineOutcome};
pub use stage::Stage;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event `type` field on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Stage entered
    Progress,
    /// Terminal: asset registered
    Complete,
    /// Terminal: validation reported missing fields or format errors
    Incomplete,
    /// Terminal: failure, timeout or cancellation
    Error,
}

impl EventKind {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, EventKind::Progress)
    }
}

/// One progress notification for a submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub submission_id: Uuid,
    /// Per-submission sequence, assigned when the event is published (starts at 1)
    #[serde(default)]
    pub sequence: u64,
    /// Unix epoch milliseconds
    pub timestamp: i64,
    pub stage: Stage,
    pub message: String,
    pub percentage: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<PipelineOutcome>,
}

impl ProgressEvent {
    /// Non-terminal event announcing that `stage` was entered
    pub fn progress(submission_id: Uuid, stage: Stage, message: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Progress,
            submission_id,
            sequence: 0,
            timestamp: now_millis(),
            stage,
            message: message.into(),
            percentage: stage.percentage(),
            outcome: None,
        }
    }

    /// Non-terminal milestone inside `stage`, reported at `percentage`
    ///
    /// The percentage is clamped between the stage's own value and 99 so a
    /// checkpoint never runs ahead of the terminal event.
    pub fn checkpoint(
        submission_id: Uuid,
        stage: Stage,
        percentage: u8,
        message: impl Into<String>,
    ) -> Self {
        let mut event = Self::progress(submission_id, stage, message);
        event.percentage = percentage.max(stage.percentage()).min(99);
        event
    }

    /// Terminal event carrying the final outcome
    ///
    /// Always reported at 100 percent.
    pub fn terminal(submission_id: Uuid, outcome: PipelineOutcome) -> Self {
        let (kind, message) = match &outcome {
            PipelineOutcome::Complete { asset_id, .. } => (
                EventKind::Complete,
                format!("Registered as asset {}", asset_id),
            ),
            PipelineOutcome::Incomplete {
                missing_fields,
                format_errors,
            } => (
                EventKind::Incomplete,
                format!(
                    "Metadata incomplete: {} missing field(s), {} format error(s)",
                    missing_fields.len(),
                    format_errors.len()
                ),
            ),
            PipelineOutcome::Failed { stage, message, .. } => {
                (EventKind::Error, format!("{} failed: {}", stage, message))
            }
        };

        // A failure reports the stage that was running; the outcome says it failed
        let stage = match &outcome {
            PipelineOutcome::Failed { stage, .. } => *stage,
            other => other.stage(),
        };
        Self {
            kind,
            submission_id,
            sequence: 0,
            timestamp: now_millis(),
            stage,
            message,
            percentage: 100,
            outcome: Some(outcome),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.kind.is_terminal()
    }
}

/// Current time as Unix epoch milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
