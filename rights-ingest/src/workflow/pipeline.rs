//! Registration pipeline orchestrator
//!
//! Drives one submission through the stage machine:
//!
//! ```text
//! Received -> Normalizing -> Validating -> Incomplete
//!                                      \-> Enriching -> Uploading -> Registering -> Complete
//!                     (any non-terminal stage) -> Failed
//! ```
//!
//! Normalization and validation run synchronously inside [`PipelineOrchestrator::submit`];
//! a submission that fails validation is finished before `submit` returns and
//! never touches an external service. Everything after validation runs on one
//! spawned worker per submission, wrapped in a stall timeout.
//!
//! # Error Handling
//! - Only the uploader and registrar can fail; each failure becomes a `Failed`
//!   outcome naming the stage, with content already stored listed in it
//! - Every path ends in exactly one terminal event, after which the progress
//!   channel is closed
//! - Audit persistence failures are logged and never change the outcome

use chrono::Utc;
use rights_common::events::{ContentRef, FailureKind, PipelineOutcome, ProgressEvent, Stage};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::{ProgressChannel, RegistryError, SubmissionRegistry};
use crate::db::{AuditRecord, AuditSink};
use crate::models::CanonicalMetadata;
use crate::normalize::{normalize_with, FieldResolver, FillSource, NoopResolver, NormalizeMode};
use crate::services::{
    to_ledger_hash, LedgerRegistrar, RegistrationDocuments, RegistrationError,
    RegistrationRequest, StorageUploader, StoredContent, UploadTarget,
};
use crate::validators::validate;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Upper bound on the asynchronous part of one submission
    pub stall_timeout: Duration,
    /// Fill mode handed to the normalizer
    pub normalize_mode: NormalizeMode,
    /// Network name recorded in the audit trail
    pub network: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stall_timeout: Duration::from_secs(120),
            normalize_mode: NormalizeMode::Plain,
            network: "aeneid".to_string(),
        }
    }
}

/// What a cancel request achieved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CancelDisposition {
    /// Uploading has not begun; the worker stops before any side effect
    Requested,
    /// External side effects may already exist; the pipeline keeps going
    Advisory,
    /// Submission already reached a terminal stage
    AlreadyFinished,
}

/// Handle to a running (or already finished) submission
#[derive(Debug)]
pub struct PipelineHandle {
    submission_id: Uuid,
    cancel: CancellationToken,
    worker: Option<JoinHandle<()>>,
}

impl PipelineHandle {
    pub fn submission_id(&self) -> Uuid {
        self.submission_id
    }

    /// Ask the worker to stop; honored only before uploading starts
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the asynchronous part was started at all
    pub fn is_spawned(&self) -> bool {
        self.worker.is_some()
    }

    /// Wait until the submission has reached a terminal stage
    pub async fn wait(self) {
        if let Some(worker) = self.worker {
            if let Err(e) = worker.await {
                error!(submission_id = %self.submission_id, error = %e, "Pipeline worker panicked");
            }
        }
    }
}

/// Orchestrates normalize, validate, enrich, upload and register
pub struct PipelineOrchestrator {
    registry: Arc<SubmissionRegistry>,
    channel: Arc<ProgressChannel>,
    uploader: Arc<dyn StorageUploader>,
    registrar: Arc<dyn LedgerRegistrar>,
    audit: Option<Arc<dyn AuditSink>>,
    resolver: Arc<dyn FieldResolver>,
    config: PipelineConfig,
    cancellation_tokens: Mutex<HashMap<Uuid, CancellationToken>>,
    last_error: Mutex<Option<String>>,
}

impl PipelineOrchestrator {
    pub fn new(
        registry: Arc<SubmissionRegistry>,
        channel: Arc<ProgressChannel>,
        uploader: Arc<dyn StorageUploader>,
        registrar: Arc<dyn LedgerRegistrar>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            registry,
            channel,
            uploader,
            registrar,
            audit: None,
            resolver: Arc::new(NoopResolver),
            config,
            cancellation_tokens: Mutex::new(HashMap::new()),
            last_error: Mutex::new(None),
        }
    }

    /// Record completed registrations through `audit`
    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Consult `resolver` for fields the alias table cannot find
    pub fn with_resolver(mut self, resolver: Arc<dyn FieldResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn registry(&self) -> &Arc<SubmissionRegistry> {
        &self.registry
    }

    pub fn channel(&self) -> &Arc<ProgressChannel> {
        &self.channel
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Description of the most recent failed submission
    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Accept a submission and start processing it
    ///
    /// Returns once normalization and validation are done. Incomplete
    /// submissions are already finished at that point; the rest continue on
    /// a spawned worker.
    pub fn submit(self: &Arc<Self>, raw: Value) -> PipelineHandle {
        let id = self.registry.create(raw.clone());
        self.channel.register(id);
        let cancel = CancellationToken::new();
        self.cancellation_tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, cancel.clone());

        info!(submission_id = %id, "Submission received");
        self.emit(id, ProgressEvent::progress(id, Stage::Received, "Submission received"));

        self.transition(id, Stage::Normalizing, "Normalizing metadata");
        let normalized = normalize_with(&raw, self.config.normalize_mode, self.resolver.as_ref());
        if normalized.is_low_confidence() {
            warn!(
                submission_id = %id,
                unresolved = normalized.unresolved.len(),
                "Submission matched no known shape well"
            );
        }
        debug!(submission_id = %id, format = ?normalized.format, "Normalized");

        let metadata = normalized.metadata;
        if let Err(e) = self.registry.set_canonical(id, metadata.clone()) {
            warn!(submission_id = %id, error = %e, "Could not store canonical metadata");
        }

        self.transition(id, Stage::Validating, "Validating metadata");
        let placeholders = normalized
            .filled
            .into_iter()
            .filter(|(_, source)| *source == FillSource::Placeholder)
            .map(|(path, _)| path);
        let report = validate(&metadata).with_missing(placeholders);

        if !report.is_clean() {
            info!(
                submission_id = %id,
                missing = report.missing_fields.len(),
                format_errors = report.format_errors.len(),
                "Submission incomplete"
            );
            self.complete(
                id,
                PipelineOutcome::Incomplete {
                    missing_fields: report.missing_fields,
                    format_errors: report.format_errors,
                },
            );
            return PipelineHandle {
                submission_id: id,
                cancel,
                worker: None,
            };
        }

        let orchestrator = Arc::clone(self);
        let token = cancel.clone();
        let worker = tokio::spawn(async move {
            orchestrator.run_worker(id, metadata, token).await;
        });

        PipelineHandle {
            submission_id: id,
            cancel,
            worker: Some(worker),
        }
    }

    /// Request cancellation of a submission by id
    ///
    /// `Requested` is returned only while the worker has not yet committed to
    /// uploading; such a cancel is always honored. Once the worker commits,
    /// its token leaves the cancellable set and the answer is `Advisory`.
    pub fn cancel(&self, id: Uuid) -> Result<CancelDisposition, RegistryError> {
        let stage = self.registry.stage(id).ok_or(RegistryError::NotFound(id))?;
        if stage.is_terminal() {
            return Ok(CancelDisposition::AlreadyFinished);
        }

        let tokens = self
            .cancellation_tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match tokens.get(&id) {
            Some(token) => {
                token.cancel();
                info!(submission_id = %id, stage = ?stage, "Cancel requested");
                Ok(CancelDisposition::Requested)
            }
            None => {
                warn!(submission_id = %id, stage = ?stage, "Cancel requested after uploads began; continuing");
                Ok(CancelDisposition::Advisory)
            }
        }
    }

    /// Last cancellation check before external side effects
    ///
    /// Runs under the token lock: a cancel either lands before this and is
    /// honored, or finds the token gone and reports `Advisory`.
    fn begin_uploads(&self, id: Uuid, cancel: &CancellationToken) -> bool {
        {
            let mut tokens = self
                .cancellation_tokens
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if cancel.is_cancelled() {
                return false;
            }
            tokens.remove(&id);
        }
        self.transition(id, Stage::Uploading, "Uploading metadata documents");
        true
    }

    async fn run_worker(&self, id: Uuid, metadata: CanonicalMetadata, cancel: CancellationToken) {
        let mut uploaded = Vec::new();
        let timeout = self.config.stall_timeout;

        let result =
            tokio::time::timeout(timeout, self.drive(id, &metadata, &cancel, &mut uploaded)).await;
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(_) => {
                let stage = self.registry.stage(id).unwrap_or(Stage::Enriching);
                warn!(submission_id = %id, stage = ?stage, "Pipeline timed out");
                PipelineOutcome::Failed {
                    stage,
                    kind: FailureKind::Timeout,
                    message: format!("no result within {} s", timeout.as_secs()),
                    uploaded_content: uploaded,
                }
            }
        };

        self.complete(id, outcome);
    }

    async fn drive(
        &self,
        id: Uuid,
        metadata: &CanonicalMetadata,
        cancel: &CancellationToken,
        uploaded: &mut Vec<ContentRef>,
    ) -> PipelineOutcome {
        if cancel.is_cancelled() {
            return cancelled(Stage::Validating);
        }

        self.transition(id, Stage::Enriching, "Building registration documents");
        let documents = RegistrationDocuments::build(metadata, Utc::now());
        if let Err(e) = self.registry.set_integration(id, documents.integration.clone()) {
            warn!(submission_id = %id, error = %e, "Could not store integration plan");
        }
        self.emit(
            id,
            ProgressEvent::checkpoint(id, Stage::Enriching, 45, "Registration documents built"),
        );

        if !self.begin_uploads(id, cancel) {
            return cancelled(Stage::Enriching);
        }

        let ip = match self.store(UploadTarget::Ip, &documents.ip, uploaded).await {
            Ok(stored) => stored,
            Err(outcome) => return outcome,
        };
        self.emit(
            id,
            ProgressEvent::checkpoint(id, Stage::Uploading, 65, "IP metadata document stored"),
        );

        let display = match self
            .store(UploadTarget::Display, &documents.display, uploaded)
            .await
        {
            Ok(stored) => stored,
            Err(outcome) => return outcome,
        };

        if cancel.is_cancelled() {
            warn!(submission_id = %id, "Cancel ignored: documents already stored");
        }

        self.transition(id, Stage::Registering, "Registering IP asset");
        let request = RegistrationRequest {
            ip_uri: ip.content_id.clone(),
            ip_hash: to_ledger_hash(&ip.content_hash),
            display_uri: display.content_id.clone(),
            display_hash: to_ledger_hash(&display.content_hash),
        };

        let receipt = match self.registrar.register_asset(&request).await {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(submission_id = %id, error = %e, "Registration failed");
                return PipelineOutcome::Failed {
                    stage: Stage::Registering,
                    kind: registration_failure_kind(&e),
                    message: e.to_string(),
                    uploaded_content: uploaded.clone(),
                };
            }
        };
        self.emit(
            id,
            ProgressEvent::checkpoint(id, Stage::Registering, 85, "IP asset registered"),
        );

        if let Some(audit) = &self.audit {
            let record = AuditRecord {
                asset_id: receipt.asset_id.clone(),
                submission_id: id,
                transaction_receipt: receipt.transaction_receipt.clone(),
                network: self.config.network.clone(),
                ip_content_id: ip.content_id.clone(),
                ip_content_hash: ip.content_hash.clone(),
                display_content_id: display.content_id.clone(),
                display_content_hash: display.content_hash.clone(),
                metadata: metadata.clone(),
                registered_at: Utc::now(),
            };
            if let Err(e) = audit.record(&record).await {
                error!(submission_id = %id, asset_id = %receipt.asset_id, error = %e, "Audit write failed");
            }
        }

        PipelineOutcome::Complete {
            asset_id: receipt.asset_id,
            transaction_receipt: receipt.transaction_receipt,
            ip_content: content_ref(UploadTarget::Ip, &ip),
            display_content: content_ref(UploadTarget::Display, &display),
        }
    }

    async fn store(
        &self,
        target: UploadTarget,
        document: &Value,
        uploaded: &mut Vec<ContentRef>,
    ) -> Result<StoredContent, PipelineOutcome> {
        match self.uploader.upload(target, document).await {
            Ok(stored) => {
                uploaded.push(content_ref(target, &stored));
                Ok(stored)
            }
            Err(e) => {
                warn!(document = %target, error = %e, "Upload failed");
                Err(PipelineOutcome::Failed {
                    stage: Stage::Uploading,
                    kind: FailureKind::Upload,
                    message: e.to_string(),
                    uploaded_content: uploaded.clone(),
                })
            }
        }
    }

    /// Publish, then keep the stamped copy in the record
    fn emit(&self, id: Uuid, event: ProgressEvent) {
        let stamped = self.channel.publish(id, event);
        if let Err(e) = self.registry.record_event(id, stamped) {
            warn!(submission_id = %id, error = %e, "Could not record event");
        }
    }

    fn transition(&self, id: Uuid, stage: Stage, message: &str) {
        if let Err(e) = self.registry.advance(id, stage) {
            error!(submission_id = %id, error = %e, "Stage transition rejected");
            return;
        }
        debug!(submission_id = %id, stage = ?stage, "Stage entered");
        self.emit(id, ProgressEvent::progress(id, stage, message));
    }

    /// Record the outcome, publish the terminal event and close the channel
    fn complete(&self, id: Uuid, outcome: PipelineOutcome) {
        match &outcome {
            PipelineOutcome::Complete { asset_id, .. } => {
                info!(submission_id = %id, asset_id = %asset_id, "Submission registered")
            }
            PipelineOutcome::Failed {
                stage,
                kind,
                message,
                ..
            } => {
                warn!(submission_id = %id, stage = ?stage, kind = ?kind, "Submission failed");
                *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) =
                    Some(format!("{}: {} failed: {}", id, stage, message));
            }
            PipelineOutcome::Incomplete { .. } => {}
        }

        if let Err(e) = self.registry.finish(id, outcome.clone()) {
            error!(submission_id = %id, error = %e, "Could not record outcome");
        }
        self.emit(id, ProgressEvent::terminal(id, outcome));
        self.channel.close(id);
        self.cancellation_tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }
}

fn cancelled(stage: Stage) -> PipelineOutcome {
    PipelineOutcome::Failed {
        stage,
        kind: FailureKind::Cancelled,
        message: "cancelled before upload".to_string(),
        uploaded_content: Vec::new(),
    }
}

fn content_ref(target: UploadTarget, stored: &StoredContent) -> ContentRef {
    ContentRef {
        document: target,
        content_id: stored.content_id.clone(),
        content_hash: stored.content_hash.clone(),
    }
}

fn registration_failure_kind(err: &RegistrationError) -> FailureKind {
    match err {
        RegistrationError::HashFormat(_) => FailureKind::HashFormat,
        RegistrationError::ContractReference(_) => FailureKind::ContractReference,
        RegistrationError::Transaction(_) => FailureKind::Transaction,
    }
}
