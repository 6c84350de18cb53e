//! Submission intake and status endpoints
//!
//! - `POST /metadata` accepts a submission and answers 202 immediately
//! - `GET /metadata/:id` returns the registry snapshot
//! - `PATCH /metadata/:id` corrects fields of an incomplete submission and
//!   re-validates it; the corrected record can then be submitted again
//! - `GET /metadata/:id/events` returns every event published so far
//! - `POST /metadata/:id/cancel` requests cancellation
//! - `POST /metadata/validate` normalizes and validates without registering
//! - `GET /metadata/template` returns an empty canonical document to fill in

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rights_common::events::ProgressEvent;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::{CanonicalMetadata, ReleaseType, SubmissionSnapshot};
use crate::normalize::{apply_updates, normalize, FieldUpdates, RecordFormat};
use crate::validators::{validate_for_registration, RegistrationReadiness};
use crate::workflow::CancelDisposition;
use crate::{ApiError, ApiResult, AppState};

/// Largest track count a template may be generated for
const MAX_TEMPLATE_TRACKS: u32 = 100;

/// POST /metadata response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub message: String,
    pub submission_id: Uuid,
    pub ws_endpoint: String,
}

/// POST /metadata/:id/cancel response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelResponse {
    pub submission_id: Uuid,
    pub disposition: CancelDisposition,
}

/// Verdict of `POST /metadata/validate`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValidationStatus {
    /// Already canonical and complete
    Valid,
    /// Complete after mapping from another shape
    Reformatted,
    /// Missing fields or malformed identifiers
    Incomplete,
}

/// POST /metadata/validate response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub status: ValidationStatus,
    pub format: RecordFormat,
    pub metadata: CanonicalMetadata,
    #[serde(flatten)]
    pub readiness: RegistrationReadiness,
}

/// PATCH /metadata/:id response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmendResponse {
    pub submission_id: Uuid,
    /// `VALID` once nothing is missing or malformed, else `INCOMPLETE`
    pub status: ValidationStatus,
    /// Paths written by this request, in order
    pub updated: Vec<String>,
    pub metadata: CanonicalMetadata,
    #[serde(flatten)]
    pub readiness: RegistrationReadiness,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateParams {
    pub release_type: Option<String>,
    pub track_count: Option<u32>,
}

fn submission_body(body: Result<Json<Value>, JsonRejection>) -> ApiResult<Value> {
    let Json(value) = body.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(e.body_text())
        } else {
            ApiError::BadRequest(e.body_text())
        }
    })?;
    if !value.is_object() {
        return Err(ApiError::BadRequest(
            "submission must be a JSON object".to_string(),
        ));
    }
    Ok(value)
}

/// POST /metadata
pub async fn submit_metadata(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SubmitResponse>)> {
    let raw = submission_body(body)?;
    let handle = state.orchestrator.submit(raw);
    let submission_id = handle.submission_id();

    tracing::info!(submission_id = %submission_id, spawned = handle.is_spawned(), "Submission accepted");

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            success: true,
            message: "Metadata received, processing started".to_string(),
            submission_id,
            ws_endpoint: state.config.ws_endpoint(submission_id),
        }),
    ))
}

/// GET /metadata/:id
pub async fn get_submission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SubmissionSnapshot>> {
    state
        .registry
        .snapshot(id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Submission {}", id)))
}

/// GET /metadata/:id/events
pub async fn get_submission_events(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<ProgressEvent>>> {
    state
        .registry
        .events(id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Submission {}", id)))
}

/// PATCH /metadata/:id
pub async fn amend_submission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<FieldUpdates>, JsonRejection>,
) -> ApiResult<Json<AmendResponse>> {
    let Json(updates) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let updates = updates.into_vec();
    let paths: Vec<String> = updates.iter().map(|u| u.path.clone()).collect();

    let metadata = state
        .registry
        .amend_canonical::<ApiError>(id, &paths, |current| {
            Ok(apply_updates(current, &updates)?)
        })?;
    let readiness = validate_for_registration(&metadata);

    let status = if readiness.report.is_clean() {
        ValidationStatus::Valid
    } else {
        ValidationStatus::Incomplete
    };
    tracing::info!(
        submission_id = %id,
        fields = paths.len(),
        status = ?status,
        "Submission amended"
    );

    Ok(Json(AmendResponse {
        submission_id: id,
        status,
        updated: paths,
        metadata,
        readiness,
    }))
}

/// POST /metadata/:id/cancel
pub async fn cancel_submission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CancelResponse>> {
    let disposition = state.orchestrator.cancel(id)?;
    Ok(Json(CancelResponse {
        submission_id: id,
        disposition,
    }))
}

/// POST /metadata/validate
pub async fn validate_metadata(
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<ValidateResponse>> {
    let raw = submission_body(body)?;
    let outcome = normalize(&raw);
    let readiness = validate_for_registration(&outcome.metadata);

    let status = if !readiness.report.is_clean() {
        ValidationStatus::Incomplete
    } else if outcome.format == RecordFormat::Canonical {
        ValidationStatus::Valid
    } else {
        ValidationStatus::Reformatted
    };

    Ok(Json(ValidateResponse {
        status,
        format: outcome.format,
        metadata: outcome.metadata,
        readiness,
    }))
}

/// GET /metadata/template
pub async fn metadata_template(
    Query(params): Query<TemplateParams>,
) -> ApiResult<Json<CanonicalMetadata>> {
    let release_type = params
        .release_type
        .as_deref()
        .and_then(ReleaseType::from_label)
        .unwrap_or_default();
    let track_count = params.track_count.unwrap_or(1);

    if track_count > MAX_TEMPLATE_TRACKS {
        return Err(ApiError::BadRequest(format!(
            "trackCount must be at most {}",
            MAX_TEMPLATE_TRACKS
        )));
    }

    Ok(Json(CanonicalMetadata::template(release_type, track_count)))
}

/// Build submission routes
pub fn submission_routes() -> Router<AppState> {
    Router::new()
        .route("/metadata", post(submit_metadata))
        .route("/metadata/validate", post(validate_metadata))
        .route("/metadata/template", get(metadata_template))
        .route("/metadata/:id", get(get_submission).patch(amend_submission))
        .route("/metadata/:id/events", get(get_submission_events))
        .route("/metadata/:id/cancel", post(cancel_submission))
}
