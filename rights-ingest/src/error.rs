//! Error types for rights-ingest
//!
//! Every handler returns [`ApiResult`]; failures render as
//! `{"error": {"code": ..., "message": ...}}` with a matching status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::normalize::AmendError;
use crate::workflow::{ChannelError, RegistryError};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Body over the size limit (413)
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Conflict (409), e.g. a second live subscriber
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),

    /// rights-common error
    #[error("Common error: {0}")]
    Common(#[from] rights_common::Error),
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(_) => ApiError::NotFound(err.to_string()),
            RegistryError::IllegalTransition { .. }
            | RegistryError::AlreadySet { .. }
            | RegistryError::NotAmendable { .. } => ApiError::Conflict(err.to_string()),
        }
    }
}

impl From<AmendError> for ApiError {
    fn from(err: AmendError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<ChannelError> for ApiError {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::NotFound(_) => ApiError::NotFound(err.to_string()),
            ChannelError::AlreadySubscribed(_) => ApiError::Conflict(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg)
            }
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Other(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                err.to_string(),
            ),
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMMON_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_status_codes() {
        let id = Uuid::new_v4();
        let cases = [
            (ApiError::from(RegistryError::NotFound(id)), StatusCode::NOT_FOUND),
            (ApiError::from(ChannelError::AlreadySubscribed(id)), StatusCode::CONFLICT),
            (ApiError::BadRequest("bad".into()), StatusCode::BAD_REQUEST),
            (ApiError::PayloadTooLarge("big".into()), StatusCode::PAYLOAD_TOO_LARGE),
            (
                ApiError::Common(rights_common::Error::Config("x".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
