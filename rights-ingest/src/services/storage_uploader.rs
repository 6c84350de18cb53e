//! Content-addressed storage client
//!
//! Stores a JSON document and returns its content id together with the hex
//! SHA-256 of the bytes that were sent. The provided implementation talks to
//! a JSON pinning service over HTTP; tests substitute their own uploader.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::time::Duration;
use thiserror::Error;

pub use rights_common::events::DocumentKind as UploadTarget;

const USER_AGENT: &str = concat!("rights-ingest/", env!("CARGO_PKG_VERSION"));
const PIN_JSON_PATH: &str = "/pinning/pinJSONToIPFS";

/// Upload failure, tagged with the document it concerns
#[derive(Debug, Clone, Error)]
#[error("failed to store {target}: {message}")]
pub struct UploadError {
    pub target: UploadTarget,
    pub message: String,
}

impl UploadError {
    pub fn new(target: UploadTarget, message: impl Into<String>) -> Self {
        Self {
            target,
            message: message.into(),
        }
    }
}

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredContent {
    /// Storage locator, e.g. `ipfs://<cid>`
    pub content_id: String,
    /// Hex SHA-256 of the serialized document, no `0x` prefix
    pub content_hash: String,
}

/// Stores one document and reports where it went
#[async_trait]
pub trait StorageUploader: Send + Sync {
    async fn upload(
        &self,
        target: UploadTarget,
        document: &Value,
    ) -> Result<StoredContent, UploadError>;
}

/// Canonical byte form of a document: compact JSON
pub fn serialize_document(document: &Value) -> Vec<u8> {
    serde_json::to_vec(document).unwrap_or_default()
}

/// Hex SHA-256 of a document's canonical byte form
pub fn content_hash(document: &Value) -> String {
    let digest = Sha256::digest(serialize_document(document));
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

/// Uploader backed by a JSON pinning service (bearer-token auth)
pub struct PinningServiceUploader {
    http_client: reqwest::Client,
    base_url: String,
    jwt: String,
}

impl PinningServiceUploader {
    pub fn new(base_url: impl Into<String>, jwt: impl Into<String>) -> Result<Self, UploadError> {
        Self::with_timeout(base_url, jwt, Duration::from_secs(30))
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        jwt: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, UploadError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| UploadError::new(UploadTarget::Ip, format!("client setup: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            jwt: jwt.into(),
        })
    }
}

#[async_trait]
impl StorageUploader for PinningServiceUploader {
    async fn upload(
        &self,
        target: UploadTarget,
        document: &Value,
    ) -> Result<StoredContent, UploadError> {
        if self.jwt.trim().is_empty() {
            return Err(UploadError::new(target, "storage credentials not configured"));
        }

        let body = serialize_document(document);
        let hash = content_hash(document);
        let url = format!("{}{}", self.base_url, PIN_JSON_PATH);

        tracing::debug!(target_document = %target, bytes = body.len(), "Pinning document");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.jwt)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| UploadError::new(target, format!("network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(UploadError::new(
                target,
                format!("storage service returned {}: {}", status.as_u16(), text),
            ));
        }

        let pinned: PinResponse = response
            .json()
            .await
            .map_err(|e| UploadError::new(target, format!("unreadable response: {}", e)))?;

        tracing::info!(
            target_document = %target,
            cid = %pinned.ipfs_hash,
            "Document pinned"
        );

        Ok(StoredContent {
            content_id: format!("ipfs://{}", pinned.ipfs_hash),
            content_hash: hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_hash_is_sha256_hex() {
        // sha256("{}")
        assert_eq!(
            content_hash(&json!({})),
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
    }

    #[test]
    fn test_upload_error_names_document() {
        let err = UploadError::new(UploadTarget::Display, "timed out");
        assert_eq!(
            err.to_string(),
            "failed to store display metadata document: timed out"
        );
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let uploader = PinningServiceUploader::new("https://pin.example/", "jwt").unwrap();
        assert_eq!(uploader.base_url, "https://pin.example");
    }
}
