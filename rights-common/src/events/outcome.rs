//! Terminal outcome types for a submission

use super::Stage;
use serde::{Deserialize, Serialize};

/// Which of the two uploaded documents a reference or error concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// IP metadata document (rights description)
    Ip,
    /// Display ("NFT-style") metadata document
    Display,
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKind::Ip => write!(f, "IP metadata document"),
            DocumentKind::Display => write!(f, "display metadata document"),
        }
    }
}

/// Handle to a document stored in content-addressed storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRef {
    pub document: DocumentKind,
    pub content_id: String,
    /// Hex SHA-256 of the stored bytes (no `0x` prefix)
    pub content_hash: String,
}

/// Classification of a terminal failure
///
/// `Timeout` is kept apart from the others: the remote side may still be
/// working on it, whereas every other kind is a definite failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    /// Storage upload of one document failed
    Upload,
    /// Registrar rejected a content hash as malformed
    HashFormat,
    /// Registrar rejected the collection contract reference
    ContractReference,
    /// Ledger transaction or network failure
    Transaction,
    /// No progress within the stall window
    Timeout,
    /// Caller cancelled before uploading began
    Cancelled,
}

impl FailureKind {
    pub fn is_definite(&self) -> bool {
        !matches!(self, FailureKind::Timeout)
    }
}

/// Final result of one submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum PipelineOutcome {
    /// Asset minted and registered
    Complete {
        asset_id: String,
        transaction_receipt: String,
        ip_content: ContentRef,
        display_content: ContentRef,
    },

    /// Validation halted the pipeline before any external side effect
    Incomplete {
        missing_fields: Vec<String>,
        format_errors: Vec<String>,
    },

    /// External call failed, timed out, or the caller cancelled
    Failed {
        /// Stage that was running when the failure happened
        stage: Stage,
        kind: FailureKind,
        message: String,
        /// Documents already stored before the failure, so a retry can skip them
        #[serde(default)]
        uploaded_content: Vec<ContentRef>,
    },
}

impl PipelineOutcome {
    /// Terminal stage this outcome corresponds to
    pub fn stage(&self) -> Stage {
        match self {
            PipelineOutcome::Complete { .. } => Stage::Complete,
            PipelineOutcome::Incomplete { .. } => Stage::Incomplete,
            PipelineOutcome::Failed { .. } => Stage::Failed,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PipelineOutcome::Complete { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failed_outcome_wire_shape() {
        let outcome = PipelineOutcome::Failed {
            stage: Stage::Registering,
            kind: FailureKind::HashFormat,
            message: "bad hash".to_string(),
            uploaded_content: vec![ContentRef {
                document: DocumentKind::Ip,
                content_id: "ipfs://Qm1".to_string(),
                content_hash: "ab".to_string(),
            }],
        };

        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            value,
            json!({
                "status": "failed",
                "stage": "Registering",
                "kind": "hashFormat",
                "message": "bad hash",
                "uploadedContent": [
                    {"document": "ip", "contentId": "ipfs://Qm1", "contentHash": "ab"}
                ]
            })
        );
    }

    #[test]
    fn test_incomplete_outcome_wire_shape() {
        let outcome = PipelineOutcome::Incomplete {
            missing_fields: vec!["release.upc".to_string()],
            format_errors: vec![],
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["status"], "incomplete");
        assert_eq!(value["missingFields"], json!(["release.upc"]));
        assert_eq!(outcome.stage(), Stage::Incomplete);
    }

    #[test]
    fn test_timeout_is_not_definite() {
        assert!(!FailureKind::Timeout.is_definite());
        assert!(FailureKind::Transaction.is_definite());
        assert!(FailureKind::Upload.is_definite());
    }

    #[test]
    fn test_document_kind_display_names_document() {
        assert!(DocumentKind::Display.to_string().contains("display"));
        assert!(DocumentKind::Ip.to_string().contains("IP"));
    }
}
