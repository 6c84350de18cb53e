//! Test doubles for the external services
//!
//! Each double records what the pipeline handed it so tests can assert on
//! call order and payloads without a network.

use async_trait::async_trait;
use rights_common::{Error, Result};
use rights_ingest::db::{AuditRecord, AuditSink};
use rights_ingest::services::{
    content_hash, LedgerRegistrar, RegistrationError, RegistrationReceipt, RegistrationRequest,
    StorageUploader, StoredContent, UploadError, UploadTarget,
};
use serde_json::Value;
use std::sync::{Arc, Mutex};

pub const ASSET_ID: &str = "0x00000000000000000000000000000000000a55e7";
pub const TX_HASH: &str = "0xfeedface";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UploadBehavior {
    Succeed,
    FailOn(UploadTarget),
    Hang,
}

/// Content store double
pub struct MockUploader {
    behavior: UploadBehavior,
    calls: Mutex<Vec<(UploadTarget, Value)>>,
}

impl MockUploader {
    fn with_behavior(behavior: UploadBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn succeeding() -> Arc<Self> {
        Self::with_behavior(UploadBehavior::Succeed)
    }

    /// Stores every document except `target`
    pub fn failing_on(target: UploadTarget) -> Arc<Self> {
        Self::with_behavior(UploadBehavior::FailOn(target))
    }

    /// Never answers
    pub fn hanging() -> Arc<Self> {
        Self::with_behavior(UploadBehavior::Hang)
    }

    /// Targets in the order they were attempted
    pub fn attempts(&self) -> Vec<UploadTarget> {
        self.calls.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }

    pub fn document(&self, target: UploadTarget) -> Option<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .find(|(t, _)| *t == target)
            .map(|(_, doc)| doc.clone())
    }
}

pub fn content_id_for(target: UploadTarget) -> String {
    match target {
        UploadTarget::Ip => "ipfs://mock-ip".to_string(),
        UploadTarget::Display => "ipfs://mock-display".to_string(),
    }
}

#[async_trait]
impl StorageUploader for MockUploader {
    async fn upload(
        &self,
        target: UploadTarget,
        document: &Value,
    ) -> std::result::Result<StoredContent, UploadError> {
        self.calls.lock().unwrap().push((target, document.clone()));

        match self.behavior {
            UploadBehavior::Hang => std::future::pending().await,
            UploadBehavior::FailOn(failing) if failing == target => {
                Err(UploadError::new(target, "pinning service returned 502"))
            }
            _ => Ok(StoredContent {
                content_id: content_id_for(target),
                content_hash: content_hash(document),
            }),
        }
    }
}

/// Ledger double
pub struct MockRegistrar {
    result: std::result::Result<RegistrationReceipt, RegistrationError>,
    requests: Mutex<Vec<RegistrationRequest>>,
}

impl MockRegistrar {
    pub fn succeeding() -> Arc<Self> {
        Arc::new(Self {
            result: Ok(RegistrationReceipt {
                asset_id: ASSET_ID.to_string(),
                transaction_receipt: TX_HASH.to_string(),
            }),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(error: RegistrationError) -> Arc<Self> {
        Arc::new(Self {
            result: Err(error),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<RegistrationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LedgerRegistrar for MockRegistrar {
    async fn register_asset(
        &self,
        request: &RegistrationRequest,
    ) -> std::result::Result<RegistrationReceipt, RegistrationError> {
        self.requests.lock().unwrap().push(request.clone());
        self.result.clone()
    }
}

/// Audit sink keeping records in memory
#[derive(Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
    fail: bool,
}

impl MemoryAuditSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Sink whose every write fails
    pub fn broken() -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, record: &AuditRecord) -> Result<()> {
        if self.fail {
            return Err(Error::Internal("audit store unavailable".to_string()));
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}
