//! Submission registry
//!
//! Owns every in-flight and recently finished [`SubmissionRecord`]. The map
//! lock is held only long enough to look up or insert an entry; writes to a
//! record serialize on that record's own mutex, so submissions never contend
//! with each other.

use chrono::Utc;
use rights_common::events::{PipelineOutcome, ProgressEvent, Stage};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{CanonicalMetadata, SubmissionRecord, SubmissionSnapshot};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Submission not found: {0}")]
    NotFound(Uuid),

    #[error("Illegal stage transition for {id}: {from} -> {to}")]
    IllegalTransition { id: Uuid, from: Stage, to: Stage },

    #[error("{field} already set for submission {id}")]
    AlreadySet { id: Uuid, field: &'static str },

    #[error("Submission {id} is {stage}; only incomplete submissions can be amended")]
    NotAmendable { id: Uuid, stage: Stage },
}

type SharedRecord = Arc<Mutex<SubmissionRecord>>;

/// Registry of submissions keyed by id
#[derive(Default)]
pub struct SubmissionRegistry {
    records: RwLock<HashMap<Uuid, SharedRecord>>,
}

impl SubmissionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, id: Uuid) -> Result<SharedRecord, RegistryError> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or(RegistryError::NotFound(id))
    }

    fn with_record<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut SubmissionRecord) -> Result<T, RegistryError>,
    ) -> Result<T, RegistryError> {
        let record = self.get(id)?;
        let mut guard = record.lock().unwrap_or_else(PoisonError::into_inner);
        let result = f(&mut *guard)?;
        guard.updated_at = Utc::now();
        Ok(result)
    }

    /// Register a new submission in stage `Received`
    pub fn create(&self, raw_input: Value) -> Uuid {
        let record = SubmissionRecord::new(raw_input);
        let id = record.id;
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(Mutex::new(record)));
        id
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.get(id).is_ok()
    }

    pub fn snapshot(&self, id: Uuid) -> Option<SubmissionSnapshot> {
        let record = self.get(id).ok()?;
        let guard = record.lock().unwrap_or_else(PoisonError::into_inner);
        Some(guard.snapshot())
    }

    /// Submission as received
    pub fn raw_input(&self, id: Uuid) -> Option<Value> {
        let record = self.get(id).ok()?;
        let guard = record.lock().unwrap_or_else(PoisonError::into_inner);
        Some(guard.raw_input.clone())
    }

    pub fn stage(&self, id: Uuid) -> Option<Stage> {
        let record = self.get(id).ok()?;
        let guard = record.lock().unwrap_or_else(PoisonError::into_inner);
        Some(guard.stage)
    }

    /// Move to `next`, rejecting transitions the state machine forbids
    pub fn advance(&self, id: Uuid, next: Stage) -> Result<(), RegistryError> {
        self.with_record(id, |record| {
            if !record.stage.can_transition_to(next) {
                return Err(RegistryError::IllegalTransition {
                    id,
                    from: record.stage,
                    to: next,
                });
            }
            record.stage = next;
            Ok(())
        })
    }

    /// Store the normalized metadata (once)
    pub fn set_canonical(&self, id: Uuid, metadata: CanonicalMetadata) -> Result<(), RegistryError> {
        self.with_record(id, |record| {
            if record.canonical.is_some() {
                return Err(RegistryError::AlreadySet {
                    id,
                    field: "canonical metadata",
                });
            }
            record.canonical = Some(metadata);
            Ok(())
        })
    }

    /// Store the ledger integration plan (once)
    pub fn set_integration(&self, id: Uuid, plan: Value) -> Result<(), RegistryError> {
        self.with_record(id, |record| {
            if record.integration.is_some() {
                return Err(RegistryError::AlreadySet {
                    id,
                    field: "integration plan",
                });
            }
            record.integration = Some(plan);
            Ok(())
        })
    }

    /// Correct the metadata of a submission that stopped as incomplete
    ///
    /// `amend` gets the current canonical record and returns its replacement;
    /// the record lock is held throughout, so concurrent amendments apply one
    /// after the other. `paths` is appended to the amendment history.
    pub fn amend_canonical<E>(
        &self,
        id: Uuid,
        paths: &[String],
        amend: impl FnOnce(&CanonicalMetadata) -> Result<CanonicalMetadata, E>,
    ) -> Result<CanonicalMetadata, E>
    where
        E: From<RegistryError>,
    {
        let record = self.get(id)?;
        let mut guard = record.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.stage != Stage::Incomplete {
            return Err(RegistryError::NotAmendable {
                id,
                stage: guard.stage,
            }
            .into());
        }

        let current = guard.canonical.clone().unwrap_or_default();
        let amended = amend(&current)?;
        guard.canonical = Some(amended.clone());
        guard.amendments.extend(paths.iter().cloned());
        guard.updated_at = Utc::now();
        Ok(amended)
    }

    /// Record the terminal outcome (once) and move to its terminal stage
    pub fn finish(&self, id: Uuid, outcome: PipelineOutcome) -> Result<(), RegistryError> {
        self.with_record(id, |record| {
            if record.outcome.is_some() {
                return Err(RegistryError::AlreadySet { id, field: "outcome" });
            }
            let terminal = outcome.stage();
            if !record.stage.can_transition_to(terminal) {
                return Err(RegistryError::IllegalTransition {
                    id,
                    from: record.stage,
                    to: terminal,
                });
            }
            record.stage = terminal;
            record.outcome = Some(outcome);
            Ok(())
        })
    }

    pub fn record_event(&self, id: Uuid, event: ProgressEvent) -> Result<(), RegistryError> {
        self.with_record(id, |record| {
            record.events.push(event);
            Ok(())
        })
    }

    pub fn events(&self, id: Uuid) -> Option<Vec<ProgressEvent>> {
        let record = self.get(id).ok()?;
        let guard = record.lock().unwrap_or_else(PoisonError::into_inner);
        Some(guard.events.clone())
    }

    /// Ids of submissions that have not reached a terminal stage
    pub fn list_active(&self) -> Vec<Uuid> {
        let records: Vec<(Uuid, SharedRecord)> = self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, r)| (*id, Arc::clone(r)))
            .collect();

        records
            .into_iter()
            .filter(|(_, r)| !r.lock().unwrap_or_else(PoisonError::into_inner).is_terminal())
            .map(|(id, _)| id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop finished submissions whose last update is older than `older_than`
    ///
    /// Returns the number of records removed.
    pub fn evict_finished(&self, older_than: Duration) -> usize {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(older_than).unwrap_or_else(|_| chrono::Duration::zero());

        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let before = records.len();
        records.retain(|_, record| {
            let guard = record.lock().unwrap_or_else(PoisonError::into_inner);
            !(guard.is_terminal() && guard.updated_at <= cutoff)
        });
        before - records.len()
    }
}
