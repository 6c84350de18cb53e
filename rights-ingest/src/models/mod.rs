//! Data models for rights-ingest
//!
//! - Canonical metadata schema every submission is normalized into
//! - Submission record tracked by the registry

pub mod canonical;
pub mod submission;

pub use canonical::{
    CanonicalMetadata, Composition, Label, Performer, Producer, Recording, Release, ReleaseType,
    Submitter, Track, Writer,
};
pub use submission::{SubmissionRecord, SubmissionSnapshot};
