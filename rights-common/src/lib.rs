//! # Rights Common Library
//!
//! Shared code for the rights services including:
//! - Progress event and pipeline outcome wire types
//! - Reconnection backoff policy for progress subscribers
//! - Configuration loading
//! - Common error type

pub mod config;
pub mod error;
pub mod events;
pub mod reconnect;

pub use error::{Error, Result};
pub use events::{PipelineOutcome, ProgressEvent, Stage};
