//! Registration workflow
//!
//! - **registry** - owns submission records; the only writer of their state
//! - **progress_channel** - per-submission event buffer with one live subscriber
//! - **pipeline** - the orchestrator driving each submission to a terminal stage

pub mod pipeline;
pub mod progress_channel;
pub mod registry;

pub use pipeline::{
    CancelDisposition, PipelineConfig, PipelineHandle, PipelineOrchestrator,
};
pub use progress_channel::{ChannelConfig, ChannelError, ProgressChannel, ProgressSubscription};
pub use registry::{RegistryError, SubmissionRegistry};
