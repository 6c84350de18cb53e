//! HTTP API handlers for rights-ingest
//!
//! - **submission** - intake, status, cancel, synchronous validation, templates
//! - **ws** - progress socket
//! - **health** - liveness and diagnostics

pub mod health;
pub mod submission;
pub mod ws;

pub use health::health_routes;
pub use submission::submission_routes;
pub use ws::ws_routes;
