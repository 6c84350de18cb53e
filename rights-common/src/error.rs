//! Errors raised by the shared rights layer
//!
//! Covers what this crate itself can fail at: reading and writing the TOML
//! configuration and, with the `sqlx` feature, audit database access. Request
//! level failures (unknown submission, malformed body) belong to the service
//! crate's API error.

use thiserror::Error;

/// Result type for rights-common operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Audit database failure (wraps sqlx::Error)
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Config file could not be read or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file missing, unparseable or unserializable
    #[error("Configuration error: {0}")]
    Config(String),

    /// Audit row could not be encoded or decoded
    #[error("Internal error: {0}")]
    Internal(String),
}
