//! Error types for ingestion, alias management and persistence
//!
//! Validation failures are rejected before any state is touched. Persistence
//! failures are isolated to the write or load that raised them; none of these
//! errors is fatal to the process.

use thiserror::Error;

use crate::utils::atomic::AtomicError;

/// Result type for ingestion and alias validation
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Result type for snapshot reads and writes
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// A request was malformed and was rejected without mutating state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("log payload must be a JSON object")]
    NotAnObject,

    #[error("log message must be a non-empty string")]
    MissingMessage,

    #[error("invalid log level '{0}' (expected one of DEBUG, INFO, WARN, WARNING, ERROR, FATAL)")]
    InvalidLevel(String),

    #[error("emitter id must not be empty")]
    EmptyEmitterId,

    #[error("invalid alias data: {0}")]
    InvalidAliases(String),
}

/// A snapshot could not be read or written
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot corrupted: {0}")]
    Corrupted(String),

    #[error("atomic write failed: {0}")]
    Atomic(#[from] AtomicError),
}
