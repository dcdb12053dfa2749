//! Error types for distritree
//!
//! Provides a unified error type for index and storage operations.

use thiserror::Error;

use crate::storage::{Key, PartitionId};

/// Result type alias using DistriError
pub type Result<T> = std::result::Result<T, DistriError>;

/// Unified error type for distritree operations
#[derive(Debug, Error)]
pub enum DistriError {
    // -------------------------------------------------------------------------
    // Index Errors
    // -------------------------------------------------------------------------
    #[error("duplicate key: {0}")]
    DuplicateKey(Key),

    #[error("invalid range: start {start} > end {end}")]
    InvalidRange { start: Key, end: Key },

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("unknown partition: {0}")]
    UnknownPartition(PartitionId),

    #[error("partition {partition} unavailable: {reason}")]
    PartitionUnavailable { partition: String, reason: String },

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("configuration error: {0}")]
    Config(String),
}
