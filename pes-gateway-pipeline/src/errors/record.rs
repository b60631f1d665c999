//! Error types for the reconciliation of a single record.
//!
//! A `RecordError` abandons one record: its savepoint is rolled back, the
//! error is reported and the run moves on.
use pes_gateway_repository::StoreError;
use pes_gateway_shared::types::{EntityKind, OwnerRef};
use thiserror::Error;

use crate::errors::SerializationError;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Storage conflict: {0}")]
    Conflict(String),

    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),

    #[error("Referenced {kind} {key} not found")]
    ReferenceNotFound { kind: EntityKind, key: String },

    #[error("Contact {contact} belongs to {owner}")]
    OwnershipConflict { contact: String, owner: OwnerRef },

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Storage error: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for RecordError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => RecordError::Conflict(msg),
            StoreError::IntegrityViolation(msg) => RecordError::IntegrityViolation(msg),
            StoreError::NotFound { kind, key } => RecordError::ReferenceNotFound { kind, key },
            err @ StoreError::NativeDependents { .. } => {
                RecordError::IntegrityViolation(err.to_string())
            }
            other => RecordError::Storage(other),
        }
    }
}

impl From<SerializationError> for RecordError {
    fn from(err: SerializationError) -> Self {
        match err {
            // A required column left null is rejected the way the database would.
            SerializationError::NullField(field) => {
                RecordError::IntegrityViolation(format!("{field} may not be null"))
            }
            other => RecordError::InvalidDocument(other.to_string()),
        }
    }
}
