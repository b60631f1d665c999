//! Error types for the export path.
use pes_gateway_repository::StoreError;
use pes_gateway_shared::types::EntityKind;
use thiserror::Error;

use crate::errors::{ClientError, SerializationError};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    #[error("{kind} {key} not found")]
    NotFound { kind: EntityKind, key: String },
}
