//! Error types for an import run.
use pes_gateway_repository::StoreError;
use thiserror::Error;

/// Errors raised outside the per-record guards. Any of these aborts the run
/// and rolls back its transaction.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("No import handler registered for {0}")]
    MissingHandler(pes_gateway_shared::types::EntityKind),
}
