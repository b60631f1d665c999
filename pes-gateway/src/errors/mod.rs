//! Error types for the gateway binary.
//! Consolidates the errors of the store, the remote client and both sync
//! directions.
use pes_gateway_pipeline::errors::{ClientError, ExportError, ImportError};
use pes_gateway_repository::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Client error: {0}")]
    Client(#[from] ClientError),
    #[error("Import error: {0}")]
    Import(#[from] ImportError),
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
    #[error("{failed} record(s) could not be exported")]
    ExportIncomplete { failed: usize },
}
