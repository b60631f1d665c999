//! Error types for the serialization layer.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("Invalid document: {0}")]
    InvalidDocument(#[from] serde_json::Error),

    #[error("Required field `{0}` is missing")]
    MissingField(&'static str),

    #[error("Required field `{0}` is null")]
    NullField(&'static str),

    #[error("Unknown value `{value}` for field `{field}`")]
    UnknownValue { field: &'static str, value: String },

    #[error("Local role {0} has no counterpart on the PES")]
    UntranslatableRole(String),
}
