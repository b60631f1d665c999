use pes_gateway_shared::types::EntityKind;
use thiserror::Error;

/// Represents errors that can occur within a store session.
///
/// Database failures are classified on the way in: integrity violations
/// (SQLSTATE class 23) and serialization conflicts (40001, 40P01) get their
/// own variants so callers can report them per record.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),

    #[error("Storage conflict: {0}")]
    Conflict(String),

    #[error("Ownership marker already exists for {kind} {key}")]
    MarkerExists { kind: EntityKind, key: String },

    #[error("{kind} {key} is still referenced by natively-owned {dependent_kind} {dependent}")]
    NativeDependents {
        kind: EntityKind,
        key: String,
        dependent_kind: EntityKind,
        dependent: String,
    },

    #[error("{kind} {key} not found")]
    NotFound { kind: EntityKind, key: String },

    #[error("Expected a {expected} record, found a {found} record")]
    UnexpectedRecord {
        expected: EntityKind,
        found: EntityKind,
    },

    #[error("Invalid stored value: {0}")]
    InvalidValue(String),

    #[error("No open savepoint")]
    NoSavepoint,

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::IntegrityViolation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let classified = match &err {
            sqlx::Error::Database(db) => match db.code() {
                Some(code) if code.starts_with("23") => {
                    Some(StoreError::IntegrityViolation(db.message().to_string()))
                }
                Some(code) if code == "40001" || code == "40P01" => {
                    Some(StoreError::Conflict(db.message().to_string()))
                }
                _ => None,
            },
            _ => None,
        };
        classified.unwrap_or(StoreError::Database(err))
    }
}
