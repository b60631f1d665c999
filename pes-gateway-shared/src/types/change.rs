use serde::{Deserialize, Serialize};

use crate::types::EntityKind;

/// Whether a store write is broadcast to change observers.
///
/// Every write carries its own flag, so suppressing notifications for one
/// write never affects another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notify {
    Broadcast,
    Suppressed,
}

impl Notify {
    pub fn is_broadcast(&self) -> bool {
        matches!(self, Notify::Broadcast)
    }
}

/// A committed change to a tracked entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum ChangeEvent {
    Saved { kind: EntityKind, key: String },
    Deleted { kind: EntityKind, key: String },
}

impl ChangeEvent {
    pub fn kind(&self) -> EntityKind {
        match self {
            ChangeEvent::Saved { kind, .. } | ChangeEvent::Deleted { kind, .. } => *kind,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            ChangeEvent::Saved { key, .. } | ChangeEvent::Deleted { key, .. } => key,
        }
    }
}
