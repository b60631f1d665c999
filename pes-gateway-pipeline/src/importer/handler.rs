use async_trait::async_trait;
use pes_gateway_repository::StoreSession;
use pes_gateway_shared::types::{EntityKind, Record};
use serde_json::Value;

use crate::errors::RecordError;
use crate::translations::Translations;

/// Per-kind mapping used by the reconciliation engine.
///
/// The engine owns classification, markers, savepoints and the sweep; a
/// handler only knows how a remote document becomes a local record and which
/// nested rows come with it.
#[async_trait]
pub trait ImportHandler: Send + Sync {
    fn kind(&self) -> EntityKind;

    /// Maps a remote document onto the desired local record.
    ///
    /// Optional references are resolved against `session`; missing ones are
    /// left empty.
    async fn map(
        &self,
        session: &mut dyn StoreSession,
        document: &Value,
        translations: &Translations,
    ) -> Result<Record, RecordError>;

    /// Reconciles the rows nested in `document` once `record` is persisted.
    ///
    /// Returns `true` if any nested row changed, in which case the engine maps
    /// the document again.
    async fn sync_nested(
        &self,
        _session: &mut dyn StoreSession,
        _record: &Record,
        _document: &Value,
        _translations: &Translations,
    ) -> Result<bool, RecordError> {
        Ok(false)
    }
}
