use async_trait::async_trait;
use pes_gateway_repository::StoreSession;
use pes_gateway_shared::types::{Calendar, EntityKind, Event, Record};
use serde_json::Value;

use crate::errors::RecordError;
use crate::importer::handlers::{existing_references, optional_reference, required_reference};
use crate::importer::ImportHandler;
use crate::serializer::{
    deserialize_calendar, deserialize_event, parse_document, CalendarDocument, EventDocument,
};
use crate::translations::Translations;

pub struct CalendarHandler;

#[async_trait]
impl ImportHandler for CalendarHandler {
    fn kind(&self) -> EntityKind {
        EntityKind::Calendar
    }

    async fn map(
        &self,
        _session: &mut dyn StoreSession,
        document: &Value,
        _translations: &Translations,
    ) -> Result<Record, RecordError> {
        let document: CalendarDocument = parse_document(document)?;
        let mut calendar = Calendar::default();
        deserialize_calendar(&mut calendar, &document)?;
        Ok(calendar.into())
    }
}

/// Events require their calendar; organization references are optional and
/// dropped when unknown.
pub struct EventHandler;

#[async_trait]
impl ImportHandler for EventHandler {
    fn kind(&self) -> EntityKind {
        EntityKind::Event
    }

    async fn map(
        &self,
        session: &mut dyn StoreSession,
        document: &Value,
        _translations: &Translations,
    ) -> Result<Record, RecordError> {
        let document: EventDocument = parse_document(document)?;
        let mut event = Event::default();
        deserialize_event(&mut event, &document)?;

        required_reference(session, EntityKind::Calendar, &event.calendar).await?;
        event.organization = optional_reference(
            session,
            EntityKind::Organization,
            event.organization.take(),
            &event.uuid,
        )
        .await?;
        event.organizations = existing_references(
            session,
            EntityKind::Organization,
            std::mem::take(&mut event.organizations),
            &event.uuid,
        )
        .await?;
        Ok(event.into())
    }
}
