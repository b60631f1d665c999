use async_trait::async_trait;
use pes_gateway_repository::StoreSession;
use pes_gateway_shared::types::{EntityKind, Location, Record};
use serde_json::Value;

use crate::errors::RecordError;
use crate::importer::ImportHandler;
use crate::serializer::{deserialize_location, parse_document, LocationDocument};
use crate::translations::Translations;

pub struct LocationHandler;

#[async_trait]
impl ImportHandler for LocationHandler {
    fn kind(&self) -> EntityKind {
        EntityKind::Location
    }

    async fn map(
        &self,
        _session: &mut dyn StoreSession,
        document: &Value,
        _translations: &Translations,
    ) -> Result<Record, RecordError> {
        let document: LocationDocument = parse_document(document)?;
        let mut location = Location::default();
        deserialize_location(&mut location, &document)?;
        Ok(location.into())
    }
}
