use async_trait::async_trait;
use pes_gateway_repository::StoreSession;
use pes_gateway_shared::types::{EntityKind, Record, Role};
use serde_json::Value;

use crate::errors::RecordError;
use crate::importer::ImportHandler;
use crate::serializer::{deserialize_role, parse_document, RoleDocument};
use crate::translations::Translations;

pub struct RoleHandler;

#[async_trait]
impl ImportHandler for RoleHandler {
    fn kind(&self) -> EntityKind {
        EntityKind::Role
    }

    async fn map(
        &self,
        _session: &mut dyn StoreSession,
        document: &Value,
        _translations: &Translations,
    ) -> Result<Record, RecordError> {
        let document: RoleDocument = parse_document(document)?;
        let mut role = Role::default();
        deserialize_role(&mut role, &document)?;
        Ok(role.into())
    }
}
