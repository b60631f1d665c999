use async_trait::async_trait;
use pes_gateway_repository::StoreSession;
use pes_gateway_shared::types::{EntityKind, OwnerRef, Person, Record};
use serde_json::Value;

use crate::errors::RecordError;
use crate::importer::nested::{check_contact, resolve_contact, sync_contacts};
use crate::importer::ImportHandler;
use crate::serializer::{deserialize_person, parse_document, PersonDocument};
use crate::translations::Translations;

/// Persons carry their contacts; `pref_email` points at one of them.
pub struct PersonHandler;

#[async_trait]
impl ImportHandler for PersonHandler {
    fn kind(&self) -> EntityKind {
        EntityKind::Person
    }

    async fn map(
        &self,
        session: &mut dyn StoreSession,
        document: &Value,
        _translations: &Translations,
    ) -> Result<Record, RecordError> {
        let document: PersonDocument = parse_document(document)?;
        let mut person = Person::default();
        deserialize_person(&mut person, &document)?;
        let owner = OwnerRef::person(&person.uuid);
        person.pref_email = resolve_contact(session, &owner, person.pref_email.take()).await?;
        Ok(person.into())
    }

    async fn sync_nested(
        &self,
        session: &mut dyn StoreSession,
        record: &Record,
        document: &Value,
        _translations: &Translations,
    ) -> Result<bool, RecordError> {
        let document: PersonDocument = parse_document(document)?;
        let owner = OwnerRef::person(record.key());
        let changed =
            sync_contacts(session, &owner, document.contacts.as_deref().unwrap_or_default())
                .await?;
        check_contact(session, &owner, "pref_email", document.pref_email.as_deref()).await?;
        Ok(changed)
    }
}
