use async_trait::async_trait;
use pes_gateway_repository::StoreSession;
use pes_gateway_shared::types::{EntityKind, Organization, OwnerRef, Record};
use serde_json::Value;

use crate::errors::RecordError;
use crate::importer::nested::{check_contact, resolve_contact, sync_contacts, sync_engagements};
use crate::importer::ImportHandler;
use crate::serializer::{deserialize_organization, parse_document, OrganizationDocument};
use crate::translations::Translations;

/// Organizations carry contacts and members. Legal statuses and transverse
/// themes are translated with the tables built earlier in the run.
pub struct OrganizationHandler;

#[async_trait]
impl ImportHandler for OrganizationHandler {
    fn kind(&self) -> EntityKind {
        EntityKind::Organization
    }

    async fn map(
        &self,
        session: &mut dyn StoreSession,
        document: &Value,
        translations: &Translations,
    ) -> Result<Record, RecordError> {
        let document: OrganizationDocument = parse_document(document)?;
        let mut organization = Organization::default();
        deserialize_organization(&mut organization, &document, translations)?;
        let owner = OwnerRef::organization(&organization.uuid);
        organization.pref_email =
            resolve_contact(session, &owner, organization.pref_email.take()).await?;
        organization.pref_phone =
            resolve_contact(session, &owner, organization.pref_phone.take()).await?;
        Ok(organization.into())
    }

    async fn sync_nested(
        &self,
        session: &mut dyn StoreSession,
        record: &Record,
        document: &Value,
        translations: &Translations,
    ) -> Result<bool, RecordError> {
        let document: OrganizationDocument = parse_document(document)?;
        let owner = OwnerRef::organization(record.key());

        let contacts_changed =
            sync_contacts(session, &owner, document.contacts.as_deref().unwrap_or_default())
                .await?;
        let members_changed = sync_engagements(
            session,
            record.key(),
            document.members.as_deref(),
            translations,
        )
        .await?;

        check_contact(session, &owner, "pref_email", document.pref_email.as_deref()).await?;
        check_contact(session, &owner, "pref_phone", document.pref_phone.as_deref()).await?;
        Ok(contacts_changed || members_changed)
    }
}
