//! Reconciliation of the rows nested in an owner document: contacts and
//! organization members.
use std::collections::HashSet;

use pes_gateway_repository::StoreSession;
use pes_gateway_shared::types::{Contact, Engagement, EntityKind, OwnerRef};
use tracing::{debug, warn};

use crate::errors::RecordError;
use crate::serializer::{ContactDocument, MemberDocument};
use crate::translations::Translations;

/// Makes the contacts owned by `owner` match `incoming` exactly.
///
/// Contacts are found or created by uuid. A contact already owned by someone
/// else is an ownership conflict. Owned contacts absent from `incoming` are
/// deleted. Returns `true` if anything was written.
pub(crate) async fn sync_contacts(
    session: &mut dyn StoreSession,
    owner: &OwnerRef,
    incoming: &[ContactDocument],
) -> Result<bool, RecordError> {
    let mut changed = false;
    let mut kept = HashSet::with_capacity(incoming.len());

    for document in incoming {
        if !kept.insert(document.uuid.as_str()) {
            continue;
        }
        let desired = Contact {
            uuid: document.uuid.clone(),
            content: document.content.clone(),
            contact_medium: document.contact_medium,
            owner: owner.clone(),
        };
        match session.find_contact(&document.uuid).await? {
            Some(existing) if existing.owner != *owner => {
                return Err(RecordError::OwnershipConflict {
                    contact: existing.uuid,
                    owner: existing.owner,
                });
            }
            Some(existing) if existing == desired => {}
            _ => {
                session.save_contact(&desired).await?;
                changed = true;
            }
        }
    }

    for contact in session.contacts_of(owner).await? {
        if !kept.contains(contact.uuid.as_str()) {
            debug!(owner = %owner, contact = %contact.uuid, "Deleting dropped contact");
            session.delete_contact(&contact.uuid).await?;
            changed = true;
        }
    }
    Ok(changed)
}

/// Replaces the engagements of `organization` when `members` is present and
/// differs from the current set.
///
/// Members must reference existing persons. Roles go through the translation
/// table; an untranslatable role leaves the engagement without one.
pub(crate) async fn sync_engagements(
    session: &mut dyn StoreSession,
    organization: &str,
    members: Option<&[MemberDocument]>,
    translations: &Translations,
) -> Result<bool, RecordError> {
    let Some(members) = members else {
        return Ok(false);
    };

    let mut desired = Vec::with_capacity(members.len());
    for member in members {
        if session.find(EntityKind::Person, &member.person).await?.is_none() {
            return Err(RecordError::ReferenceNotFound {
                kind: EntityKind::Person,
                key: member.person.clone(),
            });
        }
        let role = member.role.as_deref().and_then(|remote| {
            let local = translations.role(remote);
            if local.is_none() {
                warn!(
                    organization,
                    person = %member.person,
                    role = remote,
                    "Unknown member role, leaving it empty"
                );
            }
            local.map(str::to_string)
        });
        desired.push(Engagement {
            organization: organization.to_string(),
            person: member.person.clone(),
            role,
            role_detail: member.role_detail.clone(),
        });
    }

    let mut current = session.engagements_of(organization).await?;
    current.sort();
    let mut sorted = desired.clone();
    sorted.sort();
    if current == sorted {
        return Ok(false);
    }

    session.delete_engagements(organization).await?;
    for engagement in &desired {
        session.insert_engagement(engagement).await?;
    }
    Ok(true)
}

/// Keeps a preferred contact reference only if the contact exists and is
/// owned by `owner`.
pub(crate) async fn resolve_contact(
    session: &mut dyn StoreSession,
    owner: &OwnerRef,
    uuid: Option<String>,
) -> Result<Option<String>, RecordError> {
    let Some(uuid) = uuid else {
        return Ok(None);
    };
    let owned = session
        .find_contact(&uuid)
        .await?
        .is_some_and(|contact| contact.owner == *owner);
    Ok(owned.then_some(uuid))
}

/// Warns about a preferred contact that is still unknown, or owned by
/// someone else, after the nested contacts were reconciled.
pub(crate) async fn check_contact(
    session: &mut dyn StoreSession,
    owner: &OwnerRef,
    field: &'static str,
    uuid: Option<&str>,
) -> Result<(), RecordError> {
    let Some(uuid) = uuid else {
        return Ok(());
    };
    match session.find_contact(uuid).await? {
        Some(contact) if contact.owner == *owner => {}
        Some(contact) => warn!(
            owner = %owner,
            field,
            contact = uuid,
            contact_owner = %contact.owner,
            "Preferred contact belongs to someone else, leaving it empty"
        ),
        None => warn!(
            owner = %owner,
            field,
            contact = uuid,
            "Unknown preferred contact, leaving it empty"
        ),
    }
    Ok(())
}
