use std::collections::{BTreeMap, BTreeSet};

use pes_gateway_shared::types::{
    Contact, Engagement, EntityKind, LegalStatus, OwnerRef, Record, TransverseTheme,
};

use crate::errors::StoreError;

/// Full content of an in-memory store.
///
/// The referential rules mirror the PostgreSQL schema: required references
/// must resolve on write, owned rows cascade on delete and optional
/// references are nulled.
#[derive(Debug, Clone, Default)]
pub(crate) struct State {
    records: BTreeMap<EntityKind, BTreeMap<String, Record>>,
    markers: BTreeMap<EntityKind, BTreeSet<String>>,
    contacts: BTreeMap<String, Contact>,
    engagements: Vec<Engagement>,
    legal_statuses: BTreeMap<String, LegalStatus>,
    themes: BTreeMap<i64, TransverseTheme>,
    next_theme_id: i64,
}

impl State {
    pub fn find(&self, kind: EntityKind, key: &str) -> Option<&Record> {
        self.records.get(&kind).and_then(|records| records.get(key))
    }

    pub fn keys(&self, kind: EntityKind) -> Vec<String> {
        self.records
            .get(&kind)
            .map(|records| records.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn exists(&self, kind: EntityKind, key: &str) -> bool {
        self.find(kind, key).is_some()
    }

    fn role_uuid_exists(&self, uuid: &str) -> bool {
        self.records
            .get(&EntityKind::Role)
            .map(|roles| {
                roles
                    .values()
                    .any(|record| matches!(record, Record::Role(role) if role.uuid == uuid))
            })
            .unwrap_or(false)
    }

    fn require(&self, kind: EntityKind, key: &str, from: &str) -> Result<(), StoreError> {
        if self.exists(kind, key) {
            Ok(())
        } else {
            Err(StoreError::integrity(format!(
                "{from} references missing {kind} {key}"
            )))
        }
    }

    fn require_contact(&self, uuid: &str, from: &str) -> Result<(), StoreError> {
        if self.contacts.contains_key(uuid) {
            Ok(())
        } else {
            Err(StoreError::integrity(format!(
                "{from} references missing contact {uuid}"
            )))
        }
    }

    fn check_references(&self, record: &Record) -> Result<(), StoreError> {
        let from = format!("{} {}", record.kind(), record.key());
        match record {
            Record::Role(role) => {
                let duplicate = self
                    .records
                    .get(&EntityKind::Role)
                    .into_iter()
                    .flat_map(|roles| roles.values())
                    .any(|other| {
                        matches!(other, Record::Role(r) if r.uuid == role.uuid && r.slug != role.slug)
                    });
                if duplicate {
                    return Err(StoreError::integrity(format!(
                        "role uuid {} is already used",
                        role.uuid
                    )));
                }
            }
            Record::Person(person) => {
                if let Some(email) = &person.pref_email {
                    self.require_contact(email, &from)?;
                }
            }
            Record::Organization(organization) => {
                if let Some(slug) = &organization.legal_status {
                    if !self.legal_statuses.contains_key(slug) {
                        return Err(StoreError::integrity(format!(
                            "{from} references missing legal status {slug}"
                        )));
                    }
                }
                for theme in &organization.transverse_themes {
                    if !self.themes.contains_key(theme) {
                        return Err(StoreError::integrity(format!(
                            "{from} references missing transverse theme {theme}"
                        )));
                    }
                }
                for contact in [&organization.pref_email, &organization.pref_phone]
                    .into_iter()
                    .flatten()
                {
                    self.require_contact(contact, &from)?;
                }
            }
            Record::Calendar(_) | Record::Location(_) => {}
            Record::Event(event) => {
                self.require(EntityKind::Calendar, &event.calendar, &from)?;
                for organization in event.organization.iter().chain(&event.organizations) {
                    self.require(EntityKind::Organization, organization, &from)?;
                }
            }
            Record::Product(product) => {
                if let Some(organization) = &product.organization {
                    self.require(EntityKind::Organization, organization, &from)?;
                }
            }
            Record::Exchange(exchange) => {
                if let Some(person) = &exchange.person {
                    self.require(EntityKind::Person, person, &from)?;
                }
                if let Some(organization) = &exchange.organization {
                    self.require(EntityKind::Organization, organization, &from)?;
                }
                for product in &exchange.products {
                    self.require(EntityKind::Product, product, &from)?;
                }
            }
        }
        Ok(())
    }

    pub fn save(&mut self, record: &Record) -> Result<(), StoreError> {
        self.check_references(record)?;
        self.records
            .entry(record.kind())
            .or_default()
            .insert(record.key().to_string(), record.clone());
        Ok(())
    }

    pub fn delete(&mut self, kind: EntityKind, key: &str) -> bool {
        let Some(removed) = self
            .records
            .get_mut(&kind)
            .and_then(|records| records.remove(key))
        else {
            return false;
        };
        if let Some(markers) = self.markers.get_mut(&kind) {
            markers.remove(key);
        }
        self.cascade(&removed);
        true
    }

    /// Unmarked records that deleting `key` would delete with it.
    pub fn native_dependents(&self, kind: EntityKind, key: &str) -> Vec<(EntityKind, String)> {
        if kind != EntityKind::Calendar {
            return Vec::new();
        }
        self.records
            .get(&EntityKind::Event)
            .into_iter()
            .flat_map(|events| events.values())
            .filter_map(|record| match record {
                Record::Event(event)
                    if event.calendar == key
                        && !self.marker_exists(EntityKind::Event, &event.uuid) =>
                {
                    Some((EntityKind::Event, event.uuid.clone()))
                }
                _ => None,
            })
            .collect()
    }

    fn cascade(&mut self, removed: &Record) {
        match removed {
            Record::Role(role) => {
                for engagement in &mut self.engagements {
                    if engagement.role.as_deref() == Some(role.uuid.as_str()) {
                        engagement.role = None;
                    }
                }
            }
            Record::Person(person) => {
                self.delete_owned_contacts(&OwnerRef::person(person.uuid.clone()));
                self.engagements.retain(|e| e.person != person.uuid);
                self.for_each_record(EntityKind::Exchange, |record| {
                    if let Record::Exchange(exchange) = record {
                        if exchange.person.as_deref() == Some(person.uuid.as_str()) {
                            exchange.person = None;
                        }
                    }
                });
            }
            Record::Organization(organization) => {
                let uuid = organization.uuid.as_str();
                self.delete_owned_contacts(&OwnerRef::organization(uuid));
                self.engagements.retain(|e| e.organization != uuid);
                self.for_each_record(EntityKind::Event, |record| {
                    if let Record::Event(event) = record {
                        if event.organization.as_deref() == Some(uuid) {
                            event.organization = None;
                        }
                        event.organizations.retain(|o| o != uuid);
                    }
                });
                self.for_each_record(EntityKind::Product, |record| {
                    if let Record::Product(product) = record {
                        if product.organization.as_deref() == Some(uuid) {
                            product.organization = None;
                        }
                    }
                });
                self.for_each_record(EntityKind::Exchange, |record| {
                    if let Record::Exchange(exchange) = record {
                        if exchange.organization.as_deref() == Some(uuid) {
                            exchange.organization = None;
                        }
                    }
                });
            }
            Record::Calendar(calendar) => {
                let events: Vec<String> = self
                    .records
                    .get(&EntityKind::Event)
                    .into_iter()
                    .flat_map(|events| events.values())
                    .filter_map(|record| match record {
                        Record::Event(event) if event.calendar == calendar.uuid => {
                            Some(event.uuid.clone())
                        }
                        _ => None,
                    })
                    .collect();
                for event in events {
                    self.delete(EntityKind::Event, &event);
                }
            }
            Record::Product(product) => {
                self.for_each_record(EntityKind::Exchange, |record| {
                    if let Record::Exchange(exchange) = record {
                        exchange.products.retain(|p| *p != product.uuid);
                    }
                });
            }
            Record::Event(_) | Record::Exchange(_) | Record::Location(_) => {}
        }
    }

    fn for_each_record(&mut self, kind: EntityKind, mut apply: impl FnMut(&mut Record)) {
        if let Some(records) = self.records.get_mut(&kind) {
            records.values_mut().for_each(&mut apply);
        }
    }

    fn delete_owned_contacts(&mut self, owner: &OwnerRef) {
        let owned: Vec<String> = self
            .contacts
            .values()
            .filter(|contact| contact.owner == *owner)
            .map(|contact| contact.uuid.clone())
            .collect();
        for uuid in owned {
            self.delete_contact(&uuid);
        }
    }

    pub fn marker_exists(&self, kind: EntityKind, key: &str) -> bool {
        self.markers
            .get(&kind)
            .map(|markers| markers.contains(key))
            .unwrap_or(false)
    }

    pub fn mark(&mut self, kind: EntityKind, key: &str) -> Result<(), StoreError> {
        if !self.exists(kind, key) {
            return Err(StoreError::NotFound {
                kind,
                key: key.to_string(),
            });
        }
        if !self.markers.entry(kind).or_default().insert(key.to_string()) {
            return Err(StoreError::MarkerExists {
                kind,
                key: key.to_string(),
            });
        }
        Ok(())
    }

    pub fn marked_keys(&self, kind: EntityKind) -> Vec<String> {
        self.markers
            .get(&kind)
            .map(|markers| markers.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn find_contact(&self, uuid: &str) -> Option<&Contact> {
        self.contacts.get(uuid)
    }

    pub fn contacts_of(&self, owner: &OwnerRef) -> Vec<Contact> {
        self.contacts
            .values()
            .filter(|contact| contact.owner == *owner)
            .cloned()
            .collect()
    }

    pub fn save_contact(&mut self, contact: &Contact) -> Result<(), StoreError> {
        let from = format!("contact {}", contact.uuid);
        self.require(contact.owner.kind.into(), &contact.owner.key, &from)?;
        self.contacts.insert(contact.uuid.clone(), contact.clone());
        Ok(())
    }

    pub fn delete_contact(&mut self, uuid: &str) -> bool {
        if self.contacts.remove(uuid).is_none() {
            return false;
        }
        for kind in [EntityKind::Person, EntityKind::Organization] {
            self.for_each_record(kind, |record| match record {
                Record::Person(person) => {
                    if person.pref_email.as_deref() == Some(uuid) {
                        person.pref_email = None;
                    }
                }
                Record::Organization(organization) => {
                    if organization.pref_email.as_deref() == Some(uuid) {
                        organization.pref_email = None;
                    }
                    if organization.pref_phone.as_deref() == Some(uuid) {
                        organization.pref_phone = None;
                    }
                }
                _ => {}
            });
        }
        true
    }

    pub fn engagements_of(&self, organization: &str) -> Vec<Engagement> {
        self.engagements
            .iter()
            .filter(|engagement| engagement.organization == organization)
            .cloned()
            .collect()
    }

    pub fn delete_engagements(&mut self, organization: &str) -> u64 {
        let before = self.engagements.len();
        self.engagements.retain(|e| e.organization != organization);
        (before - self.engagements.len()) as u64
    }

    pub fn insert_engagement(&mut self, engagement: &Engagement) -> Result<(), StoreError> {
        let from = format!("engagement of {}", engagement.person);
        self.require(EntityKind::Organization, &engagement.organization, &from)?;
        self.require(EntityKind::Person, &engagement.person, &from)?;
        if let Some(role) = &engagement.role {
            if !self.role_uuid_exists(role) {
                return Err(StoreError::integrity(format!(
                    "{from} references missing role {role}"
                )));
            }
        }
        self.engagements.push(engagement.clone());
        Ok(())
    }

    pub fn legal_statuses(&self) -> Vec<LegalStatus> {
        self.legal_statuses.values().cloned().collect()
    }

    pub fn save_legal_status(&mut self, status: &LegalStatus) {
        self.legal_statuses
            .insert(status.slug.clone(), status.clone());
    }

    pub fn transverse_themes(&self) -> Vec<TransverseTheme> {
        self.themes.values().cloned().collect()
    }

    pub fn create_transverse_theme(&mut self, name: &str) -> Result<TransverseTheme, StoreError> {
        if self.themes.values().any(|theme| theme.name == name) {
            return Err(StoreError::integrity(format!(
                "transverse theme {name} already exists"
            )));
        }
        self.next_theme_id += 1;
        let theme = TransverseTheme {
            id: self.next_theme_id,
            name: name.to_string(),
        };
        self.themes.insert(theme.id, theme.clone());
        Ok(theme)
    }
}
