//! Export path: pushes natively-owned local records to the PES.
//!
//! The [`Exporter`] reacts to committed store changes as a
//! [`ChangeObserver`] and can also push every exportable record at once.
mod report;

pub use report::ExportReport;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use pes_gateway_repository::{find_model, ChangeObserver, LocalStore, StoreSession};
use pes_gateway_shared::types::{ChangeEvent, EntityKind, OwnerRef, Record, Role};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use crate::client::RemoteApi;
use crate::errors::ExportError;
use crate::serializer::{
    serialize_calendar, serialize_event, serialize_exchange, serialize_location,
    serialize_organization, serialize_person, serialize_product, CalendarField, Document,
    EventField, ExchangeField, LocationField, OrganizationField, OrganizationView, PersonField,
    PersonView, ProductField,
};
use crate::translations::{ExportTranslations, RemoteCatalog};

/// How long a fetched [`RemoteCatalog`] is reused.
pub const DEFAULT_CATALOG_TTL: Duration = Duration::from_secs(120);

type Visited = HashSet<(EntityKind, String)>;

pub struct Exporter {
    api: Arc<dyn RemoteApi>,
    store: Arc<dyn LocalStore>,
    catalog: Mutex<Option<RemoteCatalog>>,
    catalog_ttl: Duration,
}

impl Exporter {
    pub fn new(api: Arc<dyn RemoteApi>, store: Arc<dyn LocalStore>) -> Self {
        Self {
            api,
            store,
            catalog: Mutex::new(None),
            catalog_ttl: DEFAULT_CATALOG_TTL,
        }
    }

    pub fn with_catalog_ttl(mut self, ttl: Duration) -> Self {
        self.catalog_ttl = ttl;
        self
    }

    /// Pushes a saved record, after the records it references.
    ///
    /// Roles and records carrying an ownership marker are never pushed.
    pub async fn on_saved(&self, kind: EntityKind, key: &str) -> Result<(), ExportError> {
        let mut session = self.store.begin().await?;
        let mut visited = Visited::new();
        let result = self
            .push_record(session.as_mut(), kind, key, &mut visited)
            .await;
        session.rollback().await?;
        result
    }

    /// Removes a deleted record from the PES.
    pub async fn on_deleted(&self, kind: EntityKind, key: &str) -> Result<(), ExportError> {
        if kind == EntityKind::Role {
            return Ok(());
        }
        self.api.remove(kind.resource(), key).await?;
        info!(kind = %kind, key, "Record removed from the PES");
        Ok(())
    }

    /// Pushes every natively-owned record of every exported kind.
    ///
    /// Each record is pushed at most once, dependencies first. A failing
    /// record is reported and the export moves on.
    #[instrument(skip(self))]
    pub async fn export_all(&self) -> Result<ExportReport, ExportError> {
        let mut session = self.store.begin().await?;
        let mut visited = Visited::new();
        let mut report = ExportReport::default();

        for kind in EntityKind::EXPORTED {
            let marked: HashSet<String> = session.marked_keys(kind).await?.into_iter().collect();
            let keys = session.keys(kind).await?;
            for key in keys.into_iter().filter(|key| !marked.contains(key)) {
                match self
                    .push_record(session.as_mut(), kind, &key, &mut visited)
                    .await
                {
                    Ok(()) => report.exported.push((kind, key)),
                    Err(err) => {
                        warn!(kind = %kind, key = %key, error = %err, "Failed to export record");
                        report.failed.push((kind, key, err));
                    }
                }
            }
        }

        session.rollback().await?;
        info!(
            exported = report.exported.len(),
            failed = report.failed.len(),
            "Bulk export finished"
        );
        Ok(report)
    }

    fn push_record<'a>(
        &'a self,
        session: &'a mut dyn StoreSession,
        kind: EntityKind,
        key: &'a str,
        visited: &'a mut Visited,
    ) -> BoxFuture<'a, Result<(), ExportError>> {
        Box::pin(async move {
            if kind == EntityKind::Role || !visited.insert((kind, key.to_string())) {
                return Ok(());
            }
            if session.marker_exists(kind, key).await? {
                debug!(kind = %kind, key, "Record is owned by the PES, not pushing it");
                return Ok(());
            }
            let record = session
                .find(kind, key)
                .await?
                .ok_or_else(|| ExportError::NotFound {
                    kind,
                    key: key.to_string(),
                })?;

            for (dependency_kind, dependency_key) in dependencies(session, &record).await? {
                self.push_record(session, dependency_kind, &dependency_key, visited)
                    .await?;
            }

            let document = self.serialize(session, &record).await?;
            self.api
                .push(kind.resource(), key, &Value::Object(document))
                .await?;
            info!(kind = %kind, key, "Record pushed to the PES");
            Ok(())
        })
    }

    async fn serialize(
        &self,
        session: &mut dyn StoreSession,
        record: &Record,
    ) -> Result<Document, ExportError> {
        let document = match record {
            Record::Organization(organization) => {
                let owner = OwnerRef::organization(&organization.uuid);
                let contacts = session.contacts_of(&owner).await?;
                let engagements = session.engagements_of(&organization.uuid).await?;
                let translations = self.export_translations(session).await?;
                let view = OrganizationView {
                    organization,
                    contacts: &contacts,
                    engagements: &engagements,
                };
                serialize_organization(&view, OrganizationField::ALL, &translations)?
            }
            Record::Person(person) => {
                let owner = OwnerRef::person(&person.uuid);
                let contacts = session.contacts_of(&owner).await?;
                let view = PersonView {
                    person,
                    contacts: &contacts,
                };
                serialize_person(&view, PersonField::ALL)
            }
            Record::Calendar(calendar) => serialize_calendar(calendar, CalendarField::ALL),
            Record::Event(event) => serialize_event(event, EventField::ALL),
            Record::Product(product) => serialize_product(product, ProductField::ALL),
            Record::Exchange(exchange) => serialize_exchange(exchange, ExchangeField::ALL),
            Record::Location(location) => serialize_location(location, LocationField::ALL),
            Record::Role(role) => {
                return Err(ExportError::NotFound {
                    kind: EntityKind::Role,
                    key: role.slug.clone(),
                })
            }
        };
        Ok(document)
    }

    /// Joins the cached remote catalog with the local lookup rows, fetching
    /// the catalog again once it is older than the TTL.
    async fn export_translations(
        &self,
        session: &mut dyn StoreSession,
    ) -> Result<ExportTranslations, ExportError> {
        let catalog = {
            let mut cached = self.catalog.lock().await;
            match cached.as_ref() {
                Some(catalog) if catalog.is_fresh(self.catalog_ttl) => catalog.clone(),
                _ => {
                    debug!("Fetching the remote catalog");
                    let fetched = RemoteCatalog::fetch(self.api.as_ref()).await?;
                    *cached = Some(fetched.clone());
                    fetched
                }
            }
        };

        let mut roles = Vec::new();
        for slug in session.keys(EntityKind::Role).await? {
            if let Some(role) = find_model::<Role>(session, &slug).await? {
                roles.push(role);
            }
        }
        let legal_statuses = session.legal_statuses().await?;
        Ok(catalog.translations_for(&roles, &legal_statuses))
    }
}

/// Records referenced by `record`, pushed before it.
async fn dependencies(
    session: &mut dyn StoreSession,
    record: &Record,
) -> Result<Vec<(EntityKind, String)>, ExportError> {
    let dependencies = match record {
        Record::Organization(organization) => session
            .engagements_of(&organization.uuid)
            .await?
            .into_iter()
            .map(|engagement| (EntityKind::Person, engagement.person))
            .collect(),
        Record::Event(event) => std::iter::once((EntityKind::Calendar, event.calendar.clone()))
            .chain(
                event
                    .organization
                    .iter()
                    .chain(&event.organizations)
                    .map(|key| (EntityKind::Organization, key.clone())),
            )
            .collect(),
        Record::Product(product) => product
            .organization
            .iter()
            .map(|key| (EntityKind::Organization, key.clone()))
            .collect(),
        Record::Exchange(exchange) => exchange
            .person
            .iter()
            .map(|key| (EntityKind::Person, key.clone()))
            .chain(
                exchange
                    .organization
                    .iter()
                    .map(|key| (EntityKind::Organization, key.clone())),
            )
            .chain(
                exchange
                    .products
                    .iter()
                    .map(|key| (EntityKind::Product, key.clone())),
            )
            .collect(),
        Record::Role(_) | Record::Person(_) | Record::Calendar(_) | Record::Location(_) => {
            Vec::new()
        }
    };
    Ok(dependencies)
}

#[async_trait]
impl ChangeObserver for Exporter {
    async fn on_change(&self, event: &ChangeEvent) {
        let result = match event {
            ChangeEvent::Saved { kind, key } => self.on_saved(*kind, key).await,
            ChangeEvent::Deleted { kind, key } => self.on_deleted(*kind, key).await,
        };
        if let Err(err) = result {
            error!(
                kind = %event.kind(),
                key = %event.key(),
                error = %err,
                "Failed to export change"
            );
        }
    }
}
