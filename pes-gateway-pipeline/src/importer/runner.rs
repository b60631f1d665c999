use std::collections::HashMap;
use std::sync::Arc;

use pes_gateway_repository::{LocalStore, StoreSession};
use pes_gateway_shared::types::EntityKind;
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::client::RemoteApi;
use crate::errors::{ClientError, ImportError};
use crate::importer::handlers::{
    CalendarHandler, EventHandler, ExchangeHandler, LocationHandler, OrganizationHandler,
    PersonHandler, ProductHandler, RoleHandler,
};
use crate::importer::lookups::{import_legal_statuses, import_transverse_themes, role_translations};
use crate::importer::{ClassificationPolicy, ImportHandler, Reconciler, RunReport, Subject};
use crate::translations::Translations;

/// `ImportRunner` drives a full import: it fetches each collection from the
/// PES and hands it to the reconciler, in dependency order, inside a single
/// store session.
pub struct ImportRunner {
    api: Arc<dyn RemoteApi>,
    store: Arc<dyn LocalStore>,
    reconciler: Reconciler,
    handler_registry: HashMap<EntityKind, Arc<dyn ImportHandler>>,
}

impl ImportRunner {
    /// Creates a runner with no handlers registered.
    pub fn new(
        api: Arc<dyn RemoteApi>,
        store: Arc<dyn LocalStore>,
        policy: ClassificationPolicy,
    ) -> Self {
        Self {
            api,
            store,
            reconciler: Reconciler::new(policy),
            handler_registry: HashMap::new(),
        }
    }

    /// Registers the handler for `handler.kind()`, replacing any previous one.
    pub fn register_handler(&mut self, handler: Arc<dyn ImportHandler>) {
        self.handler_registry.insert(handler.kind(), handler);
    }

    /// Registers the built-in handler of every kind.
    pub fn with_default_handlers(mut self) -> Self {
        self.register_handler(Arc::new(RoleHandler));
        self.register_handler(Arc::new(PersonHandler));
        self.register_handler(Arc::new(OrganizationHandler));
        self.register_handler(Arc::new(CalendarHandler));
        self.register_handler(Arc::new(EventHandler));
        self.register_handler(Arc::new(ProductHandler));
        self.register_handler(Arc::new(ExchangeHandler));
        self.register_handler(Arc::new(LocationHandler));
        self
    }

    /// Imports every kind.
    pub async fn run(&self) -> Result<RunReport, ImportError> {
        self.run_kinds(&EntityKind::ALL).await
    }

    /// Imports the given kinds, always walking them in dependency order.
    ///
    /// A collection that cannot be fetched is reported as aborted and its
    /// kind skipped, sweep included. Organizations are also skipped when a
    /// lookup collection they are translated with cannot be fetched. Any
    /// [`ImportError`] rolls the whole run back.
    #[instrument(skip(self), fields(policy = %self.reconciler.policy()))]
    pub async fn run_kinds(&self, kinds: &[EntityKind]) -> Result<RunReport, ImportError> {
        let mut session = self.store.begin().await?;
        let mut report = RunReport::new();

        if let Err(err) = self.run_in(session.as_mut(), kinds, &mut report).await {
            error!(error = %err, "Import run aborted, rolling back");
            if let Err(rollback) = session.rollback().await {
                error!(error = %rollback, "Rollback failed");
            }
            return Err(err);
        }
        session.commit().await?;

        info!(
            changes = report.changes(),
            errors = report.errors().count(),
            aborted = report.aborted().len(),
            "Import run committed"
        );
        Ok(report)
    }

    async fn run_in(
        &self,
        session: &mut dyn StoreSession,
        kinds: &[EntityKind],
        report: &mut RunReport,
    ) -> Result<(), ImportError> {
        let mut translations = Translations::new();
        // First lookup collection that could not be fetched, if any.
        let mut missing: Option<Subject> = None;

        if kinds.contains(&EntityKind::Organization) {
            match self.fetch(Subject::LegalStatus, report).await {
                Some(documents) => {
                    import_legal_statuses(session, &documents, &mut translations, report).await?
                }
                None => {
                    missing.get_or_insert(Subject::LegalStatus);
                }
            }
            match self.fetch(Subject::TransverseTheme, report).await {
                Some(documents) => {
                    import_transverse_themes(session, &documents, &mut translations, report)
                        .await?
                }
                None => {
                    missing.get_or_insert(Subject::TransverseTheme);
                }
            }
        }

        for kind in EntityKind::ALL.into_iter().filter(|kind| kinds.contains(kind)) {
            let handler = self
                .handler_registry
                .get(&kind)
                .ok_or(ImportError::MissingHandler(kind))?;

            if kind == EntityKind::Organization {
                let roles = Subject::Entity(EntityKind::Role);
                if !kinds.contains(&EntityKind::Role) {
                    match self.fetch(roles, report).await {
                        Some(documents) => {
                            role_translations(session, &documents, &mut translations).await?
                        }
                        None => {
                            missing.get_or_insert(roles);
                        }
                    }
                } else if report.is_aborted(roles) {
                    missing.get_or_insert(roles);
                }

                if let Some(prerequisite) = missing {
                    error!(
                        prerequisite = %prerequisite,
                        "Lookup collection unavailable, skipping organizations"
                    );
                    report.abort(
                        Subject::Entity(kind),
                        ClientError::PrerequisiteUnavailable(prerequisite.resource()),
                    );
                    continue;
                }
            }

            let Some(documents) = self.fetch(Subject::Entity(kind), report).await else {
                continue;
            };
            info!(kind = %kind, count = documents.len(), "Reconciling collection");
            self.reconciler
                .reconcile(session, handler.as_ref(), &documents, &translations, report)
                .await?;

            if kind == EntityKind::Role {
                role_translations(session, &documents, &mut translations).await?;
            }
        }
        Ok(())
    }

    async fn fetch(&self, subject: Subject, report: &mut RunReport) -> Option<Vec<Value>> {
        match self.api.fetch(subject.resource()).await {
            Ok(documents) => Some(documents),
            Err(err) => {
                error!(subject = %subject, error = %err, "Failed to fetch collection, skipping it");
                report.abort(subject, err);
                None
            }
        }
    }
}
