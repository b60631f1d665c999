//! The reconciliation engine: classifies every remote record of one kind,
//! applies it inside its own savepoint, then sweeps the mirrors that
//! disappeared remotely.
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use pes_gateway_repository::StoreSession;
use pes_gateway_shared::types::{EntityKind, Notify, Record};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::errors::{ImportError, RecordError};
use crate::importer::{ImportHandler, RecordOutcome, RunReport, Subject};
use crate::serializer::document_key;
use crate::translations::Translations;

/// How an incoming record is matched against an existing local one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClassificationPolicy {
    /// Only marked records are updated; a natively-owned record with the same
    /// identifier is left alone.
    #[default]
    Marker,
    /// Any local record with the same identifier is updated.
    Identifier,
}

impl FromStr for ClassificationPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "marker" => Ok(ClassificationPolicy::Marker),
            "identifier" => Ok(ClassificationPolicy::Identifier),
            other => Err(format!(
                "unknown classification policy `{other}`, expected `marker` or `identifier`"
            )),
        }
    }
}

impl fmt::Display for ClassificationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassificationPolicy::Marker => f.write_str("marker"),
            ClassificationPolicy::Identifier => f.write_str("identifier"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Classification {
    Create,
    Update,
    Skip,
    Found,
}

fn classify(
    policy: ClassificationPolicy,
    kind: EntityKind,
    exists: bool,
    marked: bool,
) -> Classification {
    if !exists {
        return Classification::Create;
    }
    if kind == EntityKind::Role {
        return Classification::Found;
    }
    match policy {
        ClassificationPolicy::Marker if !marked => Classification::Skip,
        _ => Classification::Update,
    }
}

/// Applies fetched remote records to a store session.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reconciler {
    policy: ClassificationPolicy,
}

impl Reconciler {
    pub fn new(policy: ClassificationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ClassificationPolicy {
        self.policy
    }

    /// Reconciles every document of `handler`'s kind, then deletes the marked
    /// records whose identifier was not among them.
    ///
    /// Each record and each deletion runs in its own savepoint; a failure is
    /// rolled back and reported without stopping the run. Only failures to
    /// manage the savepoints themselves abort with an [`ImportError`].
    pub async fn reconcile(
        &self,
        session: &mut dyn StoreSession,
        handler: &dyn ImportHandler,
        documents: &[Value],
        translations: &Translations,
        report: &mut RunReport,
    ) -> Result<(), ImportError> {
        let kind = handler.kind();
        let subject = Subject::Entity(kind);
        let mut seen = HashSet::with_capacity(documents.len());

        for document in documents {
            let Some(key) = document_key(document, kind.key_field()) else {
                warn!(kind = %kind, "Remote document has no identifier, skipping it");
                report.push(
                    subject,
                    "",
                    Err(RecordError::InvalidDocument(format!(
                        "missing `{}`",
                        kind.key_field()
                    ))),
                );
                continue;
            };
            seen.insert(key.to_string());

            session.savepoint().await?;
            let result = self.apply(session, handler, key, document, translations).await;
            finish_savepoint(session, &result).await?;
            log_result(kind, key, &result);
            report.push(subject, key, result);
        }

        self.sweep(session, kind, &seen, report).await
    }

    async fn apply(
        &self,
        session: &mut dyn StoreSession,
        handler: &dyn ImportHandler,
        key: &str,
        document: &Value,
        translations: &Translations,
    ) -> Result<RecordOutcome, RecordError> {
        let kind = handler.kind();
        let existing = session.find(kind, key).await?;
        let marked = session.marker_exists(kind, key).await?;

        match classify(self.policy, kind, existing.is_some(), marked) {
            Classification::Found => Ok(RecordOutcome::Found),
            Classification::Skip => Ok(RecordOutcome::Skipped),
            Classification::Create => {
                let record = handler.map(session, document, translations).await?;
                session.save(&record, Notify::Suppressed).await?;
                session.mark(kind, key).await?;
                apply_nested(session, handler, record, document, translations).await?;
                Ok(RecordOutcome::Created)
            }
            Classification::Update => {
                let record = handler.map(session, document, translations).await?;
                let mut changed = existing.as_ref() != Some(&record);
                if changed {
                    session.save(&record, Notify::Suppressed).await?;
                }
                changed |= apply_nested(session, handler, record, document, translations).await?;
                Ok(if changed {
                    RecordOutcome::Updated
                } else {
                    RecordOutcome::Unchanged
                })
            }
        }
    }

    async fn sweep(
        &self,
        session: &mut dyn StoreSession,
        kind: EntityKind,
        seen: &HashSet<String>,
        report: &mut RunReport,
    ) -> Result<(), ImportError> {
        let stale: Vec<String> = session
            .marked_keys(kind)
            .await?
            .into_iter()
            .filter(|key| !seen.contains(key))
            .collect();

        for key in stale {
            session.savepoint().await?;
            let result = session
                .unmark_and_delete(kind, &key, Notify::Suppressed)
                .await
                .map(|_| RecordOutcome::Deleted)
                .map_err(RecordError::from);
            finish_savepoint(session, &result).await?;
            log_result(kind, &key, &result);
            report.push(Subject::Entity(kind), key, result);
        }
        Ok(())
    }
}

/// Syncs nested rows, then maps the document again and saves the record if
/// the nested rows changed what it resolves to. Returns whether anything
/// changed.
async fn apply_nested(
    session: &mut dyn StoreSession,
    handler: &dyn ImportHandler,
    record: Record,
    document: &Value,
    translations: &Translations,
) -> Result<bool, RecordError> {
    if !handler
        .sync_nested(session, &record, document, translations)
        .await?
    {
        return Ok(false);
    }
    let derived = handler.map(session, document, translations).await?;
    if derived != record {
        session.save(&derived, Notify::Suppressed).await?;
    }
    Ok(true)
}

pub(crate) async fn finish_savepoint<T, E>(
    session: &mut dyn StoreSession,
    result: &Result<T, E>,
) -> Result<(), ImportError> {
    match result {
        Ok(_) => session.release_savepoint().await?,
        Err(_) => session.rollback_to_savepoint().await?,
    }
    Ok(())
}

fn log_result(kind: EntityKind, key: &str, result: &Result<RecordOutcome, RecordError>) {
    match result {
        Ok(RecordOutcome::Unchanged | RecordOutcome::Found) => {
            debug!(kind = %kind, key, "Record already up to date")
        }
        Ok(outcome) => info!(kind = %kind, key, outcome = %outcome, "Record reconciled"),
        Err(error) => warn!(kind = %kind, key, error = %error, "Record reconciliation failed"),
    }
}
