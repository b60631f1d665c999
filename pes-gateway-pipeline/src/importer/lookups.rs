//! Lookup tables imported ahead of organizations, and the translation
//! tables derived from them.
use pes_gateway_repository::{find_model, StoreSession};
use pes_gateway_shared::types::{LegalStatus, Role, TransverseTheme};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::errors::{ImportError, RecordError};
use crate::importer::engine::finish_savepoint;
use crate::importer::{RecordOutcome, RunReport, Subject};
use crate::serializer::{parse_document, RoleDocument};
use crate::translations::Translations;

#[derive(Debug, Deserialize)]
struct RemoteLegalStatus {
    slug: String,
    label: String,
}

#[derive(Debug, Deserialize)]
struct RemoteTransverseTheme {
    id: i64,
    name: String,
}

/// Finds each remote legal status locally by slug or label, creating the
/// missing ones, and records the remote to local slug translation.
pub async fn import_legal_statuses(
    session: &mut dyn StoreSession,
    documents: &[Value],
    translations: &mut Translations,
    report: &mut RunReport,
) -> Result<(), ImportError> {
    let mut local = session.legal_statuses().await?;

    for document in documents {
        let remote: RemoteLegalStatus = match parse_document(document) {
            Ok(remote) => remote,
            Err(error) => {
                report.push(Subject::LegalStatus, "", Err(error.into()));
                continue;
            }
        };

        session.savepoint().await?;
        let found = local
            .iter()
            .find(|status| status.slug == remote.slug || status.label == remote.label)
            .map(|status| status.slug.clone());
        let result = match found {
            Some(existing) => Ok((existing, RecordOutcome::Found)),
            None => {
                let created = LegalStatus {
                    slug: remote.slug.clone(),
                    label: remote.label.clone(),
                };
                session
                    .save_legal_status(&created)
                    .await
                    .map(|_| {
                        local.push(created);
                        (remote.slug.clone(), RecordOutcome::Created)
                    })
                    .map_err(RecordError::from)
            }
        };
        finish_savepoint(session, &result).await?;

        let result = result.map(|(local_slug, outcome)| {
            debug!(remote = %remote.slug, local = %local_slug, "Legal status translated");
            translations.insert_legal_status(remote.slug.clone(), local_slug);
            outcome
        });
        report.push(Subject::LegalStatus, remote.slug, result);
    }

    info!(count = documents.len(), "Legal statuses imported");
    Ok(())
}

/// Finds each remote transverse theme locally by name, creating the missing
/// ones, and records the remote to local id translation.
pub async fn import_transverse_themes(
    session: &mut dyn StoreSession,
    documents: &[Value],
    translations: &mut Translations,
    report: &mut RunReport,
) -> Result<(), ImportError> {
    let mut local: Vec<TransverseTheme> = session.transverse_themes().await?;

    for document in documents {
        let remote: RemoteTransverseTheme = match parse_document(document) {
            Ok(remote) => remote,
            Err(error) => {
                report.push(Subject::TransverseTheme, "", Err(error.into()));
                continue;
            }
        };

        session.savepoint().await?;
        let found = local
            .iter()
            .find(|theme| theme.name == remote.name)
            .map(|theme| theme.id);
        let result = match found {
            Some(existing) => Ok((existing, RecordOutcome::Found)),
            None => session
                .create_transverse_theme(&remote.name)
                .await
                .map(|created| {
                    let id = created.id;
                    local.push(created);
                    (id, RecordOutcome::Created)
                })
                .map_err(RecordError::from),
        };
        finish_savepoint(session, &result).await?;

        let result = result.map(|(local_id, outcome)| {
            translations.insert_transverse_theme(remote.id, local_id);
            outcome
        });
        report.push(Subject::TransverseTheme, remote.id.to_string(), result);
    }

    info!(count = documents.len(), "Transverse themes imported");
    Ok(())
}

/// Maps every remote role, by uuid and by slug, to the uuid of the local role
/// sharing its slug. Roles with no local counterpart are left out.
pub async fn role_translations(
    session: &mut dyn StoreSession,
    documents: &[Value],
    translations: &mut Translations,
) -> Result<(), ImportError> {
    for document in documents {
        let Ok(remote) = parse_document::<RoleDocument>(document) else {
            continue;
        };
        if let Some(local) = find_model::<Role>(session, &remote.slug).await? {
            translations.insert_role(remote.uuid, local.uuid.clone());
            translations.insert_role(remote.slug, local.uuid);
        }
    }
    debug!(count = translations.role_count(), "Role translations built");
    Ok(())
}
