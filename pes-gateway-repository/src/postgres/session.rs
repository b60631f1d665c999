use std::sync::Arc;

use pes_gateway_shared::types::{
    ChangeEvent, Contact, Engagement, EntityKind, LegalStatus, Notify, OwnerKind, OwnerRef,
    Record, TransverseTheme,
};
use sqlx::{Postgres, Transaction};
use tracing::debug;

use crate::errors::StoreError;
use crate::interfaces::{ObserverRegistry, StoreSession};
use crate::postgres::records;

#[derive(sqlx::FromRow)]
struct ContactRow {
    uuid: String,
    content: String,
    contact_medium: Option<i64>,
    organization: Option<String>,
    person: Option<String>,
}

impl TryFrom<ContactRow> for Contact {
    type Error = StoreError;

    fn try_from(row: ContactRow) -> Result<Self, Self::Error> {
        let owner = match (row.organization, row.person) {
            (Some(organization), None) => OwnerRef::organization(organization),
            (None, Some(person)) => OwnerRef::person(person),
            _ => {
                return Err(StoreError::InvalidValue(format!(
                    "contact {} has no single owner",
                    row.uuid
                )))
            }
        };
        Ok(Contact {
            uuid: row.uuid,
            content: row.content,
            contact_medium: row.contact_medium,
            owner,
        })
    }
}

#[derive(sqlx::FromRow)]
struct EngagementRow {
    organization: String,
    person: String,
    role: Option<String>,
    role_detail: Option<String>,
}

/// A store session wrapping one PostgreSQL transaction.
///
/// Savepoints are named after their depth (`sp_1`, `sp_2`, ...). Change
/// events are buffered until commit.
pub struct PostgresSession {
    tx: Transaction<'static, Postgres>,
    observers: Arc<ObserverRegistry>,
    savepoints: Vec<usize>,
    pending: Vec<ChangeEvent>,
}

impl PostgresSession {
    pub(crate) fn new(
        tx: Transaction<'static, Postgres>,
        observers: Arc<ObserverRegistry>,
    ) -> Self {
        Self {
            tx,
            observers,
            savepoints: Vec::new(),
            pending: Vec::new(),
        }
    }

    fn record_event(&mut self, notify: Notify, event: ChangeEvent) {
        if notify.is_broadcast() {
            self.pending.push(event);
        }
    }
}

fn owner_column(owner: &OwnerRef) -> &'static str {
    match owner.kind {
        OwnerKind::Organization => "organization",
        OwnerKind::Person => "person",
    }
}

#[async_trait::async_trait]
impl StoreSession for PostgresSession {
    async fn savepoint(&mut self) -> Result<(), StoreError> {
        let name = format!("sp_{}", self.savepoints.len() + 1);
        sqlx::query(&format!("SAVEPOINT {name}"))
            .execute(&mut *self.tx)
            .await?;
        self.savepoints.push(self.pending.len());
        Ok(())
    }

    async fn release_savepoint(&mut self) -> Result<(), StoreError> {
        if self.savepoints.is_empty() {
            return Err(StoreError::NoSavepoint);
        }
        let name = format!("sp_{}", self.savepoints.len());
        sqlx::query(&format!("RELEASE SAVEPOINT {name}"))
            .execute(&mut *self.tx)
            .await?;
        self.savepoints.pop();
        Ok(())
    }

    async fn rollback_to_savepoint(&mut self) -> Result<(), StoreError> {
        let Some(pending) = self.savepoints.last().copied() else {
            return Err(StoreError::NoSavepoint);
        };
        let name = format!("sp_{}", self.savepoints.len());
        sqlx::query(&format!("ROLLBACK TO SAVEPOINT {name}"))
            .execute(&mut *self.tx)
            .await?;
        sqlx::query(&format!("RELEASE SAVEPOINT {name}"))
            .execute(&mut *self.tx)
            .await?;
        self.savepoints.pop();
        self.pending.truncate(pending);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let PostgresSession {
            tx,
            observers,
            pending,
            ..
        } = *self;
        tx.commit().await?;
        debug!(events = pending.len(), "Session committed");
        observers.dispatch(&pending).await;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }

    async fn find(&mut self, kind: EntityKind, key: &str) -> Result<Option<Record>, StoreError> {
        records::find(&mut self.tx, kind, key).await
    }

    async fn keys(&mut self, kind: EntityKind) -> Result<Vec<String>, StoreError> {
        records::keys(&mut self.tx, kind).await
    }

    async fn save(&mut self, record: &Record, notify: Notify) -> Result<(), StoreError> {
        records::save(&mut self.tx, record).await?;
        self.record_event(
            notify,
            ChangeEvent::Saved {
                kind: record.kind(),
                key: record.key().to_string(),
            },
        );
        Ok(())
    }

    async fn delete(
        &mut self,
        kind: EntityKind,
        key: &str,
        notify: Notify,
    ) -> Result<bool, StoreError> {
        let deleted = records::delete(&mut self.tx, kind, key).await?;
        if deleted {
            self.record_event(
                notify,
                ChangeEvent::Deleted {
                    kind,
                    key: key.to_string(),
                },
            );
        }
        Ok(deleted)
    }

    async fn marker_exists(&mut self, kind: EntityKind, key: &str) -> Result<bool, StoreError> {
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE local_key = $1)",
            kind.marker_table()
        );
        let found = sqlx::query_scalar::<_, bool>(&sql)
            .bind(key)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(found)
    }

    async fn mark(&mut self, kind: EntityKind, key: &str) -> Result<(), StoreError> {
        if !records::exists(&mut self.tx, kind, key).await? {
            return Err(StoreError::NotFound {
                kind,
                key: key.to_string(),
            });
        }
        let sql = format!(
            "INSERT INTO {} (local_key) VALUES ($1) ON CONFLICT (local_key) DO NOTHING",
            kind.marker_table()
        );
        let result = sqlx::query(&sql).bind(key).execute(&mut *self.tx).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::MarkerExists {
                kind,
                key: key.to_string(),
            });
        }
        Ok(())
    }

    async fn marked_keys(&mut self, kind: EntityKind) -> Result<Vec<String>, StoreError> {
        let sql = format!(
            "SELECT local_key FROM {} ORDER BY local_key",
            kind.marker_table()
        );
        let keys = sqlx::query_scalar::<_, String>(&sql)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(keys)
    }

    async fn unmark_and_delete(
        &mut self,
        kind: EntityKind,
        key: &str,
        notify: Notify,
    ) -> Result<bool, StoreError> {
        if let Some((dependent_kind, dependent)) =
            records::native_dependents(&mut self.tx, kind, key).await?
        {
            return Err(StoreError::NativeDependents {
                kind,
                key: key.to_string(),
                dependent_kind,
                dependent,
            });
        }
        // The marker row cascades with the record.
        self.delete(kind, key, notify).await
    }

    async fn find_contact(&mut self, uuid: &str) -> Result<Option<Contact>, StoreError> {
        let row = sqlx::query_as::<_, ContactRow>(
            "SELECT uuid, content, contact_medium, organization, person FROM contacts WHERE uuid = $1",
        )
        .bind(uuid)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.map(Contact::try_from).transpose()
    }

    async fn contacts_of(&mut self, owner: &OwnerRef) -> Result<Vec<Contact>, StoreError> {
        let sql = format!(
            "SELECT uuid, content, contact_medium, organization, person FROM contacts WHERE {} = $1 ORDER BY uuid",
            owner_column(owner)
        );
        sqlx::query_as::<_, ContactRow>(&sql)
            .bind(&owner.key)
            .fetch_all(&mut *self.tx)
            .await?
            .into_iter()
            .map(Contact::try_from)
            .collect()
    }

    async fn save_contact(&mut self, contact: &Contact) -> Result<(), StoreError> {
        let (organization, person) = match contact.owner.kind {
            OwnerKind::Organization => (Some(contact.owner.key.as_str()), None),
            OwnerKind::Person => (None, Some(contact.owner.key.as_str())),
        };
        sqlx::query(
            r#"
            INSERT INTO contacts (uuid, content, contact_medium, organization, person)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (uuid)
            DO UPDATE SET
                content = EXCLUDED.content,
                contact_medium = EXCLUDED.contact_medium,
                organization = EXCLUDED.organization,
                person = EXCLUDED.person
            "#,
        )
        .bind(&contact.uuid)
        .bind(&contact.content)
        .bind(contact.contact_medium)
        .bind(organization)
        .bind(person)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_contact(&mut self, uuid: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM contacts WHERE uuid = $1")
            .bind(uuid)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn engagements_of(
        &mut self,
        organization: &str,
    ) -> Result<Vec<Engagement>, StoreError> {
        let rows = sqlx::query_as::<_, EngagementRow>(
            "SELECT organization, person, role, role_detail FROM engagements WHERE organization = $1 ORDER BY id",
        )
        .bind(organization)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows
            .into_iter()
            .map(|row| Engagement {
                organization: row.organization,
                person: row.person,
                role: row.role,
                role_detail: row.role_detail,
            })
            .collect())
    }

    async fn delete_engagements(&mut self, organization: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM engagements WHERE organization = $1")
            .bind(organization)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert_engagement(&mut self, engagement: &Engagement) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO engagements (organization, person, role, role_detail) VALUES ($1, $2, $3, $4)",
        )
        .bind(&engagement.organization)
        .bind(&engagement.person)
        .bind(&engagement.role)
        .bind(&engagement.role_detail)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn legal_statuses(&mut self) -> Result<Vec<LegalStatus>, StoreError> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT slug, label FROM legal_statuses ORDER BY slug",
        )
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(slug, label)| LegalStatus { slug, label })
            .collect())
    }

    async fn save_legal_status(&mut self, status: &LegalStatus) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO legal_statuses (slug, label)
            VALUES ($1, $2)
            ON CONFLICT (slug) DO UPDATE SET label = EXCLUDED.label
            "#,
        )
        .bind(&status.slug)
        .bind(&status.label)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn transverse_themes(&mut self) -> Result<Vec<TransverseTheme>, StoreError> {
        let rows = sqlx::query_as::<_, (i64, String)>(
            "SELECT id, name FROM transverse_themes ORDER BY id",
        )
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(id, name)| TransverseTheme { id, name })
            .collect())
    }

    async fn create_transverse_theme(
        &mut self,
        name: &str,
    ) -> Result<TransverseTheme, StoreError> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO transverse_themes (name) VALUES ($1) RETURNING id",
        )
        .bind(name)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(TransverseTheme {
            id,
            name: name.to_string(),
        })
    }
}
