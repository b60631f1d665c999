//! This module defines the `LocalStore` and `StoreSession` traits, which
//! provide the interface to the local database the gateway mirrors into and
//! exports from. Records are addressed by kind and external identifier; no
//! internal row identifier ever crosses this boundary.
use std::sync::Arc;

use pes_gateway_shared::types::{
    Contact, Engagement, EntityKind, LegalStatus, Model, Notify, OwnerRef, Record,
    TransverseTheme,
};

use crate::errors::StoreError;
use crate::interfaces::ObserverRegistry;

/// Entry point to the local store.
///
/// Every read and write happens inside a [`StoreSession`] obtained from
/// [`LocalStore::begin`]. Change events produced by broadcast writes are
/// delivered to the store's [`ObserverRegistry`] once the session commits.
#[async_trait::async_trait]
pub trait LocalStore: Send + Sync {
    /// Opens a new session wrapped in a database transaction.
    async fn begin(&self) -> Result<Box<dyn StoreSession>, StoreError>;

    /// The registry of observers notified about committed changes.
    fn observers(&self) -> &Arc<ObserverRegistry>;
}

/// A transactional unit of work against the local store.
///
/// Sessions support nested savepoints: every `savepoint` must be matched by
/// either `release_savepoint` or `rollback_to_savepoint`. Rolling back a
/// savepoint also discards the change events buffered since it was opened.
/// Dropping a session without committing rolls it back.
#[async_trait::async_trait]
pub trait StoreSession: Send {
    /// Opens a nested savepoint.
    async fn savepoint(&mut self) -> Result<(), StoreError>;

    /// Keeps the work done since the innermost savepoint.
    async fn release_savepoint(&mut self) -> Result<(), StoreError>;

    /// Discards the work done since the innermost savepoint.
    async fn rollback_to_savepoint(&mut self) -> Result<(), StoreError>;

    /// Commits the session, then dispatches buffered change events.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    /// Discards the session and its buffered change events.
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;

    /// Loads the record of `kind` identified by `key`.
    async fn find(&mut self, kind: EntityKind, key: &str) -> Result<Option<Record>, StoreError>;

    /// Lists the external identifiers of every record of `kind`.
    async fn keys(&mut self, kind: EntityKind) -> Result<Vec<String>, StoreError>;

    /// Inserts or replaces a record, keyed by its external identifier.
    async fn save(&mut self, record: &Record, notify: Notify) -> Result<(), StoreError>;

    /// Deletes a record together with the rows it owns.
    ///
    /// Returns `false` if no such record existed.
    async fn delete(
        &mut self,
        kind: EntityKind,
        key: &str,
        notify: Notify,
    ) -> Result<bool, StoreError>;

    /// Whether an ownership marker exists for the record.
    async fn marker_exists(&mut self, kind: EntityKind, key: &str) -> Result<bool, StoreError>;

    /// Marks an existing record as a mirror of remote data.
    ///
    /// Fails with [`StoreError::MarkerExists`] if the record is already marked
    /// and with [`StoreError::NotFound`] if the record does not exist.
    async fn mark(&mut self, kind: EntityKind, key: &str) -> Result<(), StoreError>;

    /// Lists the external identifiers of every marked record of `kind`.
    async fn marked_keys(&mut self, kind: EntityKind) -> Result<Vec<String>, StoreError>;

    /// Removes a marker and the record it marks in one step.
    async fn unmark_and_delete(
        &mut self,
        kind: EntityKind,
        key: &str,
        notify: Notify,
    ) -> Result<bool, StoreError>;

    async fn find_contact(&mut self, uuid: &str) -> Result<Option<Contact>, StoreError>;

    async fn contacts_of(&mut self, owner: &OwnerRef) -> Result<Vec<Contact>, StoreError>;

    async fn save_contact(&mut self, contact: &Contact) -> Result<(), StoreError>;

    async fn delete_contact(&mut self, uuid: &str) -> Result<bool, StoreError>;

    async fn engagements_of(&mut self, organization: &str)
        -> Result<Vec<Engagement>, StoreError>;

    async fn delete_engagements(&mut self, organization: &str) -> Result<u64, StoreError>;

    async fn insert_engagement(&mut self, engagement: &Engagement) -> Result<(), StoreError>;

    async fn legal_statuses(&mut self) -> Result<Vec<LegalStatus>, StoreError>;

    async fn save_legal_status(&mut self, status: &LegalStatus) -> Result<(), StoreError>;

    async fn transverse_themes(&mut self) -> Result<Vec<TransverseTheme>, StoreError>;

    async fn create_transverse_theme(&mut self, name: &str)
        -> Result<TransverseTheme, StoreError>;
}

/// Loads a record and unwraps it into its concrete model type.
pub async fn find_model<M: Model>(
    session: &mut dyn StoreSession,
    key: &str,
) -> Result<Option<M>, StoreError> {
    match session.find(M::KIND, key).await? {
        Some(record) => M::try_from(record)
            .map(Some)
            .map_err(|other| StoreError::UnexpectedRecord {
                expected: M::KIND,
                found: other.kind(),
            }),
        None => Ok(None),
    }
}
