use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use pes_gateway_shared::types::{
    ChangeEvent, Contact, Engagement, EntityKind, LegalStatus, Notify, OwnerRef, Record,
    TransverseTheme,
};
use tracing::debug;

use crate::errors::StoreError;
use crate::interfaces::{LocalStore, ObserverRegistry, StoreSession};
use crate::memory::state::State;

/// A failure injected into writes touching one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Conflict,
    Integrity,
}

impl Fault {
    fn into_error(self, kind: EntityKind, key: &str) -> StoreError {
        match self {
            Fault::Conflict => StoreError::conflict(format!("injected conflict on {kind} {key}")),
            Fault::Integrity => {
                StoreError::integrity(format!("injected integrity violation on {kind} {key}"))
            }
        }
    }
}

struct Inner {
    state: Mutex<State>,
    faults: Mutex<HashMap<(EntityKind, String), Fault>>,
    write_count: AtomicU64,
}

impl Inner {
    fn check_fault(&self, kind: EntityKind, key: &str) -> Result<(), StoreError> {
        let faults = lock(&self.faults);
        match faults.get(&(kind, key.to_string())) {
            Some(fault) => Err(fault.into_error(kind, key)),
            None => Ok(()),
        }
    }

    fn count_write(&self) {
        self.write_count.fetch_add(1, Ordering::Relaxed);
    }
}

/// A local store held entirely in memory.
///
/// Each session works on a private copy of the state which replaces the
/// shared state on commit, so sessions are expected to run one at a time.
pub struct InMemoryStore {
    inner: Arc<Inner>,
    observers: Arc<ObserverRegistry>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                faults: Mutex::new(HashMap::new()),
                write_count: AtomicU64::new(0),
            }),
            observers: Arc::new(ObserverRegistry::new()),
        }
    }

    /// Makes every write to the given record fail with `fault`.
    pub fn fail_writes_to(&self, kind: EntityKind, key: impl Into<String>, fault: Fault) {
        lock(&self.inner.faults).insert((kind, key.into()), fault);
    }

    pub fn clear_faults(&self) {
        lock(&self.inner.faults).clear();
    }

    /// Number of write operations attempted since the store was created.
    pub fn write_count(&self) -> u64 {
        self.inner.write_count.load(Ordering::Relaxed)
    }
}

#[async_trait::async_trait]
impl LocalStore for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreSession>, StoreError> {
        let working = lock(&self.inner.state).clone();
        Ok(Box::new(InMemorySession {
            inner: Arc::clone(&self.inner),
            observers: Arc::clone(&self.observers),
            working,
            savepoints: Vec::new(),
            pending: Vec::new(),
        }))
    }

    fn observers(&self) -> &Arc<ObserverRegistry> {
        &self.observers
    }
}

/// Session over an [`InMemoryStore`]; savepoints are snapshots of the
/// working state.
pub struct InMemorySession {
    inner: Arc<Inner>,
    observers: Arc<ObserverRegistry>,
    working: State,
    savepoints: Vec<(State, usize)>,
    pending: Vec<ChangeEvent>,
}

impl InMemorySession {
    fn record_event(&mut self, notify: Notify, event: ChangeEvent) {
        if notify.is_broadcast() {
            self.pending.push(event);
        }
    }
}

#[async_trait::async_trait]
impl StoreSession for InMemorySession {
    async fn savepoint(&mut self) -> Result<(), StoreError> {
        self.savepoints
            .push((self.working.clone(), self.pending.len()));
        Ok(())
    }

    async fn release_savepoint(&mut self) -> Result<(), StoreError> {
        self.savepoints.pop().ok_or(StoreError::NoSavepoint)?;
        Ok(())
    }

    async fn rollback_to_savepoint(&mut self) -> Result<(), StoreError> {
        let (snapshot, pending) = self.savepoints.pop().ok_or(StoreError::NoSavepoint)?;
        self.working = snapshot;
        self.pending.truncate(pending);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let session = *self;
        *lock(&session.inner.state) = session.working;
        debug!(events = session.pending.len(), "In-memory session committed");
        session.observers.dispatch(&session.pending).await;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find(&mut self, kind: EntityKind, key: &str) -> Result<Option<Record>, StoreError> {
        Ok(self.working.find(kind, key).cloned())
    }

    async fn keys(&mut self, kind: EntityKind) -> Result<Vec<String>, StoreError> {
        Ok(self.working.keys(kind))
    }

    async fn save(&mut self, record: &Record, notify: Notify) -> Result<(), StoreError> {
        self.inner.count_write();
        self.inner.check_fault(record.kind(), record.key())?;
        self.working.save(record)?;
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
        self.inner.count_write();
        self.inner.check_fault(kind, key)?;
        let deleted = self.working.delete(kind, key);
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
        Ok(self.working.marker_exists(kind, key))
    }

    async fn mark(&mut self, kind: EntityKind, key: &str) -> Result<(), StoreError> {
        self.inner.count_write();
        self.inner.check_fault(kind, key)?;
        self.working.mark(kind, key)
    }

    async fn marked_keys(&mut self, kind: EntityKind) -> Result<Vec<String>, StoreError> {
        Ok(self.working.marked_keys(kind))
    }

    async fn unmark_and_delete(
        &mut self,
        kind: EntityKind,
        key: &str,
        notify: Notify,
    ) -> Result<bool, StoreError> {
        if let Some((dependent_kind, dependent)) =
            self.working.native_dependents(kind, key).into_iter().next()
        {
            return Err(StoreError::NativeDependents {
                kind,
                key: key.to_string(),
                dependent_kind,
                dependent,
            });
        }
        // Deleting the record drops its marker with it.
        self.delete(kind, key, notify).await
    }

    async fn find_contact(&mut self, uuid: &str) -> Result<Option<Contact>, StoreError> {
        Ok(self.working.find_contact(uuid).cloned())
    }

    async fn contacts_of(&mut self, owner: &OwnerRef) -> Result<Vec<Contact>, StoreError> {
        Ok(self.working.contacts_of(owner))
    }

    async fn save_contact(&mut self, contact: &Contact) -> Result<(), StoreError> {
        self.inner.count_write();
        self.working.save_contact(contact)
    }

    async fn delete_contact(&mut self, uuid: &str) -> Result<bool, StoreError> {
        self.inner.count_write();
        Ok(self.working.delete_contact(uuid))
    }

    async fn engagements_of(
        &mut self,
        organization: &str,
    ) -> Result<Vec<Engagement>, StoreError> {
        Ok(self.working.engagements_of(organization))
    }

    async fn delete_engagements(&mut self, organization: &str) -> Result<u64, StoreError> {
        self.inner.count_write();
        Ok(self.working.delete_engagements(organization))
    }

    async fn insert_engagement(&mut self, engagement: &Engagement) -> Result<(), StoreError> {
        self.inner.count_write();
        self.working.insert_engagement(engagement)
    }

    async fn legal_statuses(&mut self) -> Result<Vec<LegalStatus>, StoreError> {
        Ok(self.working.legal_statuses())
    }

    async fn save_legal_status(&mut self, status: &LegalStatus) -> Result<(), StoreError> {
        self.inner.count_write();
        self.working.save_legal_status(status);
        Ok(())
    }

    async fn transverse_themes(&mut self) -> Result<Vec<TransverseTheme>, StoreError> {
        Ok(self.working.transverse_themes())
    }

    async fn create_transverse_theme(
        &mut self,
        name: &str,
    ) -> Result<TransverseTheme, StoreError> {
        self.inner.count_write();
        self.working.create_transverse_theme(name)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
