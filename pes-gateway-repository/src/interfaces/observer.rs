use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use pes_gateway_shared::types::ChangeEvent;
use tracing::debug;

/// Receives change events after the session that produced them commits.
///
/// Observers handle their own failures; a failing observer never undoes the
/// committed write.
#[async_trait::async_trait]
pub trait ChangeObserver: Send + Sync {
    async fn on_change(&self, event: &ChangeEvent);
}

/// Handle returned by [`ObserverRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Explicit registry of change observers exposed by a store.
#[derive(Default)]
pub struct ObserverRegistry {
    observers: RwLock<Vec<(ObserverId, Arc<dyn ChangeObserver>)>>,
    next_id: AtomicU64,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, observer: Arc<dyn ChangeObserver>) -> ObserverId {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.write().push((id, observer));
        id
    }

    /// Returns `false` if the observer was not registered.
    pub fn unregister(&self, id: ObserverId) -> bool {
        let mut observers = self.write();
        let before = observers.len();
        observers.retain(|(registered, _)| *registered != id);
        observers.len() != before
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delivers each event to every observer registered at call time.
    pub async fn dispatch(&self, events: &[ChangeEvent]) {
        if events.is_empty() {
            return;
        }
        let observers: Vec<Arc<dyn ChangeObserver>> = self
            .read()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();

        for event in events {
            debug!(
                kind = %event.kind(),
                key = %event.key(),
                observer_count = observers.len(),
                "Dispatching change event"
            );
            for observer in &observers {
                observer.on_change(event).await;
            }
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<(ObserverId, Arc<dyn ChangeObserver>)>> {
        self.observers.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, Vec<(ObserverId, Arc<dyn ChangeObserver>)>> {
        self.observers.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
