use super::Collection;
use crate::core::CollectionKind;
use crate::model::{
    Animal, Contact, FeedMethod, FirstAidLogEntry, FoodOption, HolidayRequest, Incident, Location,
    OrgProfile, Record, SiteLogEntry, Task, TimeLogEntry, User,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::watch;

/// One slot per collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collections {
    pub animals: Collection<Animal>,
    pub tasks: Collection<Task>,
    pub users: Collection<User>,
    pub site_logs: Collection<SiteLogEntry>,
    pub incidents: Collection<Incident>,
    pub first_aid_logs: Collection<FirstAidLogEntry>,
    pub time_logs: Collection<TimeLogEntry>,
    pub holiday_requests: Collection<HolidayRequest>,
    pub food_options: Collection<FoodOption>,
    pub feed_methods: Collection<FeedMethod>,
    pub locations: Collection<Location>,
    pub contacts: Collection<Contact>,
    pub org_profile: Collection<OrgProfile>,
}

impl Collections {
    pub fn len_of(&self, kind: CollectionKind) -> usize {
        match kind {
            CollectionKind::Animals => self.animals.len(),
            CollectionKind::Tasks => self.tasks.len(),
            CollectionKind::Users => self.users.len(),
            CollectionKind::SiteLogs => self.site_logs.len(),
            CollectionKind::Incidents => self.incidents.len(),
            CollectionKind::FirstAidLogs => self.first_aid_logs.len(),
            CollectionKind::TimeLogs => self.time_logs.len(),
            CollectionKind::HolidayRequests => self.holiday_requests.len(),
            CollectionKind::FoodOptions => self.food_options.len(),
            CollectionKind::FeedMethods => self.feed_methods.len(),
            CollectionKind::Locations => self.locations.len(),
            CollectionKind::Contacts => self.contacts.len(),
            CollectionKind::OrgProfile => self.org_profile.len(),
        }
    }

    pub fn counts(&self) -> Vec<(CollectionKind, usize)> {
        CollectionKind::ALL
            .iter()
            .map(|kind| (*kind, self.len_of(*kind)))
            .collect()
    }
}

struct StoreShared {
    collections: RwLock<Collections>,
    closed: AtomicBool,
    revision: watch::Sender<u64>,
}

/// In-memory mirror of every collection for one session.
///
/// All operations are synchronous and total: unknown ids are ignored and a
/// poisoned lock is recovered rather than reported. Each effective write bumps
/// a revision that subscribers observe. Once closed, the store is empty and
/// ignores writes.
#[derive(Clone)]
pub struct EntityStore {
    shared: Arc<StoreShared>,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStore {
    pub fn new() -> Self {
        Self::with_collections(Collections::default())
    }

    pub fn with_collections(collections: Collections) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            shared: Arc::new(StoreShared {
                collections: RwLock::new(collections),
                closed: AtomicBool::new(false),
                revision,
            }),
        }
    }

    /// Records of `T` in display order
    pub fn get<T: Record>(&self) -> Vec<T> {
        self.read(|collections| T::slot(collections).to_vec())
    }

    pub fn find<T: Record>(&self, id: &str) -> Option<T> {
        self.read(|collections| T::slot(collections).get(id).cloned())
    }

    pub fn len<T: Record>(&self) -> usize {
        self.read(|collections| T::slot(collections).len())
    }

    pub fn insert<T: Record>(&self, record: T) {
        self.write::<T, _, _>(|slot| {
            slot.insert(record);
            ((), true)
        });
    }

    pub fn replace<T: Record>(&self, id: &str, record: T) {
        self.write::<T, _, _>(|slot| ((), slot.replace(id, record)));
    }

    pub fn remove<T: Record>(&self, id: &str) {
        self.write::<T, _, _>(|slot| ((), slot.remove(id).is_some()));
    }

    pub fn replace_all<T: Record>(&self, records: Vec<T>) {
        self.write::<T, _, _>(|slot| {
            slot.replace_all(records);
            ((), true)
        });
    }

    /// Apply an arbitrary edit to one collection. Returns `None` once closed.
    pub fn update<T: Record, R>(&self, f: impl FnOnce(&mut Collection<T>) -> R) -> Option<R> {
        self.write::<T, _, _>(|slot| (f(slot), true))
    }

    /// Structural copy of one collection, cheap to take and to hold
    pub fn snapshot<T: Record>(&self) -> Collection<T> {
        self.read(|collections| T::slot(collections).clone())
    }

    pub fn restore<T: Record>(&self, snapshot: Collection<T>) {
        self.write::<T, _, _>(|slot| {
            *slot = snapshot;
            ((), true)
        });
    }

    /// Replace every collection at once (initial load)
    pub fn load(&self, collections: Collections) {
        {
            let mut guard = self.lock_write();
            if self.is_closed() {
                return;
            }
            *guard = collections;
        }
        self.bump();
    }

    pub fn counts(&self) -> Vec<(CollectionKind, usize)> {
        self.read(Collections::counts)
    }

    /// Clear every collection and refuse further writes.
    pub fn close(&self) {
        {
            let mut guard = self.lock_write();
            self.shared.closed.store(true, Ordering::SeqCst);
            *guard = Collections::default();
        }
        self.bump();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    pub fn revision(&self) -> u64 {
        *self.shared.revision.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    fn read<R>(&self, f: impl FnOnce(&Collections) -> R) -> R {
        let guard = self
            .shared
            .collections
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f(&*guard)
    }

    fn lock_write(&self) -> std::sync::RwLockWriteGuard<'_, Collections> {
        self.shared
            .collections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write<T, F, R>(&self, f: F) -> Option<R>
    where
        T: Record,
        F: FnOnce(&mut Collection<T>) -> (R, bool),
    {
        let (result, changed) = {
            let mut guard = self.lock_write();
            if self.is_closed() {
                return None;
            }
            f(T::slot_mut(&mut *guard))
        };
        if changed {
            self.bump();
        }
        Some(result)
    }

    fn bump(&self) {
        self.shared.revision.send_modify(|revision| *revision += 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owl(id: &str, name: &str) -> Animal {
        Animal::with_id(id, name, "Barn Owl")
    }

    #[test]
    fn test_crud_is_total() {
        let store = EntityStore::new();
        store.insert(owl("a1", "Hoot"));
        store.replace("a1", owl("a1", "Hooter"));
        store.replace("missing", owl("missing", "Ghost"));
        store.remove::<Animal>("missing");
        let animals = store.get::<Animal>();
        assert_eq!(animals.len(), 1);
        assert_eq!(animals[0].name, "Hooter");
    }

    #[test]
    fn test_revision_bumps_only_on_effective_writes() {
        let store = EntityStore::new();
        let start = store.revision();
        store.insert(owl("a1", "Hoot"));
        assert_eq!(store.revision(), start + 1);
        store.remove::<Animal>("nope");
        assert_eq!(store.revision(), start + 1);
        store.remove::<Animal>("a1");
        assert_eq!(store.revision(), start + 2);
    }

    #[test]
    fn test_snapshot_restore_round_trip() {
        let store = EntityStore::new();
        store.insert(owl("a1", "Hoot"));
        let snapshot = store.snapshot::<Animal>();
        store.insert(owl("a2", "Screech"));
        store.remove::<Animal>("a1");
        store.restore(snapshot.clone());
        assert_eq!(store.snapshot::<Animal>(), snapshot);
    }

    #[test]
    fn test_closed_store_ignores_writes() {
        let store = EntityStore::new();
        store.insert(owl("a1", "Hoot"));
        store.close();
        store.insert(owl("a2", "Screech"));
        assert!(store.get::<Animal>().is_empty());
        assert!(store.update::<Animal, _>(|slot| slot.len()).is_none());
    }

    #[tokio::test]
    async fn test_subscribers_observe_changes() {
        let store = EntityStore::new();
        let mut rx = store.subscribe();
        store.insert(owl("a1", "Hoot"));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), 1);
    }
}
