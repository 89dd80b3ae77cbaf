use super::{Notice, NoticeBoard, StateCell};
use crate::core::{Result, SyncError};
use crate::gateway::Persistence;
use crate::model::Record;
use crate::store::{Collection, EntityStore};
use std::future::Future;
use tracing::{debug, warn};

/// How a mutation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// Persisted; the optimistic state is now the durable state.
    Committed,
    /// Persistence failed and the store was restored to its prior state.
    RolledBack(SyncError),
    /// Persistence failed and the local change was kept on purpose.
    LocalOnly(SyncError),
}

impl MutationOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, MutationOutcome::Committed)
    }

    pub fn is_rolled_back(&self) -> bool {
        matches!(self, MutationOutcome::RolledBack(_))
    }

    pub fn error(&self) -> Option<&SyncError> {
        match self {
            MutationOutcome::Committed => None,
            MutationOutcome::RolledBack(err) | MutationOutcome::LocalOnly(err) => Some(err),
        }
    }
}

/// What to do with the optimistic state when persistence fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Restore the snapshot and raise a user-visible notice.
    Rollback,
    /// Keep the local state and only log; for best-effort background work.
    KeepLocal,
}

/// Runs every store mutation as snapshot, optimistic apply, persist, and
/// rollback on failure.
///
/// Mutations are independent: nothing serializes two in-flight mutations, and
/// the later one to finish simply wins at the store level.
#[derive(Clone)]
pub struct MutationExecutor {
    store: EntityStore,
    persistence: Persistence,
    notices: NoticeBoard,
}

impl MutationExecutor {
    pub fn new(store: EntityStore, persistence: Persistence, notices: NoticeBoard) -> Self {
        Self {
            store,
            persistence,
            notices,
        }
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn persistence(&self) -> &Persistence {
        &self.persistence
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    /// Apply `apply` to the `T` collection now, then await `persist`; roll the
    /// collection back if it fails.
    pub async fn execute<T, A, P, Fut>(&self, op: &str, apply: A, persist: P) -> MutationOutcome
    where
        T: Record,
        A: FnOnce(&mut Collection<T>),
        P: FnOnce() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let detached = StateCell::new(());
        self.execute_with(
            op,
            &detached,
            |collection, _| apply(collection),
            persist,
            FailurePolicy::Rollback,
        )
        .await
    }

    /// Like [`execute`](Self::execute), additionally capturing a piece of UI
    /// state that is edited together with the collection and restored with it.
    ///
    /// `persist` is only invoked after the optimistic apply, so it may read
    /// the post-apply store.
    pub async fn execute_with<T, S, A, P, Fut>(
        &self,
        op: &str,
        state: &StateCell<S>,
        apply: A,
        persist: P,
        policy: FailurePolicy,
    ) -> MutationOutcome
    where
        T: Record,
        S: Clone,
        A: FnOnce(&mut Collection<T>, &mut S),
        P: FnOnce() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        if self.store.is_closed() {
            return MutationOutcome::RolledBack(SyncError::SessionClosed);
        }

        let previous = self.store.snapshot::<T>();
        let previous_state = state.get();
        self.store
            .update::<T, _>(|collection| state.update(|secondary| apply(collection, secondary)));
        debug!(op, collection = %T::KIND, "optimistic apply");

        let err = match persist().await {
            Ok(()) => {
                debug!(op, collection = %T::KIND, "committed");
                return MutationOutcome::Committed;
            }
            Err(err) => err,
        };

        match policy {
            FailurePolicy::Rollback => {
                if self.store.is_closed() {
                    debug!(op, collection = %T::KIND, error = %err, "persistence failed after teardown");
                    return MutationOutcome::RolledBack(err);
                }
                self.store.restore(previous);
                state.set(previous_state);
                warn!(op, collection = %T::KIND, error = %err, "persistence failed, rolled back");
                self.notices.publish(Notice::save_failed(op, &err));
                MutationOutcome::RolledBack(err)
            }
            FailurePolicy::KeepLocal => {
                warn!(op, collection = %T::KIND, error = %err, "persistence failed, keeping local state");
                MutationOutcome::LocalOnly(err)
            }
        }
    }
}
