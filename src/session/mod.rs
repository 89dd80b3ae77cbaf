// ============================================================================
// Session
// ============================================================================
//
// The constructible context tying one login together: the entity store, the
// executor and its notices, the current user, view state, the idle guard and
// the background enrichment job. Everything it owns lives exactly as long as
// the login and is torn down deterministically on logout or idle expiry.
//
// ============================================================================

pub mod guard;
pub mod loader;
pub mod shift;

pub use guard::{GuardState, IdleTimer, InteractionSignal, SessionGuard};
pub use loader::{LoadReport, load_collections};
pub use shift::{ShiftState, ShiftTracker};

use crate::config::AppConfig;
use crate::core::{Clock, Result, SystemClock};
use crate::enrichment::{EnrichmentRun, EnrichmentScheduler};
use crate::gateway::{EnrichmentGateway, Persistence, PersistenceGateway};
use crate::model::{Record, User};
use crate::mutation::{MutationExecutor, MutationOutcome, Notice, NoticeBoard, StateCell};
use crate::store::EntityStore;
use crate::view::ViewState;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{Instrument, info, info_span, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    UserRequested,
    IdleTimeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Active,
    LoggedOut(LogoutReason),
}

/// Assembles a [`Session`].
///
/// # Example
///
/// ```no_run
/// use sanctuary_sync::{InMemoryGateway, SessionBuilder};
/// use std::sync::Arc;
///
/// # async fn demo() -> sanctuary_sync::Result<()> {
/// let session = SessionBuilder::new(Arc::new(InMemoryGateway::new()))
///     .start()
///     .await?;
/// session.logout();
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    persistence: Arc<dyn PersistenceGateway>,
    enrichment: Option<Arc<dyn EnrichmentGateway>>,
    clock: Arc<dyn Clock>,
    config: AppConfig,
    user: Option<User>,
}

impl SessionBuilder {
    pub fn new(persistence: Arc<dyn PersistenceGateway>) -> Self {
        Self {
            persistence,
            enrichment: None,
            clock: Arc::new(SystemClock),
            config: AppConfig::default(),
            user: None,
        }
    }

    pub fn enrichment(mut self, gateway: Arc<dyn EnrichmentGateway>) -> Self {
        self.enrichment = Some(gateway);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    pub fn user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    /// Load every collection, raise the offline flag if anything failed,
    /// start enrichment in the background and arm the idle guard.
    ///
    /// Only an invalid configuration is an error; load failures degrade to
    /// an offline session.
    pub async fn start(self) -> Result<Session> {
        self.config.validate()?;

        let store = EntityStore::new();
        let notices = NoticeBoard::new();
        let persistence = Persistence::new(self.persistence);
        let executor = MutationExecutor::new(store.clone(), persistence.clone(), notices.clone());

        let (collections, report) =
            load_collections(&persistence, self.config.session.load_timeout()).await;
        store.load(collections);

        let offline = report.is_offline();
        if offline {
            warn!(failed = ?report.failed, timed_out = report.timed_out, "starting offline");
            notices.publish(Notice::offline());
        }

        let enrichment = self.enrichment.map(|gateway| {
            EnrichmentScheduler::new(
                executor.clone(),
                gateway,
                Arc::clone(&self.clock),
                self.config.enrichment.clone(),
            )
        });
        let (offline_tx, _) = watch::channel(offline);
        let (status_tx, _) = watch::channel(SessionStatus::Active);
        let user_id = self.user.as_ref().map(|user| user.id.clone());

        let session = Session {
            inner: Arc::new(SessionInner {
                shifts: ShiftTracker::new(executor.clone(), Arc::clone(&self.clock)),
                config: self.config,
                executor,
                enrichment,
                current_user: StateCell::new(self.user),
                view: StateCell::new(ViewState::default()),
                load_report: report,
                offline: offline_tx,
                status: status_tx,
                guard: Mutex::new(None),
                enrichment_task: Mutex::new(None),
            }),
        };
        session.arm_guard();
        session.spawn_enrichment();
        info!(user = ?user_id, offline, "session started");
        Ok(session)
    }
}

struct SessionInner {
    config: AppConfig,
    executor: MutationExecutor,
    shifts: ShiftTracker,
    enrichment: Option<EnrichmentScheduler>,
    current_user: StateCell<Option<User>>,
    view: StateCell<ViewState>,
    load_report: LoadReport,
    offline: watch::Sender<bool>,
    status: watch::Sender<SessionStatus>,
    guard: Mutex<Option<SessionGuard>>,
    enrichment_task: Mutex<Option<JoinHandle<EnrichmentRun>>>,
}

impl SessionInner {
    /// Idempotent; the first reason wins.
    fn teardown(&self, reason: LogoutReason) {
        let first = self.status.send_if_modified(|status| {
            if *status == SessionStatus::Active {
                *status = SessionStatus::LoggedOut(reason);
                true
            } else {
                false
            }
        });
        if !first {
            return;
        }

        if let Some(guard) = lock(&self.guard).take() {
            guard.cancel();
        }
        if let Some(task) = lock(&self.enrichment_task).as_ref() {
            task.abort();
        }
        self.executor.store().close();
        self.current_user.set(None);
        self.view.set(ViewState::default());

        if reason == LogoutReason::IdleTimeout {
            self.executor.notices().publish(Notice::session_expired());
        }
        info!(?reason, "session ended");
    }
}

/// One logged-in session. Cheap to clone; all clones share the same state.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    fn arm_guard(&self) {
        let weak: Weak<SessionInner> = Arc::downgrade(&self.inner);
        let guard = SessionGuard::start(self.inner.config.session.idle_timeout(), move || {
            if let Some(inner) = weak.upgrade() {
                inner.teardown(LogoutReason::IdleTimeout);
            }
        });
        *lock(&self.inner.guard) = Some(guard);
    }

    fn spawn_enrichment(&self) {
        if !self.inner.config.enrichment.enabled {
            return;
        }
        let Some(scheduler) = self.inner.enrichment.clone() else {
            return;
        };
        let task = tokio::spawn(async move { scheduler.run().await }.instrument(info_span!("enrichment")));
        *lock(&self.inner.enrichment_task) = Some(task);
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn executor(&self) -> &MutationExecutor {
        &self.inner.executor
    }

    pub fn store(&self) -> &EntityStore {
        self.inner.executor.store()
    }

    pub fn notices(&self) -> &NoticeBoard {
        self.inner.executor.notices()
    }

    pub fn load_report(&self) -> &LoadReport {
        &self.inner.load_report
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    pub fn status(&self) -> SessionStatus {
        *self.inner.status.borrow()
    }

    pub fn is_active(&self) -> bool {
        self.status() == SessionStatus::Active
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SessionStatus> {
        self.inner.status.subscribe()
    }

    /// End the session: cancel the guard, abort background work, close the
    /// store and forget the user. Calling it again does nothing.
    pub fn logout(&self) {
        self.inner.teardown(LogoutReason::UserRequested);
    }

    /// Report user activity to the idle guard
    pub fn signal(&self, signal: InteractionSignal) {
        if let Some(guard) = lock(&self.inner.guard).as_ref() {
            guard.signal(signal);
        }
    }

    pub fn guard_state(&self) -> Option<GuardState> {
        lock(&self.inner.guard).as_ref().map(SessionGuard::state)
    }

    // ------------------------------------------------------------------
    // Connectivity
    // ------------------------------------------------------------------

    pub fn is_offline(&self) -> bool {
        *self.inner.offline.borrow()
    }

    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.send_replace(offline);
    }

    pub fn subscribe_offline(&self) -> watch::Receiver<bool> {
        self.inner.offline.subscribe()
    }

    // ------------------------------------------------------------------
    // User and view
    // ------------------------------------------------------------------

    pub fn current_user(&self) -> Option<User> {
        self.inner.current_user.get()
    }

    pub fn set_current_user(&self, user: Option<User>) {
        if self.is_active() {
            self.inner.current_user.set(user);
        }
    }

    pub fn view(&self) -> ViewState {
        self.inner.view.get()
    }

    pub fn navigate(&self, view: ViewState) {
        if self.is_active() {
            self.inner.view.set(view);
        }
    }

    /// Delete a record, leaving its edit view if it is open. A failed delete
    /// restores the record and the view together.
    pub async fn delete_viewed<T: Record>(&self, id: &str) -> MutationOutcome {
        self.inner.executor.delete_viewed::<T>(id, &self.inner.view).await
    }

    // ------------------------------------------------------------------
    // Shifts
    // ------------------------------------------------------------------

    pub fn shift_state(&self) -> ShiftState {
        self.inner.shifts.state(self.current_user().as_ref())
    }

    /// `None` when there is no user or a shift is already open
    pub async fn clock_in(&self) -> Option<MutationOutcome> {
        let user = self.current_user();
        self.inner.shifts.clock_in(user.as_ref()).await
    }

    /// `None` when there is no user or no open shift
    pub async fn clock_out(&self) -> Option<MutationOutcome> {
        let user = self.current_user();
        self.inner.shifts.clock_out(user.as_ref()).await
    }

    // ------------------------------------------------------------------
    // Enrichment
    // ------------------------------------------------------------------

    /// Wait for the background run started at login. `None` if none was
    /// started, it was already awaited, or it was aborted by logout.
    pub async fn wait_for_enrichment(&self) -> Option<EnrichmentRun> {
        let task = lock(&self.inner.enrichment_task).take()?;
        match task.await {
            Ok(run) => Some(run),
            Err(err) => {
                if !err.is_cancelled() {
                    warn!(error = %err, "enrichment task failed");
                }
                None
            }
        }
    }

    /// Run one enrichment pass in the foreground. `None` without a gateway.
    pub async fn run_enrichment(&self) -> Option<EnrichmentRun> {
        let scheduler = self.inner.enrichment.as_ref()?;
        Some(scheduler.run().instrument(info_span!("enrichment")).await)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::InMemoryGateway;
    use crate::model::Animal;

    #[tokio::test]
    async fn test_logout_is_idempotent_and_closes_store() {
        let gateway = Arc::new(InMemoryGateway::new());
        gateway.seed(&[Animal::with_id("a1", "Hoot", "Barn Owl")]);
        let session = SessionBuilder::new(gateway)
            .user(User::with_id("u1", "Sam"))
            .start()
            .await
            .unwrap();
        assert_eq!(session.store().len::<Animal>(), 1);

        session.logout();
        session.logout();

        assert_eq!(
            session.status(),
            SessionStatus::LoggedOut(LogoutReason::UserRequested)
        );
        assert!(session.store().is_closed());
        assert_eq!(session.store().len::<Animal>(), 0);
        assert!(session.current_user().is_none());
        assert!(session.guard_state().is_none());
    }
}
