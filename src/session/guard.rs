use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{info, trace};

/// Deadline used when `now + timeout` overflows
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Guard lifecycle
///
/// ```text
/// Active ──reset──> Active
///   │
///   └──deadline──> Expired (terminal, forces logout)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Active,
    Expired,
}

/// User activity that proves someone is still at the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionSignal {
    PointerMove,
    PointerDown,
    KeyDown,
    TouchStart,
    Scroll,
    Click,
}

impl InteractionSignal {
    pub const ALL: [InteractionSignal; 6] = [
        InteractionSignal::PointerMove,
        InteractionSignal::PointerDown,
        InteractionSignal::KeyDown,
        InteractionSignal::TouchStart,
        InteractionSignal::Scroll,
        InteractionSignal::Click,
    ];

    /// Map a DOM-style event name to a signal
    pub fn from_event_name(name: &str) -> Option<Self> {
        match name {
            "mousemove" | "pointermove" => Some(Self::PointerMove),
            "mousedown" | "pointerdown" => Some(Self::PointerDown),
            "keydown" | "keypress" => Some(Self::KeyDown),
            "touchstart" => Some(Self::TouchStart),
            "scroll" => Some(Self::Scroll),
            "click" => Some(Self::Click),
            _ => None,
        }
    }
}

struct TimerSlot {
    generation: u64,
    deadline: Option<Instant>,
    handle: Option<JoinHandle<()>>,
}

/// Single-shot deadline timer.
///
/// Arming replaces the pending deadline: the previous task is aborted and its
/// generation retired, so a stale timer can never fire after a re-arm.
pub struct IdleTimer {
    slot: Arc<Mutex<TimerSlot>>,
}

impl Default for IdleTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl IdleTimer {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(TimerSlot {
                generation: 0,
                deadline: None,
                handle: None,
            })),
        }
    }

    pub fn arm<F>(&self, deadline: Instant, on_fire: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut slot = lock(&self.slot);
        slot.generation += 1;
        let generation = slot.generation;
        if let Some(previous) = slot.handle.take() {
            previous.abort();
        }

        let shared = Arc::clone(&self.slot);
        slot.deadline = Some(deadline);
        slot.handle = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            {
                let mut slot = lock(&shared);
                if slot.generation != generation {
                    return;
                }
                slot.deadline = None;
                slot.handle = None;
            }
            on_fire();
        }));
    }

    pub fn cancel(&self) {
        let mut slot = lock(&self.slot);
        slot.generation += 1;
        slot.deadline = None;
        if let Some(handle) = slot.handle.take() {
            handle.abort();
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        lock(&self.slot).deadline
    }

    pub fn is_armed(&self) -> bool {
        lock(&self.slot).deadline.is_some()
    }
}

impl Drop for IdleTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

type ExpiryHook = Arc<dyn Fn() + Send + Sync>;

/// Forces logout after a window of inactivity.
///
/// Every interaction signal pushes the deadline to now + timeout. If the
/// deadline passes, the guard moves to `Expired` and runs the expiry hook
/// exactly once. Dropping the guard cancels the timer.
pub struct SessionGuard {
    timeout: Duration,
    timer: IdleTimer,
    state: Arc<watch::Sender<GuardState>>,
    on_expire: ExpiryHook,
}

impl SessionGuard {
    /// Create the guard and arm the first deadline. Requires a tokio runtime.
    pub fn start<F>(timeout: Duration, on_expire: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let (state, _) = watch::channel(GuardState::Active);
        let guard = Self {
            timeout,
            timer: IdleTimer::new(),
            state: Arc::new(state),
            on_expire: Arc::new(on_expire),
        };
        guard.reset();
        guard
    }

    /// Restart the full timeout window from now. Ignored once expired.
    pub fn reset(&self) {
        if self.state() == GuardState::Expired {
            return;
        }
        let state = Arc::clone(&self.state);
        let on_expire = Arc::clone(&self.on_expire);
        let timeout = self.timeout;
        let now = Instant::now();
        let deadline = now.checked_add(timeout).unwrap_or(now + FAR_FUTURE);
        self.timer.arm(deadline, move || {
            let expired = state.send_if_modified(|current| {
                if *current == GuardState::Active {
                    *current = GuardState::Expired;
                    true
                } else {
                    false
                }
            });
            if expired {
                info!(?timeout, "session idle timeout reached");
                on_expire();
            }
        });
    }

    pub fn signal(&self, signal: InteractionSignal) {
        trace!(?signal, "interaction");
        self.reset();
    }

    pub fn cancel(&self) {
        self.timer.cancel();
    }

    pub fn state(&self) -> GuardState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<GuardState> {
        self.state.subscribe()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_guard(timeout: Duration) -> (SessionGuard, Arc<AtomicUsize>) {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let guard = SessionGuard::start(timeout, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (guard, fired)
    }

    #[tokio::test(start_paused = true)]
    async fn test_expires_after_full_timeout() {
        let (guard, fired) = counting_guard(Duration::from_secs(300));
        tokio::time::sleep(Duration::from_secs(299)).await;
        assert_eq!(guard.state(), GuardState::Active);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(guard.state(), GuardState::Expired);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_restarts_window_without_duplicate_expiry() {
        let (guard, fired) = counting_guard(Duration::from_secs(300));
        for _ in 0..5 {
            tokio::time::sleep(Duration::from_secs(200)).await;
            guard.signal(InteractionSignal::KeyDown);
        }
        assert_eq!(guard.state(), GuardState::Active);
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(301)).await;
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(guard.state(), GuardState::Expired);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_expiry() {
        let (guard, fired) = counting_guard(Duration::from_secs(10));
        guard.cancel();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(guard.state(), GuardState::Active);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(guard.deadline().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_signals_after_expiry_are_ignored() {
        let (guard, fired) = counting_guard(Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(11)).await;
        guard.signal(InteractionSignal::Click);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(guard.state(), GuardState::Expired);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!guard.timer.is_armed());
    }

    #[test]
    fn test_event_names() {
        assert_eq!(
            InteractionSignal::from_event_name("touchstart"),
            Some(InteractionSignal::TouchStart)
        );
        assert_eq!(InteractionSignal::from_event_name("resize"), None);
    }
}
