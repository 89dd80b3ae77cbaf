use crate::core::Clock;
use crate::model::{TimeLogEntry, User};
use crate::mutation::{MutationExecutor, MutationOutcome};
use std::sync::Arc;
use tracing::{debug, info};

/// Attendance state of the current user.
///
/// Derived from the time-log collection on every read, so it always agrees
/// with the store, including after a rollback.
#[derive(Debug, Clone, PartialEq)]
pub enum ShiftState {
    NoShift,
    Active(TimeLogEntry),
}

impl ShiftState {
    pub fn is_active(&self) -> bool {
        matches!(self, ShiftState::Active(_))
    }

    /// The user's open shift, preferring the latest start if several exist
    pub fn derive<'a>(user: Option<&User>, logs: impl IntoIterator<Item = &'a TimeLogEntry>) -> Self {
        let Some(user) = user else {
            return ShiftState::NoShift;
        };
        logs.into_iter()
            .filter(|entry| entry.user_id == user.id && entry.is_active())
            .max_by_key(|entry| entry.start_time)
            .cloned()
            .map_or(ShiftState::NoShift, ShiftState::Active)
    }
}

/// Clock-in / clock-out state machine.
///
/// ```text
/// NoShift ──clock_in──> Active(entry) ──clock_out──> NoShift
/// ```
///
/// Transitions that do not apply (no user, already in the target state) are
/// no-ops and return `None`.
#[derive(Clone)]
pub struct ShiftTracker {
    executor: MutationExecutor,
    clock: Arc<dyn Clock>,
}

impl ShiftTracker {
    pub fn new(executor: MutationExecutor, clock: Arc<dyn Clock>) -> Self {
        Self { executor, clock }
    }

    pub fn state(&self, user: Option<&User>) -> ShiftState {
        let logs = self.executor.store().snapshot::<TimeLogEntry>();
        ShiftState::derive(user, logs.iter())
    }

    pub async fn clock_in(&self, user: Option<&User>) -> Option<MutationOutcome> {
        let Some(user) = user else {
            debug!("clock in ignored, nobody logged in");
            return None;
        };
        if self.state(Some(user)).is_active() {
            debug!(user = %user.id, "clock in ignored, shift already open");
            return None;
        }

        let shift = TimeLogEntry::open(user, self.clock.now());
        info!(user = %user.id, shift = %shift.id, "clocking in");
        let persistence = self.executor.persistence().clone();
        let persisted = shift.clone();
        let outcome = self
            .executor
            .execute::<TimeLogEntry, _, _, _>(
                "clock in",
                move |logs| logs.insert(shift),
                move || async move { persistence.save(&persisted).await },
            )
            .await;
        Some(outcome)
    }

    pub async fn clock_out(&self, user: Option<&User>) -> Option<MutationOutcome> {
        let Some(user) = user else {
            debug!("clock out ignored, nobody logged in");
            return None;
        };
        let ShiftState::Active(open) = self.state(Some(user)) else {
            debug!(user = %user.id, "clock out ignored, no open shift");
            return None;
        };

        let closed = open.closed_at(self.clock.now());
        info!(
            user = %user.id,
            shift = %closed.id,
            minutes = closed.duration_minutes.unwrap_or_default(),
            "clocking out"
        );
        let persistence = self.executor.persistence().clone();
        let persisted = closed.clone();
        let outcome = self
            .executor
            .execute::<TimeLogEntry, _, _, _>(
                "clock out",
                move |logs| {
                    logs.replace(&open.id, closed);
                },
                move || async move { persistence.save(&persisted).await },
            )
            .await;
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_derive_picks_latest_open_shift_of_user() {
        let sam = User::with_id("u1", "Sam");
        let kit = User::with_id("u2", "Kit");
        let now = Utc::now();
        let older = TimeLogEntry::open(&sam, now - Duration::hours(3));
        let newer = TimeLogEntry::open(&sam, now - Duration::hours(1));
        let closed = TimeLogEntry::open(&sam, now).closed_at(now);
        let other = TimeLogEntry::open(&kit, now);
        let logs = vec![older, newer.clone(), closed, other];

        assert_eq!(ShiftState::derive(Some(&sam), &logs), ShiftState::Active(newer));
        assert_eq!(ShiftState::derive(None, &logs), ShiftState::NoShift);
        assert_eq!(
            ShiftState::derive(Some(&User::with_id("u3", "Ash")), &logs),
            ShiftState::NoShift
        );
    }
}
