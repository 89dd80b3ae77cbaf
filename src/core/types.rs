use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;
use uuid::Uuid;

/// Caller-assigned record identifier, unique for the lifetime of a session.
pub type RecordId = String;

/// Generate a fresh record identifier
pub fn new_record_id() -> RecordId {
    Uuid::new_v4().to_string()
}

/// One slot of the entity store, and one collection at the persistence gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    Animals,
    Tasks,
    Users,
    SiteLogs,
    Incidents,
    FirstAidLogs,
    TimeLogs,
    HolidayRequests,
    FoodOptions,
    FeedMethods,
    Locations,
    Contacts,
    OrgProfile,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 13] = [
        CollectionKind::Animals,
        CollectionKind::Tasks,
        CollectionKind::Users,
        CollectionKind::SiteLogs,
        CollectionKind::Incidents,
        CollectionKind::FirstAidLogs,
        CollectionKind::TimeLogs,
        CollectionKind::HolidayRequests,
        CollectionKind::FoodOptions,
        CollectionKind::FeedMethods,
        CollectionKind::Locations,
        CollectionKind::Contacts,
        CollectionKind::OrgProfile,
    ];

    /// Stable name used for gateway documents and log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKind::Animals => "animals",
            CollectionKind::Tasks => "tasks",
            CollectionKind::Users => "users",
            CollectionKind::SiteLogs => "site_logs",
            CollectionKind::Incidents => "incidents",
            CollectionKind::FirstAidLogs => "first_aid_logs",
            CollectionKind::TimeLogs => "time_logs",
            CollectionKind::HolidayRequests => "holiday_requests",
            CollectionKind::FoodOptions => "food_options",
            CollectionKind::FeedMethods => "feed_methods",
            CollectionKind::Locations => "locations",
            CollectionKind::Contacts => "contacts",
            CollectionKind::OrgProfile => "org_profile",
        }
    }

    /// Reference lists are curated by an administrator and replaced in bulk.
    pub fn is_reference_list(&self) -> bool {
        matches!(
            self,
            CollectionKind::FoodOptions
                | CollectionKind::FeedMethods
                | CollectionKind::Locations
                | CollectionKind::Contacts
                | CollectionKind::OrgProfile
        )
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wall-clock source for record timestamps and the sync watermark.
///
/// Timers (idle deadline, pacing delay) use tokio's monotonic clock instead.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for tests and replays
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_kind_names_are_unique() {
        let mut names: Vec<_> = CollectionKind::ALL.iter().map(|k| k.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), CollectionKind::ALL.len());
    }

    #[test]
    fn test_reference_lists() {
        assert!(CollectionKind::Contacts.is_reference_list());
        assert!(!CollectionKind::Animals.is_reference_list());
    }

    #[test]
    fn test_manual_clock_advances() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        clock.advance(Duration::milliseconds(125_000));
        assert_eq!(clock.now() - start, Duration::milliseconds(125_000));
    }

    #[test]
    fn test_record_ids_are_fresh() {
        assert_ne!(new_record_id(), new_record_id());
    }
}
