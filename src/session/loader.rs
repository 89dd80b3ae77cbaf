use crate::core::{CollectionKind, Result};
use crate::gateway::Persistence;
use crate::model::{
    Animal, Contact, FeedMethod, FirstAidLogEntry, FoodOption, HolidayRequest, Incident, Location,
    OrgProfile, Record, SiteLogEntry, Task, TimeLogEntry, User,
};
use crate::store::{Collection, Collections};
use std::time::Duration;
use tracing::{debug, warn};

/// Which parts of the initial load did not make it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub failed: Vec<CollectionKind>,
    /// The whole fan-out exceeded its time bound
    pub timed_out: bool,
}

impl LoadReport {
    pub fn is_offline(&self) -> bool {
        self.timed_out || !self.failed.is_empty()
    }

    fn total_failure() -> Self {
        Self {
            failed: CollectionKind::ALL.to_vec(),
            timed_out: true,
        }
    }
}

/// Fetch every collection concurrently.
///
/// A failing fetch degrades to an empty collection and is listed in the
/// report. If the fan-out as a whole exceeds `timeout`, every collection is
/// empty. A zero `timeout` leaves the load unbounded.
pub async fn load_collections(persistence: &Persistence, timeout: Duration) -> (Collections, LoadReport) {
    if timeout.is_zero() {
        return fan_out(persistence).await;
    }
    match tokio::time::timeout(timeout, fan_out(persistence)).await {
        Ok(loaded) => loaded,
        Err(_) => {
            warn!(?timeout, "initial load timed out, starting offline with an empty store");
            (Collections::default(), LoadReport::total_failure())
        }
    }
}

async fn fan_out(persistence: &Persistence) -> (Collections, LoadReport) {
    let (
        animals,
        tasks,
        users,
        site_logs,
        incidents,
        first_aid_logs,
        time_logs,
        holiday_requests,
        food_options,
        feed_methods,
        locations,
        contacts,
        org_profile,
    ) = tokio::join!(
        persistence.fetch::<Animal>(),
        persistence.fetch::<Task>(),
        persistence.fetch::<User>(),
        persistence.fetch::<SiteLogEntry>(),
        persistence.fetch::<Incident>(),
        persistence.fetch::<FirstAidLogEntry>(),
        persistence.fetch::<TimeLogEntry>(),
        persistence.fetch::<HolidayRequest>(),
        persistence.fetch::<FoodOption>(),
        persistence.fetch::<FeedMethod>(),
        persistence.fetch::<Location>(),
        persistence.fetch::<Contact>(),
        persistence.fetch::<OrgProfile>(),
    );

    let mut report = LoadReport::default();
    let collections = Collections {
        animals: settle(animals, &mut report),
        tasks: settle(tasks, &mut report),
        users: settle(users, &mut report),
        site_logs: settle(site_logs, &mut report),
        incidents: settle(incidents, &mut report),
        first_aid_logs: settle(first_aid_logs, &mut report),
        time_logs: settle(time_logs, &mut report),
        holiday_requests: settle(holiday_requests, &mut report),
        food_options: settle(food_options, &mut report),
        feed_methods: settle(feed_methods, &mut report),
        locations: settle(locations, &mut report),
        contacts: settle(contacts, &mut report),
        org_profile: settle(org_profile, &mut report),
    };
    debug!(failed = report.failed.len(), "initial load settled");
    (collections, report)
}

fn settle<T: Record>(fetched: Result<Vec<T>>, report: &mut LoadReport) -> Collection<T> {
    match fetched {
        Ok(records) => Collection::from_records(records),
        Err(err) => {
            warn!(collection = %T::KIND, error = %err, "load failed, using empty collection");
            report.failed.push(T::KIND);
            Collection::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{GatewayOp, InMemoryGateway};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_single_failure_keeps_other_collections() {
        let gateway = Arc::new(InMemoryGateway::default());
        gateway.seed(&[Animal::with_id("a1", "Hoot", "Barn Owl")]);
        gateway.seed(&[Task::new("Clean aviary")]);
        gateway.fail(GatewayOp::Fetch, Some(CollectionKind::Tasks));

        let persistence = Persistence::new(gateway);
        let (collections, report) = load_collections(&persistence, Duration::from_secs(5)).await;

        assert_eq!(collections.animals.len(), 1);
        assert!(collections.tasks.is_empty());
        assert_eq!(report.failed, vec![CollectionKind::Tasks]);
        assert!(report.is_offline());
        assert!(!report.timed_out);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_total_failure() {
        let gateway = Arc::new(InMemoryGateway::default().with_latency(Duration::from_secs(60)));
        gateway.seed(&[Animal::with_id("a1", "Hoot", "Barn Owl")]);

        let persistence = Persistence::new(gateway);
        let (collections, report) = load_collections(&persistence, Duration::from_secs(30)).await;

        assert!(collections.animals.is_empty());
        assert!(report.timed_out);
        assert_eq!(report.failed.len(), CollectionKind::ALL.len());
    }
}
