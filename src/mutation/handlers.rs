// ============================================================================
// Entity Handlers
// ============================================================================
//
// Generic create/update/delete/bulk-replace on top of the executor, and the
// thin per-entity bindings the application calls.
//
// ============================================================================

use super::{FailurePolicy, MutationExecutor, MutationOutcome, StateCell};
use crate::model::{
    Animal, Contact, FeedMethod, FirstAidLogEntry, FoodOption, HolidayRequest, Incident, Location,
    OrgProfile, Record, SiteLogEntry, Task, User,
};
use crate::view::ViewState;
use paste::paste;

impl MutationExecutor {
    /// Create the record, or replace it if its id is already present
    pub async fn save<T: Record>(&self, record: T) -> MutationOutcome {
        let verb = if self.store().find::<T>(record.id()).is_some() {
            "update"
        } else {
            "create"
        };
        let op = format!("{verb} {}", T::KIND);
        let persistence = self.persistence().clone();
        let persisted = record.clone();
        self.execute::<T, _, _, _>(
            &op,
            move |collection| collection.upsert(record),
            move || async move { persistence.save(&persisted).await },
        )
        .await
    }

    pub async fn delete<T: Record>(&self, id: &str) -> MutationOutcome {
        let op = format!("delete {}", T::KIND);
        let persistence = self.persistence().clone();
        let target = id.to_string();
        self.execute::<T, _, _, _>(
            &op,
            |collection| {
                collection.remove(id);
            },
            move || async move { persistence.delete::<T>(&target).await },
        )
        .await
    }

    /// Delete a record that may be open in the UI. On failure the record and
    /// the navigation both come back, returning the user to its edit view.
    pub async fn delete_viewed<T: Record>(
        &self,
        id: &str,
        view: &StateCell<ViewState>,
    ) -> MutationOutcome {
        let op = format!("delete {}", T::KIND);
        let persistence = self.persistence().clone();
        let target = id.to_string();
        self.execute_with::<T, ViewState, _, _, _>(
            &op,
            view,
            |collection, view| {
                collection.remove(id);
                view.leave(T::KIND, id);
            },
            move || async move { persistence.delete::<T>(&target).await },
            FailurePolicy::Rollback,
        )
        .await
    }

    /// Replace a whole collection and persist it in one bulk write
    pub async fn replace_all<T: Record>(&self, records: Vec<T>) -> MutationOutcome {
        let op = format!("replace {}", T::KIND);
        let persistence = self.persistence().clone();
        let persisted = records.clone();
        self.execute::<T, _, _, _>(
            &op,
            move |collection| collection.replace_all(records),
            move || async move { persistence.save_bulk(&persisted).await },
        )
        .await
    }
}

macro_rules! entity_bindings {
    ($($name:ident => $ty:ty),* $(,)?) => {
        paste! {
            impl MutationExecutor {
                $(
                    pub async fn [<save_ $name>](&self, record: $ty) -> MutationOutcome {
                        self.save(record).await
                    }

                    pub async fn [<delete_ $name>](&self, id: &str) -> MutationOutcome {
                        self.delete::<$ty>(id).await
                    }
                )*
            }
        }
    };
}

macro_rules! reference_bindings {
    ($($name:ident => $ty:ty),* $(,)?) => {
        paste! {
            impl MutationExecutor {
                $(
                    pub async fn [<replace_ $name>](&self, records: Vec<$ty>) -> MutationOutcome {
                        self.replace_all(records).await
                    }
                )*
            }
        }
    };
}

entity_bindings! {
    animal => Animal,
    task => Task,
    user => User,
    site_log => SiteLogEntry,
    incident => Incident,
    first_aid_log => FirstAidLogEntry,
    holiday_request => HolidayRequest,
}

reference_bindings! {
    food_options => FoodOption,
    feed_methods => FeedMethod,
    locations => Location,
    contacts => Contact,
}

impl MutationExecutor {
    /// The organisation profile is a single-record list
    pub async fn save_org_profile(&self, profile: OrgProfile) -> MutationOutcome {
        self.replace_all(vec![profile]).await
    }
}
