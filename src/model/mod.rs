// ============================================================================
// Record Model
// ============================================================================
//
// Persisted entities mirrored by the entity store. Field-level shape belongs to
// the domain layer; this module only fixes what synchronization relies on:
// a stable identifier, the owning collection, and an optional custom order.
// Unknown fields ride along in `extra` so nothing is lost on a save.
//
// ============================================================================

use crate::core::CollectionKind;
use crate::store::{Collection, Collections};
use serde::{Serialize, de::DeserializeOwned};
use std::fmt;

/// A persisted entity held in one slot of the entity store.
pub trait Record:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const KIND: CollectionKind;

    fn id(&self) -> &str;

    /// Explicit display position; `None` keeps insertion order.
    fn sort_order(&self) -> Option<i64> {
        None
    }

    fn slot(collections: &Collections) -> &Collection<Self>;

    fn slot_mut(collections: &mut Collections) -> &mut Collection<Self>;
}

macro_rules! impl_record {
    ($ty:ty => $kind:ident in $slot:ident) => {
        impl $crate::model::Record for $ty {
            const KIND: $crate::core::CollectionKind = $crate::core::CollectionKind::$kind;

            fn id(&self) -> &str {
                &self.id
            }

            fn slot(collections: &$crate::store::Collections) -> &$crate::store::Collection<Self> {
                &collections.$slot
            }

            fn slot_mut(
                collections: &mut $crate::store::Collections,
            ) -> &mut $crate::store::Collection<Self> {
                &mut collections.$slot
            }
        }
    };
    ($ty:ty => $kind:ident in $slot:ident, ordered) => {
        impl $crate::model::Record for $ty {
            const KIND: $crate::core::CollectionKind = $crate::core::CollectionKind::$kind;

            fn id(&self) -> &str {
                &self.id
            }

            fn sort_order(&self) -> Option<i64> {
                self.order
            }

            fn slot(collections: &$crate::store::Collections) -> &$crate::store::Collection<Self> {
                &collections.$slot
            }

            fn slot_mut(
                collections: &mut $crate::store::Collections,
            ) -> &mut $crate::store::Collection<Self> {
                &mut collections.$slot
            }
        }
    };
}

pub mod animal;
pub mod logs;
pub mod people;
pub mod reference;

pub use animal::Animal;
pub use logs::{FirstAidLogEntry, Incident, ShiftStatus, SiteLogEntry, TimeLogEntry};
pub use people::{HolidayRequest, HolidayStatus, Task, User, UserRole};
pub use reference::{Contact, FeedMethod, FoodOption, Location, OrgProfile};
