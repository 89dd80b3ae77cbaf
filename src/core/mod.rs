pub mod error;
pub mod types;

pub use error::{Result, SyncError};
pub use types::{Clock, CollectionKind, ManualClock, RecordId, SystemClock, new_record_id};
