// ============================================================================
// Sanctuary Sync Library
// ============================================================================
//
// Client-side data synchronization core for a small animal-sanctuary
// management application: an in-memory entity store kept consistent with a
// remote persistence service through optimistic mutations with rollback, a
// throttled background enrichment job, an idle-session guard, and the staff
// attendance shift machine.
//
// ============================================================================

pub mod config;
pub mod core;
pub mod enrichment;
pub mod gateway;
pub mod model;
pub mod mutation;
pub mod session;
pub mod store;
pub mod view;

// Re-export main types for convenience
pub use config::AppConfig;
pub use core::{Clock, CollectionKind, ManualClock, RecordId, Result, SyncError, SystemClock};
pub use enrichment::{EnrichmentReport, EnrichmentRun, EnrichmentScheduler, SkipReason};
pub use gateway::{
    EnrichmentGateway, FileGateway, HttpEnrichmentGateway, InMemoryGateway, Persistence,
    PersistenceGateway, SpeciesInfo,
};
pub use model::Record;
pub use mutation::{FailurePolicy, MutationExecutor, MutationOutcome, Notice, NoticeBoard, NoticeLevel};
pub use session::{
    GuardState, InteractionSignal, LoadReport, LogoutReason, Session, SessionBuilder,
    SessionStatus, ShiftState,
};
pub use store::{Collection, EntityStore};
pub use view::{Route, ViewState};
