// ============================================================================
// Background Enrichment
// ============================================================================
//
// Keeps derived taxonomy (scientific name, conservation status) fresh without
// blocking interactive use, gated by a persisted watermark so the third-party
// lookup service is called at most once per cool-down window.
//
// ============================================================================

pub mod patch;
pub mod scheduler;
pub mod watermark;

pub use patch::SpeciesPatch;
pub use scheduler::{EnrichmentReport, EnrichmentRun, EnrichmentScheduler, SkipReason};
pub use watermark::{LAST_SYNC_KEY, SyncWatermark};
