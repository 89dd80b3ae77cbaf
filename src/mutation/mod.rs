// ============================================================================
// Mutation Executor
// ============================================================================
//
// Makes remote-affecting actions look atomic to the UI:
//   1. snapshot the target collection (and any secondary UI state)
//   2. apply optimistically
//   3. persist
//   4. on failure, restore the snapshot and raise a notice
//
// ============================================================================

pub mod executor;
pub mod handlers;
pub mod notice;
pub mod state;

pub use executor::{FailurePolicy, MutationExecutor, MutationOutcome};
pub use notice::{Notice, NoticeBoard, NoticeLevel};
pub use state::StateCell;
