// ============================================================================
// Entity Store
// ============================================================================
//
// Session-scoped in-memory mirror of the persistence gateway, one slot per
// collection. Mutated only through the mutation executor (user actions) and
// the enrichment merge.
//
// ============================================================================

pub mod collection;
pub mod entity_store;

pub use collection::Collection;
pub use entity_store::{Collections, EntityStore};
