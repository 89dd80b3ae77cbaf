// ============================================================================
// Gateways
// ============================================================================
//
// External service boundaries. The persistence gateway speaks untyped JSON per
// collection so that transports stay object-safe; `Persistence` is the typed
// facade the rest of the crate uses. Every call may fail independently.
//
// ============================================================================

pub mod enrichment;
pub mod file;
pub mod memory;

pub use enrichment::{EnrichmentGateway, HttpEnrichmentGateway, SpeciesInfo};
pub use file::FileGateway;
pub use memory::{GatewayOp, InMemoryGateway};

use crate::core::{CollectionKind, Result};
use crate::model::Record;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::warn;

#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    async fn fetch(&self, kind: CollectionKind) -> Result<Vec<Value>>;

    async fn save(&self, kind: CollectionKind, record: Value) -> Result<()>;

    async fn delete(&self, kind: CollectionKind, id: &str) -> Result<()>;

    async fn save_bulk(&self, kind: CollectionKind, records: Vec<Value>) -> Result<()>;

    async fn fetch_setting(&self, key: &str, default: Value) -> Result<Value>;

    async fn save_setting(&self, key: &str, value: Value) -> Result<()>;
}

/// Typed access to a [`PersistenceGateway`].
///
/// Persisted entries that fail to decode are held back verbatim per
/// collection. Bulk writes carry them along so that replacing a collection
/// never drops data this client cannot read.
#[derive(Clone)]
pub struct Persistence {
    gateway: Arc<dyn PersistenceGateway>,
    undecodable: Arc<Mutex<HashMap<CollectionKind, Vec<Value>>>>,
}

impl Persistence {
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self {
            gateway,
            undecodable: Arc::default(),
        }
    }

    /// Fetch every record of `T`. Entries that do not decode are skipped with
    /// a warning and kept aside for later bulk writes.
    pub async fn fetch<T: Record>(&self) -> Result<Vec<T>> {
        let raw = self.gateway.fetch(T::KIND).await?;
        let mut records = Vec::with_capacity(raw.len());
        let mut skipped = Vec::new();
        for value in raw {
            match serde_json::from_value::<T>(value.clone()) {
                Ok(record) => records.push(record),
                Err(err) => {
                    warn!(collection = %T::KIND, id = ?record_id(&value), error = %err, "skipping undecodable record");
                    skipped.push(value);
                }
            }
        }
        {
            let mut held = lock(&self.undecodable);
            if skipped.is_empty() {
                held.remove(&T::KIND);
            } else {
                held.insert(T::KIND, skipped);
            }
        }
        Ok(records)
    }

    pub async fn save<T: Record>(&self, record: &T) -> Result<()> {
        let value = serde_json::to_value(record)?;
        self.gateway.save(T::KIND, value).await?;
        self.release(T::KIND, record.id());
        Ok(())
    }

    pub async fn delete<T: Record>(&self, id: &str) -> Result<()> {
        self.gateway.delete(T::KIND, id).await?;
        self.release(T::KIND, id);
        Ok(())
    }

    /// Replace the persisted collection with `records` plus any held-back
    /// entries whose id is not among them.
    pub async fn save_bulk<T: Record>(&self, records: &[T]) -> Result<()> {
        let mut values = records
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let carried: Vec<Value> = lock(&self.undecodable)
            .get(&T::KIND)
            .map(|held| {
                held.iter()
                    .filter(|value| {
                        record_id(value).map_or(true, |id| records.iter().all(|record| record.id() != id))
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if !carried.is_empty() {
            warn!(collection = %T::KIND, count = carried.len(), "carrying undecodable records through bulk write");
        }
        values.extend(carried);
        self.gateway.save_bulk(T::KIND, values).await
    }

    /// Entries of `kind` that did not decode on the last fetch
    pub fn undecodable(&self, kind: CollectionKind) -> Vec<Value> {
        lock(&self.undecodable).get(&kind).cloned().unwrap_or_default()
    }

    pub async fn fetch_setting(&self, key: &str, default: Value) -> Result<Value> {
        self.gateway.fetch_setting(key, default).await
    }

    pub async fn save_setting(&self, key: &str, value: Value) -> Result<()> {
        self.gateway.save_setting(key, value).await
    }

    /// A typed write superseded the held-back entry with this id
    fn release(&self, kind: CollectionKind, id: &str) {
        if let Some(held) = lock(&self.undecodable).get_mut(&kind) {
            held.retain(|value| record_id(value) != Some(id));
        }
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Id field of an untyped record, as gateways see it
pub(crate) fn record_id(value: &Value) -> Option<&str> {
    value.get("id").and_then(Value::as_str)
}

/// Insert `record` into `records`, replacing any entry with the same id
pub(crate) fn upsert_value(records: &mut Vec<Value>, record: Value) {
    let id = record_id(&record).map(str::to_owned);
    match id.and_then(|id| records.iter().position(|existing| record_id(existing) == Some(id.as_str()))) {
        Some(index) => records[index] = record,
        None => records.push(record),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Animal;
    use serde_json::json;

    #[test]
    fn test_upsert_value_replaces_by_id() {
        let mut records = vec![json!({"id": "a", "n": 1}), json!({"id": "b", "n": 2})];
        upsert_value(&mut records, json!({"id": "a", "n": 3}));
        upsert_value(&mut records, json!({"id": "c", "n": 4}));
        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["n"], 3);
        assert_eq!(records[2]["id"], "c");
    }

    #[tokio::test]
    async fn test_bulk_write_carries_undecodable_entries() {
        let gateway = Arc::new(InMemoryGateway::new());
        gateway.seed_values(
            CollectionKind::Animals,
            vec![
                json!({"id": "a1", "name": "Hoot", "species": "Barn Owl"}),
                json!({"id": "a2", "name": null, "species": "Kestrel"}),
                json!({"id": "a3", "name": null, "species": "Merlin"}),
            ],
        );
        let persistence = Persistence::new(gateway.clone());

        let animals: Vec<Animal> = persistence.fetch().await.unwrap();
        assert_eq!(animals.len(), 1);
        assert_eq!(persistence.undecodable(CollectionKind::Animals).len(), 2);

        persistence.delete::<Animal>("a3").await.unwrap();
        persistence.save_bulk(&animals).await.unwrap();

        let ids: Vec<_> = gateway
            .values(CollectionKind::Animals)
            .iter()
            .filter_map(|value| record_id(value).map(str::to_owned))
            .collect();
        assert_eq!(ids, vec!["a1", "a2"]);
    }

    #[tokio::test]
    async fn test_typed_save_supersedes_undecodable_entry() {
        let gateway = Arc::new(InMemoryGateway::new());
        gateway.seed_values(
            CollectionKind::Animals,
            vec![json!({"id": "a2", "name": null, "species": "Kestrel"})],
        );
        let persistence = Persistence::new(gateway.clone());
        let _: Vec<Animal> = persistence.fetch().await.unwrap();

        let fixed = Animal::with_id("a2", "Kes", "Kestrel");
        persistence.save(&fixed).await.unwrap();
        persistence.save_bulk(&[fixed.clone()]).await.unwrap();

        assert!(persistence.undecodable(CollectionKind::Animals).is_empty());
        assert_eq!(gateway.records::<Animal>(), vec![fixed]);
    }
}
