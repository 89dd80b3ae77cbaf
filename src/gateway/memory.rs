use super::{PersistenceGateway, lock, record_id, upsert_value};
use crate::core::{CollectionKind, Result, SyncError};
use crate::model::Record;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOp {
    Fetch,
    Save,
    Delete,
    SaveBulk,
    FetchSetting,
    SaveSetting,
}

/// Process-local persistence gateway.
///
/// Serves demos and tests: failures can be injected per operation (and
/// optionally per collection), every call is counted, and an artificial
/// latency keeps calls in flight long enough to observe optimistic state.
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    collections: Mutex<HashMap<CollectionKind, Vec<Value>>>,
    settings: Mutex<HashMap<String, Value>>,
    failures: Mutex<HashSet<(GatewayOp, Option<CollectionKind>)>>,
    calls: Mutex<Vec<(GatewayOp, Option<CollectionKind>)>>,
    latency: Option<Duration>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Preload records of `T`
    pub fn seed<T: Record>(&self, records: &[T]) {
        let values = records
            .iter()
            .filter_map(|record| serde_json::to_value(record).ok())
            .collect();
        lock(&self.collections).insert(T::KIND, values);
    }

    /// Preload raw entries of `kind`, decodable or not
    pub fn seed_values(&self, kind: CollectionKind, values: Vec<Value>) {
        lock(&self.collections).insert(kind, values);
    }

    pub fn seed_setting(&self, key: &str, value: Value) {
        lock(&self.settings).insert(key.to_string(), value);
    }

    /// Records of `T` as currently persisted
    pub fn records<T: Record>(&self) -> Vec<T> {
        lock(&self.collections)
            .get(&T::KIND)
            .map(|values| {
                values
                    .iter()
                    .filter_map(|value| serde_json::from_value(value.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Raw entries of `kind` as currently persisted
    pub fn values(&self, kind: CollectionKind) -> Vec<Value> {
        lock(&self.collections).get(&kind).cloned().unwrap_or_default()
    }

    pub fn setting(&self, key: &str) -> Option<Value> {
        lock(&self.settings).get(key).cloned()
    }

    /// Make `op` fail until [`heal`](Self::heal). `None` matches every collection.
    pub fn fail(&self, op: GatewayOp, kind: Option<CollectionKind>) {
        lock(&self.failures).insert((op, kind));
    }

    pub fn heal(&self) {
        lock(&self.failures).clear();
    }

    pub fn calls(&self, op: GatewayOp) -> usize {
        lock(&self.calls).iter().filter(|(called, _)| *called == op).count()
    }

    pub fn calls_for(&self, op: GatewayOp, kind: CollectionKind) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|(called, called_kind)| *called == op && *called_kind == Some(kind))
            .count()
    }

    async fn enter(&self, op: GatewayOp, kind: Option<CollectionKind>) -> Result<()> {
        lock(&self.calls).push((op, kind));
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let failing = {
            let failures = lock(&self.failures);
            failures.contains(&(op, None)) || (kind.is_some() && failures.contains(&(op, kind)))
        };
        if failing {
            let target = kind.map(|k| k.as_str()).unwrap_or("settings");
            return Err(SyncError::Gateway(format!(
                "injected {:?} failure for '{}'",
                op, target
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryGateway {
    async fn fetch(&self, kind: CollectionKind) -> Result<Vec<Value>> {
        self.enter(GatewayOp::Fetch, Some(kind)).await?;
        Ok(lock(&self.collections).get(&kind).cloned().unwrap_or_default())
    }

    async fn save(&self, kind: CollectionKind, record: Value) -> Result<()> {
        self.enter(GatewayOp::Save, Some(kind)).await?;
        upsert_value(lock(&self.collections).entry(kind).or_default(), record);
        Ok(())
    }

    async fn delete(&self, kind: CollectionKind, id: &str) -> Result<()> {
        self.enter(GatewayOp::Delete, Some(kind)).await?;
        if let Some(records) = lock(&self.collections).get_mut(&kind) {
            records.retain(|record| record_id(record) != Some(id));
        }
        Ok(())
    }

    async fn save_bulk(&self, kind: CollectionKind, records: Vec<Value>) -> Result<()> {
        self.enter(GatewayOp::SaveBulk, Some(kind)).await?;
        lock(&self.collections).insert(kind, records);
        Ok(())
    }

    async fn fetch_setting(&self, key: &str, default: Value) -> Result<Value> {
        self.enter(GatewayOp::FetchSetting, None).await?;
        Ok(lock(&self.settings).get(key).cloned().unwrap_or(default))
    }

    async fn save_setting(&self, key: &str, value: Value) -> Result<()> {
        self.enter(GatewayOp::SaveSetting, None).await?;
        lock(&self.settings).insert(key.to_string(), value);
        Ok(())
    }
}
