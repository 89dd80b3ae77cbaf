#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sanctuary_sync::gateway::{EnrichmentGateway, InMemoryGateway, Persistence, SpeciesInfo};
use sanctuary_sync::model::{Animal, Record};
use sanctuary_sync::mutation::{MutationExecutor, NoticeBoard};
use sanctuary_sync::store::EntityStore;
use sanctuary_sync::{ManualClock, Result, SyncError};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
}

pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(fixed_now()))
}

pub fn roster(count: usize) -> Vec<Animal> {
    (0..count)
        .map(|i| Animal::with_id(format!("a{i}"), format!("Animal {i}"), format!("Species {i}")))
        .collect()
}

/// Executor over `gateway` with `records` present both remotely and locally
pub fn executor_with<T: Record>(gateway: &Arc<InMemoryGateway>, records: &[T]) -> MutationExecutor {
    gateway.seed(records);
    let store = EntityStore::new();
    store.replace_all(records.to_vec());
    let persistence = Persistence::new(gateway.clone());
    MutationExecutor::new(store, persistence, NoticeBoard::new())
}

/// Species lookup answering from a fixed table, with scriptable failures.
#[derive(Default)]
pub struct ScriptedLookup {
    table: HashMap<String, SpeciesInfo>,
    failing_calls: HashSet<usize>,
    delay: Option<Duration>,
    calls: Mutex<Vec<(Instant, Vec<String>)>>,
}

impl ScriptedLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, info: SpeciesInfo) -> Self {
        self.table.insert(name.to_string(), info);
        self
    }

    /// Fail the `index`-th call (zero based)
    pub fn failing_call(mut self, index: usize) -> Self {
        self.failing_calls.insert(index);
        self
    }

    /// Answer each call only after `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn call_instants(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(at, _)| *at).collect()
    }

    pub fn requested(&self, index: usize) -> Vec<String> {
        self.calls.lock().unwrap()[index].1.clone()
    }
}

#[async_trait]
impl EnrichmentGateway for ScriptedLookup {
    async fn batch_lookup(&self, names: &[String]) -> Result<HashMap<String, SpeciesInfo>> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((Instant::now(), names.to_vec()));
            calls.len() - 1
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing_calls.contains(&index) {
            return Err(SyncError::Enrichment(format!("scripted failure on call {index}")));
        }
        Ok(names
            .iter()
            .filter_map(|name| self.table.get(name).map(|info| (name.clone(), info.clone())))
            .collect())
    }
}
