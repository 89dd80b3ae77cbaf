use super::patch::{SpeciesPatch, find_species};
use super::watermark::{LAST_SYNC_KEY, SyncWatermark};
use crate::config::EnrichmentConfig;
use crate::core::{Clock, Result, SyncError};
use crate::gateway::EnrichmentGateway;
use crate::model::Animal;
use crate::mutation::{FailurePolicy, MutationExecutor, MutationOutcome, StateCell};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Why a run did not walk the animal collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The last completed run is younger than the cool-down.
    CoolingDown { last_run: DateTime<Utc> },
    /// Nothing to enrich. The watermark is left alone so that the first
    /// run after animals are added is not held back by the cool-down.
    NoAnimals,
    /// The watermark could not be read, so the cool-down cannot be honoured.
    WatermarkUnavailable(SyncError),
    /// The owning session was torn down mid-run.
    SessionClosed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentReport {
    /// Lookup calls issued
    pub batches: usize,
    /// Lookup calls that failed and were skipped
    pub failed_batches: usize,
    /// Animals with at least one changed field
    pub patched: usize,
    /// Result of the merge; `None` when nothing changed
    pub merge: Option<MutationOutcome>,
    pub completed_at: DateTime<Utc>,
    pub watermark_saved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentRun {
    Skipped(SkipReason),
    Completed(EnrichmentReport),
}

/// Throttled background job refreshing each animal's scientific name and
/// conservation status.
///
/// Batches go out strictly one after another with a fixed pause between
/// them. A failed batch is logged and skipped. All staged patches are merged
/// in one pass through the mutation executor, which keeps the merge even if
/// the bulk write fails. The watermark advances once per completed walk.
#[derive(Clone)]
pub struct EnrichmentScheduler {
    executor: MutationExecutor,
    gateway: Arc<dyn EnrichmentGateway>,
    clock: Arc<dyn Clock>,
    config: EnrichmentConfig,
}

struct Walk {
    patches: Vec<SpeciesPatch>,
    batches: usize,
    failed_batches: usize,
}

impl EnrichmentScheduler {
    pub fn new(
        executor: MutationExecutor,
        gateway: Arc<dyn EnrichmentGateway>,
        clock: Arc<dyn Clock>,
        config: EnrichmentConfig,
    ) -> Self {
        Self {
            executor,
            gateway,
            clock,
            config,
        }
    }

    pub async fn read_watermark(&self) -> Result<SyncWatermark> {
        let value = self
            .executor
            .persistence()
            .fetch_setting(LAST_SYNC_KEY, Value::Null)
            .await?;
        Ok(SyncWatermark::from_value(&value))
    }

    pub async fn run(&self) -> EnrichmentRun {
        let watermark = match self.read_watermark().await {
            Ok(watermark) => watermark,
            Err(err) => {
                warn!(error = %err, "cannot read enrichment watermark, skipping run");
                return EnrichmentRun::Skipped(SkipReason::WatermarkUnavailable(err));
            }
        };

        let now = self.clock.now();
        if watermark.is_fresh(now, self.config.cooldown()) {
            if let Some(last_run) = watermark.last_run() {
                debug!(%last_run, "enrichment cooling down");
                return EnrichmentRun::Skipped(SkipReason::CoolingDown { last_run });
            }
        }

        let animals = self.executor.store().get::<Animal>();
        if animals.is_empty() {
            debug!("no animals to enrich");
            return EnrichmentRun::Skipped(SkipReason::NoAnimals);
        }

        let Some(walk) = self.walk(&animals).await else {
            return EnrichmentRun::Skipped(SkipReason::SessionClosed);
        };

        let patched = walk.patches.len();
        let merge = if walk.patches.is_empty() {
            None
        } else {
            Some(self.merge(walk.patches).await)
        };

        if self.executor.store().is_closed() {
            debug!("session closed before the watermark was saved");
            return EnrichmentRun::Skipped(SkipReason::SessionClosed);
        }

        let completed_at = self.clock.now();
        let watermark_saved = self.advance_watermark(completed_at).await;
        info!(
            batches = walk.batches,
            failed = walk.failed_batches,
            patched,
            "species enrichment finished"
        );

        EnrichmentRun::Completed(EnrichmentReport {
            batches: walk.batches,
            failed_batches: walk.failed_batches,
            patched,
            merge,
            completed_at,
            watermark_saved,
        })
    }

    /// Look up every batch in order, pausing between calls. Returns `None`
    /// if the session closes mid-walk.
    async fn walk(&self, animals: &[Animal]) -> Option<Walk> {
        let batch_size = self.config.batch_size.max(1);
        let mut walk = Walk {
            patches: Vec::new(),
            batches: 0,
            failed_batches: 0,
        };

        for (index, batch) in animals.chunks(batch_size).enumerate() {
            if index > 0 {
                tokio::time::sleep(self.config.pacing_delay()).await;
            }
            if self.executor.store().is_closed() {
                debug!(batch = index, "session closed, abandoning enrichment");
                return None;
            }

            let names = species_names(batch);
            walk.batches += 1;
            match self.gateway.batch_lookup(&names).await {
                Ok(found) => {
                    walk.patches.extend(batch.iter().filter_map(|animal| {
                        find_species(&found, &animal.species)
                            .and_then(|info| SpeciesPatch::diff(animal, info))
                    }));
                }
                Err(err) => {
                    walk.failed_batches += 1;
                    warn!(batch = index, error = %err, "species lookup failed, skipping batch");
                }
            }
        }
        Some(walk)
    }

    async fn merge(&self, patches: Vec<SpeciesPatch>) -> MutationOutcome {
        let store = self.executor.store().clone();
        let persistence = self.executor.persistence().clone();
        let detached = StateCell::new(());
        self.executor
            .execute_with::<Animal, (), _, _, _>(
                "merge species enrichment",
                &detached,
                move |collection, _| {
                    // animals deleted during the walk are skipped
                    for patch in &patches {
                        collection.update(&patch.animal_id, |animal| patch.apply(animal));
                    }
                },
                move || async move {
                    let animals: Vec<Animal> = store.snapshot::<Animal>().iter().cloned().collect();
                    persistence.save_bulk(&animals).await
                },
                FailurePolicy::KeepLocal,
            )
            .await
    }

    async fn advance_watermark(&self, completed_at: DateTime<Utc>) -> bool {
        let value = SyncWatermark::at(completed_at).to_value();
        match self
            .executor
            .persistence()
            .save_setting(LAST_SYNC_KEY, value)
            .await
        {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "failed to persist enrichment watermark");
                false
            }
        }
    }
}

/// Distinct, non-blank species names of one batch, in order
fn species_names(batch: &[Animal]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(batch.len());
    for animal in batch {
        let name = animal.species.trim();
        if !name.is_empty() && !names.iter().any(|seen| seen == name) {
            names.push(name.to_string());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_species_names_dedup_and_skip_blank() {
        let batch = vec![
            Animal::with_id("a1", "Hoot", "Barn Owl"),
            Animal::with_id("a2", "Screech", "Barn Owl"),
            Animal::with_id("a3", "Nobody", "  "),
            Animal::with_id("a4", "Kes", "Kestrel"),
        ];
        assert_eq!(species_names(&batch), vec!["Barn Owl", "Kestrel"]);
    }
}
