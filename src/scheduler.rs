use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time::MissedTickBehavior;

use crate::cache::SnapshotCache;
use crate::config::{EmptyResultPolicy, SchedulerConfig};
use crate::extract::ExtractPipeline;
use crate::fetcher::StockFetcher;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RefreshStatus {
    /// The cache was replaced with freshly extracted data.
    Updated,
    /// Extraction found nothing and the prior record was kept.
    Retained,
    /// A cycle was already in flight; nothing was done.
    Busy,
    /// Fetch or extraction failed; the prior record was kept.
    Failed,
}

/// Result of one fetch + extract + replace cycle, also served by the
/// refresh endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshOutcome {
    pub status: RefreshStatus,
    pub fetched_at: Option<DateTime<Utc>>,
    pub items: usize,
    pub error: Option<String>,
}

/// Drives refresh cycles: one immediately on startup, then one per interval,
/// plus on-demand cycles from the API. The cycle mutex guarantees at most one
/// fetch + extract + replace is in flight system-wide; periodic ticks wait on
/// it while [`RefreshScheduler::refresh_now`] rejects with a busy outcome.
pub struct RefreshScheduler {
    fetcher: Arc<dyn StockFetcher>,
    pipeline: ExtractPipeline,
    cache: Arc<SnapshotCache>,
    config: SchedulerConfig,
    cycle_lock: Mutex<()>,
}

impl RefreshScheduler {
    pub fn new(
        fetcher: Arc<dyn StockFetcher>,
        cache: Arc<SnapshotCache>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            fetcher,
            pipeline: ExtractPipeline::new(),
            cache,
            config,
            cycle_lock: Mutex::new(()),
        }
    }

    /// Periodic loop. The first tick fires immediately; shutdown stops new
    /// cycles and lets an in-flight one finish.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker =
            tokio::time::interval(Duration::from_secs(self.config.refresh_interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            interval_secs = self.config.refresh_interval_secs,
            "refresh scheduler started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let _guard = self.cycle_lock.lock().await;
                    let outcome = self.run_cycle().await;
                    tracing::debug!(status = ?outcome.status, items = outcome.items, "scheduled cycle finished");
                }
                _ = shutdown.changed() => {
                    tracing::info!("refresh scheduler stopping");
                    break;
                }
            }
        }
    }

    /// Out-of-band cycle. If a cycle is already running this returns
    /// [`RefreshStatus::Busy`] immediately instead of waiting for it.
    pub async fn refresh_now(&self) -> RefreshOutcome {
        match self.cycle_lock.try_lock() {
            Ok(_guard) => self.run_cycle().await,
            Err(_) => {
                tracing::debug!("refresh requested while a cycle is in flight");
                RefreshOutcome {
                    status: RefreshStatus::Busy,
                    fetched_at: self.cache.read().await.fetched_at,
                    items: 0,
                    error: None,
                }
            }
        }
    }

    /// One fetch + extract + replace attempt. Callers must hold the cycle
    /// lock. Failures leave the cache untouched; prior data stays
    /// authoritative until a fetch succeeds.
    async fn run_cycle(&self) -> RefreshOutcome {
        let document = match self.fetcher.fetch().await {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(error = %e, "fetch failed; keeping prior snapshot");
                return self.failed_outcome(e.to_string()).await;
            }
        };

        let extraction = match self.pipeline.extract(&document) {
            Ok(extraction) => extraction,
            Err(e) => {
                tracing::error!(error = %e, "extraction failed; keeping prior snapshot");
                return self.failed_outcome(e.to_string()).await;
            }
        };

        // Retention keys off stock items alone; a weather-only page must not
        // wipe a populated snapshot.
        if extraction.snapshot.total_items() == 0
            && self.config.empty_result_policy == EmptyResultPolicy::Retain
        {
            let prior = self.cache.read().await;
            tracing::warn!("extraction yielded no items; retaining prior snapshot");
            return RefreshOutcome {
                status: RefreshStatus::Retained,
                fetched_at: prior.fetched_at,
                items: prior.snapshot.total_items(),
                error: None,
            };
        }

        let items = extraction.total_items();
        self.cache
            .replace(extraction.snapshot, extraction.weather)
            .await;
        let fetched_at = self.cache.read().await.fetched_at;

        tracing::info!(items, "stock snapshot updated");
        RefreshOutcome {
            status: RefreshStatus::Updated,
            fetched_at,
            items,
            error: None,
        }
    }

    async fn failed_outcome(&self, error: String) -> RefreshOutcome {
        RefreshOutcome {
            status: RefreshStatus::Failed,
            fetched_at: self.cache.read().await.fetched_at,
            items: 0,
            error: Some(error),
        }
    }
}
