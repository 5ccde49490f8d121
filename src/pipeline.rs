// src/pipeline.rs
//! One aggregation pass: fetch → cluster → synthesize → persist.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, gauge};

use crate::clock::{SharedClock, SystemClock};
use crate::cluster::cluster_items;
use crate::config::{AppConfig, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_SIMILARITY_THRESHOLD};
use crate::event::{synthesize, IdStrategy};
use crate::ingest::{self, types::SourceProvider};
use crate::snapshot::{Snapshot, SnapshotStore};

/// Summary of a completed pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub items: usize,
    pub events: usize,
    pub failed_sources: Vec<String>,
    /// False when the snapshot write failed; the previous snapshot stays live.
    pub persisted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(RunReport),
    /// Another pass was already in flight.
    Skipped,
}

/// Owns the sources and the snapshot store. At most one pass runs at a time.
pub struct Aggregator {
    providers: Vec<Box<dyn SourceProvider>>,
    store: SnapshotStore,
    clock: SharedClock,
    fetch_timeout: Duration,
    threshold: f64,
    ids: IdStrategy,
    running: AtomicBool,
}

/// Clears the in-flight flag when a pass ends, however it ends.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Aggregator {
    pub fn new(providers: Vec<Box<dyn SourceProvider>>, store: SnapshotStore) -> Self {
        Self {
            providers,
            store,
            clock: Arc::new(SystemClock),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
            ids: IdStrategy::default(),
            running: AtomicBool::new(false),
        }
    }

    pub fn from_config(cfg: &AppConfig, providers: Vec<Box<dyn SourceProvider>>) -> Self {
        Self::new(providers, SnapshotStore::new(&cfg.data_file))
            .with_fetch_timeout(cfg.fetch_timeout())
            .with_threshold(cfg.similarity_threshold)
            .with_id_strategy(cfg.id_strategy)
    }

    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_id_strategy(mut self, ids: IdStrategy) -> Self {
        self.ids = ids;
        self
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn try_begin(&self) -> Option<RunGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard(&self.running))
    }

    /// Run one pass. Never fails: source errors shrink the input, a failed write
    /// leaves the previous snapshot authoritative.
    pub async fn run_once(&self) -> RunOutcome {
        ingest::ensure_metrics_described();

        let Some(_guard) = self.try_begin() else {
            tracing::warn!(target: "pipeline", "aggregation already in flight; skipping");
            counter!("aggregate_skipped_total").increment(1);
            return RunOutcome::Skipped;
        };

        let fetched = ingest::fetch_all(&self.providers, self.fetch_timeout).await;
        let now = self.clock.now();

        let clusters = cluster_items(&fetched.items, self.threshold);
        let events = synthesize(&clusters, now, self.ids);
        let report_events = events.len();

        let snapshot = Snapshot {
            updated_at: Some(now),
            events,
        };
        let persisted = match self.store.write(&snapshot).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(target: "pipeline", error = %e, "snapshot write failed; keeping previous snapshot");
                counter!("aggregate_write_errors_total").increment(1);
                false
            }
        };

        counter!("aggregate_runs_total").increment(1);
        if persisted {
            gauge!("aggregate_events").set(report_events as f64);
            gauge!("aggregate_last_run_ts").set(now.timestamp() as f64);
        }

        tracing::info!(
            target: "pipeline",
            items = fetched.items.len(),
            events = report_events,
            failed = fetched.failed.len(),
            persisted,
            "aggregated"
        );

        RunOutcome::Completed(RunReport {
            items: fetched.items.len(),
            events: report_events,
            failed_sources: fetched.failed,
            persisted,
        })
    }
}
