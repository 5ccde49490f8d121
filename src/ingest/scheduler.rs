// src/ingest/scheduler.rs
//! Interval driver for the aggregation pipeline.
//!
//! The first pass runs immediately on `start`, then once per interval. Ticks
//! that fall due while a pass is still running are skipped rather than queued.
//! Ticks use tokio time, so tests can drive the loop on a paused clock.
//! A pass that panics is logged and abandoned; the loop keeps ticking.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use metrics::counter;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::ingest::panic_message;
use crate::pipeline::{Aggregator, RunOutcome};

#[derive(Clone, Copy, Debug)]
pub struct SchedulerCfg {
    pub interval: Duration,
}

pub struct Scheduler {
    aggregator: Arc<Aggregator>,
    cfg: SchedulerCfg,
}

/// Handle to a running scheduler. Dropping it does not stop the loop; call [`stop`](Self::stop).
pub struct SchedulerHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<u64>,
}

impl Scheduler {
    pub fn new(aggregator: Arc<Aggregator>, cfg: SchedulerCfg) -> Self {
        Self { aggregator, cfg }
    }

    pub fn start(self) -> SchedulerHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let Scheduler { aggregator, cfg } = self;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(cfg.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut passes = 0u64;

            loop {
                tokio::select! {
                    biased;
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {}
                }

                tracing::info!(target: "scheduler", "running scheduled aggregation");
                match AssertUnwindSafe(aggregator.run_once()).catch_unwind().await {
                    Ok(RunOutcome::Completed(report)) => {
                        passes += 1;
                        if !report.failed_sources.is_empty() {
                            tracing::warn!(
                                target: "scheduler",
                                failed = ?report.failed_sources,
                                "some sources failed this pass"
                            );
                        }
                    }
                    Ok(RunOutcome::Skipped) => {
                        counter!("scheduler_overlap_total").increment(1);
                    }
                    Err(payload) => {
                        tracing::error!(
                            target: "scheduler",
                            panic = panic_message(payload.as_ref()),
                            "aggregation pass panicked; previous snapshot stays live"
                        );
                        counter!("aggregate_panics_total").increment(1);
                    }
                }
            }
            tracing::info!(target: "scheduler", passes, "scheduler stopped");
            passes
        });

        SchedulerHandle { stop_tx, task }
    }
}

impl SchedulerHandle {
    /// Stop ticking. An in-flight pass is allowed to finish first.
    /// Returns the number of completed passes.
    pub async fn stop(self) -> u64 {
        let _ = self.stop_tx.send(true);
        match self.task.await {
            Ok(n) => n,
            Err(e) => {
                tracing::error!(target: "scheduler", error = %e, "scheduler task ended abnormally");
                0
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
