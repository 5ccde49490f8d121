//! Headline aggregation service: binary entrypoint.
//! Loads config, starts the aggregation scheduler and serves the read API.
use std::sync::Arc;

use anyhow::Context;
use tatvai_backend::clock::{SharedClock, SystemClock};
use tatvai_backend::ingest::providers::build_providers;
use tatvai_backend::ingest::scheduler::{Scheduler, SchedulerCfg};
use tatvai_backend::metrics::Metrics;
use tatvai_backend::{logging, router, Aggregator, AppConfig, AppState};
use tracing::info;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler failed; shutting down");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    logging::init_tracing();

    let cfg = AppConfig::load().context("loading configuration")?;
    let metrics = Metrics::init()?;
    let clock: SharedClock = Arc::new(SystemClock);

    // --- Aggregation worker: runs now, then every interval ---
    let providers = build_providers(&cfg)?;
    info!(
        sources = providers.len(),
        interval_secs = cfg.interval_secs,
        data_file = %cfg.data_file.display(),
        "starting aggregation scheduler"
    );
    let aggregator = Arc::new(Aggregator::from_config(&cfg, providers).with_clock(clock.clone()));
    let scheduler = Scheduler::new(
        aggregator,
        SchedulerCfg {
            interval: cfg.interval(),
        },
    )
    .start();

    // --- Read API ---
    let state = AppState::from_config(&cfg, clock)?;
    let app = router(state).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", cfg.port))
        .await
        .with_context(|| format!("binding port {}", cfg.port))?;
    info!(port = cfg.port, "backend listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server")?;

    let passes = scheduler.stop().await;
    info!(passes, "shutdown complete");
    Ok(())
}
