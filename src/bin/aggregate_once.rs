//! Run a single aggregation pass, write the snapshot and exit.
//! Handy under cron when the API runs elsewhere.

use anyhow::Context;
use tatvai_backend::ingest::providers::build_providers;
use tatvai_backend::{logging, Aggregator, AppConfig, RunOutcome};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    logging::init_tracing();

    let cfg = AppConfig::load().context("loading configuration")?;
    let aggregator = Aggregator::from_config(&cfg, build_providers(&cfg)?);

    match aggregator.run_once().await {
        RunOutcome::Completed(report) => {
            println!(
                "aggregated {} items into {} events ({} sources failed) -> {}",
                report.items,
                report.events,
                report.failed_sources.len(),
                aggregator.store().path().display()
            );
            if !report.persisted {
                anyhow::bail!("snapshot was not written");
            }
        }
        RunOutcome::Skipped => println!("another aggregation is in flight; nothing done"),
    }
    Ok(())
}
