// tests/metrics.rs
//
// Prometheus exposition after one aggregation pass. The recorder is global, so
// this file installs it once and keeps everything in a single test.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use tatvai_backend::metrics::Metrics;
use tatvai_backend::{Aggregator, RawItem, SnapshotStore, SourceProvider};

struct Ok2;

#[async_trait]
impl SourceProvider for Ok2 {
    async fn fetch_latest(&self) -> Result<Vec<RawItem>> {
        Ok(vec![
            RawItem::headline("Rain in Delhi", "A"),
            RawItem::headline("Rain in Delhi today", "B"),
        ])
    }
    fn name(&self) -> &str {
        "ok"
    }
}

struct Down;

#[async_trait]
impl SourceProvider for Down {
    async fn fetch_latest(&self) -> Result<Vec<RawItem>> {
        Err(anyhow!("dns failure"))
    }
    fn name(&self) -> &str {
        "down"
    }
}

#[tokio::test]
async fn metrics_endpoint_exposes_pipeline_series() {
    let metrics = Metrics::init().expect("install recorder");
    let dir = tempfile::tempdir().unwrap();
    let agg = Aggregator::new(
        vec![Box::new(Ok2), Box::new(Down)],
        SnapshotStore::new(dir.path().join("aggregated.json")),
    );
    agg.run_once().await;

    let resp = metrics
        .router()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    // axum::body::to_bytes requires an explicit limit
    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();

    for needle in [
        "ingest_items_total 2",
        "ingest_source_errors_total 1",
        "aggregate_runs_total 1",
        "aggregate_events 1",
        "aggregate_last_run_ts",
        "ingest_fetch_ms",
    ] {
        assert!(
            text.contains(needle),
            "metrics exposition missing '{needle}'\n{text}"
        );
    }
}
