// src/ingest/mod.rs
pub mod providers;
pub mod scheduler;
pub mod types;

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::FutureExt;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

use crate::ingest::types::{RawItem, SourceProvider};

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_items_total", "Raw items fetched from sources.");
        describe_counter!(
            "ingest_source_errors_total",
            "Source fetch/parse errors and timeouts."
        );
        describe_histogram!("ingest_fetch_ms", "Per-source fetch time in milliseconds.");
        describe_counter!("aggregate_runs_total", "Completed aggregation runs.");
        describe_counter!(
            "aggregate_skipped_total",
            "Runs skipped because another run was in flight."
        );
        describe_counter!(
            "aggregate_write_errors_total",
            "Snapshot writes that failed."
        );
        describe_counter!(
            "aggregate_panics_total",
            "Passes that panicked and were abandoned."
        );
        describe_gauge!("aggregate_events", "Events in the latest snapshot.");
        describe_gauge!(
            "aggregate_last_run_ts",
            "Unix ts when the aggregation pipeline last completed."
        );
    });
}

/// Plain-text snippet from feed markup: decode entities, strip tags,
/// normalize curly quotes, collapse whitespace, cap length.
pub fn clean_text(s: &str) -> String {
    // 1) Strip HTML tags (before decoding, so escaped `&lt;b&gt;` survives as text)
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)<[^>]+>").unwrap());
    let mut out = re_tags.replace_all(s, " ").to_string();

    // 2) HTML entity decode
    out = html_escape::decode_html_entities(&out).to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace (nbsp included)
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"[\s\u{00A0}]+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 5) Length cap: 1500 chars
    if out.chars().count() > 1500 {
        out = out.chars().take(1500).collect();
    }
    out
}

/// Clean an optional text field; blank results become `None`.
pub fn clean_opt(s: Option<&str>) -> Option<String> {
    s.map(clean_text).filter(|t| !t.is_empty())
}

/// Parse a feed/API timestamp. Accepts RFC 3339 and RFC 2822;
/// anything else is treated as unknown.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let odt = OffsetDateTime::parse(raw, &Rfc2822).ok()?;
    DateTime::<Utc>::from_timestamp(odt.unix_timestamp(), odt.nanosecond())
}

/// Items collected from one pass over all sources.
#[derive(Debug, Default)]
pub struct FetchReport {
    /// Items in source order, then in each source's own order.
    pub items: Vec<RawItem>,
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Fetch every source concurrently, each bounded by `timeout`.
/// A failing, panicking or slow source contributes nothing; the others are kept.
pub async fn fetch_all(providers: &[Box<dyn SourceProvider>], timeout: Duration) -> FetchReport {
    ensure_metrics_described();

    let calls = providers.iter().map(|p| async move {
        let t0 = Instant::now();
        let fetch = AssertUnwindSafe(p.fetch_latest()).catch_unwind();
        let res = tokio::time::timeout(timeout, fetch).await;
        histogram!("ingest_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        (p.name(), res)
    });

    let mut report = FetchReport::default();
    for (name, res) in futures::future::join_all(calls).await {
        match res {
            Ok(Ok(Ok(mut items))) => {
                tracing::debug!(target: "ingest", source = name, items = items.len(), "source fetched");
                counter!("ingest_items_total").increment(items.len() as u64);
                report.items.append(&mut items);
                report.succeeded.push(name.to_string());
            }
            Ok(Ok(Err(e))) => {
                tracing::warn!(target: "ingest", error = ?e, source = name, "source error");
                counter!("ingest_source_errors_total").increment(1);
                report.failed.push(name.to_string());
            }
            Ok(Err(payload)) => {
                tracing::error!(
                    target: "ingest",
                    source = name,
                    panic = panic_message(payload.as_ref()),
                    "source panicked"
                );
                counter!("ingest_source_errors_total").increment(1);
                report.failed.push(name.to_string());
            }
            Err(_) => {
                tracing::warn!(
                    target: "ingest",
                    source = name,
                    timeout_ms = timeout.as_millis() as u64,
                    "source timed out"
                );
                counter!("ingest_source_errors_total").increment(1);
                report.failed.push(name.to_string());
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn clean_text_strips_tags_and_entities() {
        let s = "  <p>Hello,&nbsp;&nbsp; <b>world</b>&amp; “friends”</p>  ";
        assert_eq!(clean_text(s), "Hello, world & \"friends\"");
    }

    #[test]
    fn clean_opt_drops_blank() {
        assert_eq!(clean_opt(Some("<br/>  ")), None);
        assert_eq!(clean_opt(None), None);
        assert_eq!(clean_opt(Some("a")), Some("a".to_string()));
    }

    #[test]
    fn parses_rfc3339_and_rfc2822() {
        let want = Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-05-01T10:30:00Z"), Some(want));
        assert_eq!(parse_timestamp("2024-05-01T16:00:00+05:30"), Some(want));
        assert_eq!(parse_timestamp("Wed, 01 May 2024 10:30:00 GMT"), Some(want));
        assert_eq!(parse_timestamp("Wed, 01 May 2024 16:00:00 +0530"), Some(want));
    }

    #[test]
    fn unparseable_timestamp_is_none() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday-ish"), None);
    }
}
