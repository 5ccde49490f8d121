// src/query.rs
//! Read side: filter and rank events from the latest snapshot.

use std::cmp::Ordering;

use crate::event::Event;
use crate::outcome::Outcome;
use crate::snapshot::{Snapshot, SnapshotStore};

/// Does `title + " " + snippet` contain `needle` (already lower-cased)?
fn matches(ev: &Event, needle: &str) -> bool {
    format!("{} {}", ev.title, ev.snippet)
        .to_lowercase()
        .contains(needle)
}

/// Most corroborated first, then most recent. Stable for full ties.
fn rank_order(a: &Event, b: &Event) -> Ordering {
    b.verified_count
        .cmp(&a.verified_count)
        .then_with(|| b.published_at.cmp(&a.published_at))
}

/// Filter (case-insensitive substring; empty filter keeps all), sort, truncate.
pub fn rank(events: Vec<Event>, filter: Option<&str>, page_size: usize) -> Vec<Event> {
    let needle = filter.unwrap_or_default().to_lowercase();
    let mut out: Vec<Event> = if needle.is_empty() {
        events
    } else {
        events.into_iter().filter(|e| matches(e, &needle)).collect()
    };
    out.sort_by(rank_order);
    out.truncate(page_size);
    out
}

#[derive(Debug, Clone)]
pub struct QueryService {
    store: SnapshotStore,
    page_size: usize,
}

impl QueryService {
    pub fn new(store: SnapshotStore, page_size: usize) -> Self {
        Self {
            store,
            page_size: page_size.max(1),
        }
    }

    /// Reads the snapshot on every call; never blocks on the pipeline.
    pub async fn list(&self, filter: Option<&str>) -> Outcome<Snapshot> {
        self.store.read().await.map(|snap| Snapshot {
            updated_at: snap.updated_at,
            events: rank(snap.events, filter, self.page_size),
        })
    }
}
