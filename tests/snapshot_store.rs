// tests/snapshot_store.rs
//
// Snapshot persistence as seen by readers.

use chrono::{TimeZone, Utc};

use tatvai_backend::query::QueryService;
use tatvai_backend::{Event, FallbackReason, Snapshot, SnapshotStore};

fn ev(title: &str, verified: usize) -> Event {
    Event {
        id: title.to_string(),
        title: title.to_string(),
        snippet: String::new(),
        image: None,
        url: None,
        sources: (0..verified).map(|i| format!("S{i}")).collect(),
        verified_count: verified,
        published_at: Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap(),
    }
}

#[tokio::test]
async fn missing_and_corrupt_files_read_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path().join("aggregated.json"));

    let missing = store.read().await;
    assert_eq!(missing.reason(), Some(FallbackReason::SnapshotMissing));
    assert_eq!(missing.value(), &Snapshot::empty());
    assert!(store.load().await.unwrap().is_none());

    std::fs::write(store.path(), "[1, 2").unwrap();
    let corrupt = store.read().await;
    assert_eq!(corrupt.reason(), Some(FallbackReason::SnapshotCorrupt));
    assert_eq!(corrupt.into_value(), Snapshot::empty());
    assert!(store.load().await.is_err());
}

#[tokio::test]
async fn snapshot_without_events_key_loads() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path().join("aggregated.json"));
    std::fs::write(store.path(), r#"{"updatedAt":"2024-05-06T12:00:00Z"}"#).unwrap();
    let snap = store.read().await;
    assert!(snap.is_fresh());
    assert!(snap.value().events.is_empty());
}

#[tokio::test]
async fn each_write_replaces_the_whole_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path().join("aggregated.json"));
    let query = QueryService::new(store.clone(), 2);

    store
        .write(&Snapshot {
            updated_at: Some(Utc.with_ymd_and_hms(2024, 5, 6, 12, 0, 0).unwrap()),
            events: vec![ev("one", 1), ev("two", 3), ev("three", 2)],
        })
        .await
        .unwrap();
    let page = query.list(None).await.into_value();
    let titles: Vec<&str> = page.events.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["two", "three"]);

    let later = Utc.with_ymd_and_hms(2024, 5, 6, 12, 5, 0).unwrap();
    store
        .write(&Snapshot {
            updated_at: Some(later),
            events: vec![ev("four", 1)],
        })
        .await
        .unwrap();
    let page = query.list(None).await.into_value();
    assert_eq!(page.updated_at, Some(later));
    assert_eq!(page.events.len(), 1);
    assert_eq!(page.events[0].title, "four");

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(leftovers.len(), 1);
}
