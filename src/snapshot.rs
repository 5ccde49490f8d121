// src/snapshot.rs
//! The persisted aggregation result: one JSON file, replaced wholesale.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;

use crate::event::Event;
use crate::outcome::{FallbackReason, Outcome};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub events: Vec<Event>,
}

impl Snapshot {
    /// `{ updatedAt: null, events: [] }`
    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("snapshot at {path} is not valid: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// File-backed snapshot store.
///
/// Writes go to a sibling temp file which is then renamed over the target, so a
/// reader sees either the old or the new snapshot, never a partial one.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "snapshot.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    pub async fn write(&self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        let io_err = |source| SnapshotError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).await.map_err(io_err)?;
        }
        let json = serde_json::to_vec_pretty(snapshot).map_err(|source| SnapshotError::Parse {
            path: self.path.clone(),
            source,
        })?;
        let tmp = self.tmp_path();
        fs::write(&tmp, json).await.map_err(io_err)?;
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(io_err(e));
        }
        Ok(())
    }

    /// Strict read: `Ok(None)` when no snapshot exists yet.
    pub async fn load(&self) -> Result<Option<Snapshot>, SnapshotError> {
        let bytes = match fs::read(&self.path).await {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SnapshotError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| SnapshotError::Parse {
                path: self.path.clone(),
                source,
            })
    }

    /// Never fails: a missing or unreadable snapshot reads as empty, with the reason attached.
    pub async fn read(&self) -> Outcome<Snapshot> {
        match self.load().await {
            Ok(Some(s)) => Outcome::Fresh(s),
            Ok(None) => Outcome::degraded(Snapshot::empty(), FallbackReason::SnapshotMissing),
            Err(e) => {
                tracing::warn!(error = %e, "snapshot unreadable; serving empty");
                Outcome::degraded(Snapshot::empty(), FallbackReason::SnapshotCorrupt)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tmp_file_is_a_sibling() {
        let s = SnapshotStore::new("data/aggregated.json");
        assert_eq!(s.tmp_path(), PathBuf::from("data/aggregated.json.tmp"));
    }

    #[tokio::test]
    async fn failed_rename_cleans_up_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.json");
        // A non-empty directory at the target path makes the rename fail.
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), b"x").unwrap();

        let store = SnapshotStore::new(&target);
        let err = store.write(&Snapshot::empty()).await.unwrap_err();
        assert!(matches!(err, SnapshotError::Io { .. }));
        assert!(!store.tmp_path().exists());
        assert!(target.join("keep").exists());
    }

    #[tokio::test]
    async fn write_creates_parent_dirs_and_leaves_no_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("nested/out.json"));
        let snap = Snapshot {
            updated_at: DateTime::from_timestamp(1_714_557_600, 0),
            events: vec![],
        };
        store.write(&snap).await.unwrap();
        assert!(store.path().exists());
        assert!(!store.tmp_path().exists());
        assert_eq!(store.load().await.unwrap(), Some(snap));
    }

    #[test]
    fn empty_snapshot_json_shape() {
        let v = serde_json::to_value(Snapshot::empty()).unwrap();
        assert_eq!(v, serde_json::json!({ "updatedAt": null, "events": [] }));
    }
}
