// src/ai/cache.rs
//! File cache for provider answers and the per-day call budget.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;

#[derive(Debug, Serialize, Deserialize)]
struct CachedResult {
    result: String,
}

/// One JSON file per answer, named by a hash of (kind, content).
#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
}

impl ResponseCache {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn key(kind: &str, content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(kind.as_bytes());
        hasher.update(b"\n");
        hasher.update(content.as_bytes());
        let digest = hasher.finalize();
        let mut out = String::with_capacity(32);
        for b in digest.iter().take(16) {
            use std::fmt::Write as _;
            let _ = write!(&mut out, "{:02x}", b);
        }
        out
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let s = fs::read_to_string(self.path(key)).await.ok()?;
        serde_json::from_str::<CachedResult>(&s).ok().map(|c| c.result)
    }

    pub async fn put(&self, key: &str, result: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir).await?;
        let path = self.path(key);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec(&CachedResult {
            result: result.to_string(),
        })
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(&tmp, json).await?;
        fs::rename(tmp, path).await
    }
}

#[derive(Debug)]
struct DailyCounter {
    day: Option<NaiveDate>,
    count: u32,
}

/// Remote calls allowed per UTC day. Resets when the day changes.
#[derive(Debug)]
pub struct DailyBudget {
    limit: u32,
    counter: Mutex<DailyCounter>,
}

impl DailyBudget {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            counter: Mutex::new(DailyCounter {
                day: None,
                count: 0,
            }),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    fn with_counter<T>(&self, today: NaiveDate, f: impl FnOnce(&mut DailyCounter) -> T) -> T {
        let mut g = self.counter.lock().unwrap_or_else(|e| e.into_inner());
        if g.day != Some(today) {
            g.day = Some(today);
            g.count = 0;
        }
        f(&mut g)
    }

    pub fn exhausted(&self, today: NaiveDate) -> bool {
        self.with_counter(today, |c| c.count >= self.limit)
    }

    pub fn record(&self, today: NaiveDate) {
        self.with_counter(today, |c| c.count = c.count.saturating_add(1));
    }

    pub fn used(&self, today: NaiveDate) -> u32 {
        self.with_counter(today, |c| c.count)
    }
}
