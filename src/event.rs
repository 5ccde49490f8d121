// src/event.rs
//! Client-facing events synthesized from clusters.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::cluster::Cluster;
use crate::normalize::normalize;

const SLUG_CHARS: usize = 40;
const SUFFIX_LEN: usize = 6;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// A deduplicated story. Built once per run, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    pub snippet: String,
    pub image: Option<String>,
    pub url: Option<String>,
    pub sources: Vec<String>,
    /// Always `sources.len()`.
    pub verified_count: usize,
    pub published_at: DateTime<Utc>,
}

/// How event ids are derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdStrategy {
    /// Title slug plus a random suffix; a new id every run.
    #[default]
    Random,
    /// Title slug plus a hash of the normalized title and source set; stable across runs.
    ContentHash,
}

/// First 40 characters of the normalized title, whitespace turned into dashes.
pub fn slug(title: &str) -> String {
    let head: String = normalize(title).chars().take(SLUG_CHARS).collect();
    head.split(char::is_whitespace)
        .collect::<Vec<_>>()
        .join("-")
}

fn random_suffix() -> String {
    let mut rng = rand::rng();
    (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect()
}

fn content_suffix(title: &str, sources: &[String]) -> String {
    let mut sorted: Vec<&str> = sources.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    let mut hasher = Sha256::new();
    hasher.update(normalize(title).as_bytes());
    for s in sorted {
        hasher.update(b"\n");
        hasher.update(s.as_bytes());
    }
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

pub fn make_id(strategy: IdStrategy, title: &str, sources: &[String]) -> String {
    let suffix = match strategy {
        IdStrategy::Random => random_suffix(),
        IdStrategy::ContentHash => content_suffix(title, sources),
    };
    format!("{}-{}", slug(title), suffix)
}

/// Turn clusters into events, preserving formation order.
///
/// Title and snippet come from the seed item; url, image and publishedAt come
/// from the cluster's most recent member. Events without any known publication
/// time are stamped with `now`.
pub fn synthesize(clusters: &[Cluster<'_>], now: DateTime<Utc>, ids: IdStrategy) -> Vec<Event> {
    clusters
        .iter()
        .map(|c| {
            let seed = c.seed();
            let sources = c.sources().to_vec();
            Event {
                id: make_id(ids, &seed.title, &sources),
                title: seed.title.clone(),
                snippet: seed.description.clone().unwrap_or_default(),
                image: c.image().map(str::to_string),
                url: c.url().map(str::to_string),
                verified_count: sources.len(),
                sources,
                published_at: c.published_at().unwrap_or(now),
            }
        })
        .collect()
}
