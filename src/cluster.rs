// src/cluster.rs
//! Near-duplicate grouping of raw headlines.
//!
//! Greedy single pass in fetch order: each unconsumed item seeds a cluster and
//! absorbs every later unconsumed item whose normalized title scores at or above
//! the threshold against the seed. Consumed items are never revisited, so the
//! assignment depends on input order. There is no transitive closure: two
//! members of a cluster may score below the threshold against each other.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::ingest::types::RawItem;
use crate::normalize::normalize;

/// Sørensen-Dice coefficient over character bigrams of the two keys,
/// whitespace ignored. 1.0 for identical keys, 0.0 for no overlap. Symmetric.
pub fn similarity(a: &str, b: &str) -> f64 {
    // strsim divides by byte length, which is only the bigram count for ASCII.
    if a.is_ascii() && b.is_ascii() {
        return strsim::sorensen_dice(a, b);
    }
    char_dice(a, b)
}

fn char_dice(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().filter(|c| !c.is_whitespace()).collect();
    let b: Vec<char> = b.chars().filter(|c| !c.is_whitespace()).collect();
    if a == b {
        return 1.0;
    }
    if a.len() < 2 || b.len() < 2 {
        return 0.0;
    }

    let mut counts: HashMap<(char, char), usize> = HashMap::new();
    for w in a.windows(2) {
        *counts.entry((w[0], w[1])).or_default() += 1;
    }
    let mut shared = 0usize;
    for w in b.windows(2) {
        if let Some(n) = counts.get_mut(&(w[0], w[1])) {
            if *n > 0 {
                *n -= 1;
                shared += 1;
            }
        }
    }
    (2 * shared) as f64 / (a.len() + b.len() - 2) as f64
}

/// Working group for one run. Borrows its members from the fetched batch.
#[derive(Debug, Clone)]
pub struct Cluster<'a> {
    members: Vec<&'a RawItem>,
    sources: Vec<String>,
    url: Option<String>,
    image: Option<String>,
    published_at: Option<DateTime<Utc>>,
}

impl<'a> Cluster<'a> {
    fn seeded(item: &'a RawItem) -> Self {
        Self {
            members: vec![item],
            sources: vec![item.source_label().to_string()],
            url: item.url.clone(),
            image: item.image.clone(),
            published_at: item.published_at,
        }
    }

    /// Add a member. When it was published strictly later than the cluster's
    /// current time (or the cluster has none), it becomes the representative
    /// for publishedAt, and for url/image where it has them.
    fn fold(&mut self, item: &'a RawItem) {
        self.members.push(item);
        let label = item.source_label();
        if !self.sources.iter().any(|s| s == label) {
            self.sources.push(label.to_string());
        }
        if let Some(ts) = item.published_at {
            if self.published_at.map_or(true, |cur| ts > cur) {
                self.published_at = Some(ts);
                if item.url.is_some() {
                    self.url = item.url.clone();
                }
                if item.image.is_some() {
                    self.image = item.image.clone();
                }
            }
        }
    }

    /// The item that opened the cluster.
    pub fn seed(&self) -> &'a RawItem {
        self.members[0]
    }

    pub fn members(&self) -> &[&'a RawItem] {
        &self.members
    }

    /// Distinct source labels in first-seen order.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.published_at
    }
}

/// Group `items` into clusters, in order of formation.
pub fn cluster_items(items: &[RawItem], threshold: f64) -> Vec<Cluster<'_>> {
    let keys: Vec<String> = items.iter().map(|it| normalize(&it.title)).collect();
    let mut used = vec![false; items.len()];
    let mut clusters = Vec::new();

    for i in 0..items.len() {
        if used[i] {
            continue;
        }
        used[i] = true;
        let mut cluster = Cluster::seeded(&items[i]);

        for j in (i + 1)..items.len() {
            if used[j] {
                continue;
            }
            if similarity(&keys[i], &keys[j]) >= threshold {
                used[j] = true;
                cluster.fold(&items[j]);
            }
        }
        clusters.push(cluster);
    }
    clusters
}
