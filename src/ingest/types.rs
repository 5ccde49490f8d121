// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};

/// Label used when an item carries no source name.
pub const UNKNOWN_SOURCE: &str = "unknown";

/// One fetched headline before grouping. Produced per run, dropped after clustering.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct RawItem {
    pub title: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub image: Option<String>,
    pub source: Option<String>, // publisher / feed title
    pub published_at: Option<DateTime<Utc>>,
}

impl RawItem {
    pub fn headline(title: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source: Some(source.into()),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, d: impl Into<String>) -> Self {
        self.description = Some(d.into());
        self
    }

    pub fn with_url(mut self, u: impl Into<String>) -> Self {
        self.url = Some(u.into());
        self
    }

    pub fn with_image(mut self, i: impl Into<String>) -> Self {
        self.image = Some(i.into());
        self
    }

    pub fn with_published_at(mut self, ts: DateTime<Utc>) -> Self {
        self.published_at = Some(ts);
        self
    }

    /// Source name, or `"unknown"` when missing/blank.
    pub fn source_label(&self) -> &str {
        match self.source.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s,
            _ => UNKNOWN_SOURCE,
        }
    }
}

#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<RawItem>>;
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_source_is_unknown() {
        let mut it = RawItem::headline("x", "  ");
        assert_eq!(it.source_label(), "unknown");
        it.source = None;
        assert_eq!(it.source_label(), "unknown");
        it.source = Some(" BBC News ".into());
        assert_eq!(it.source_label(), "BBC News");
    }
}
