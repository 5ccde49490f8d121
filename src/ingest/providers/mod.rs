// src/ingest/providers/mod.rs
pub mod news_api;
pub mod rss_feed;

use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::AppConfig;
use crate::ingest::types::SourceProvider;
use news_api::NewsApiProvider;
use rss_feed::RssFeedProvider;

pub(crate) const USER_AGENT: &str = concat!("tatvai-backend/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client for source adapters; every call is bounded by `timeout`.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(timeout.min(Duration::from_secs(4)))
        .timeout(timeout)
        .build()
        .context("building source http client")
}

/// Providers in fetch order: the headline API first (when a key is set), then feeds
/// in configured order. Clustering is order-dependent, so this order matters.
pub fn build_providers(cfg: &AppConfig) -> Result<Vec<Box<dyn SourceProvider>>> {
    let client = http_client(cfg.fetch_timeout())?;
    let mut out: Vec<Box<dyn SourceProvider>> = Vec::new();

    if cfg.news_api.api_key.trim().is_empty() {
        tracing::info!(target: "ingest", "NEWS_API_KEY not set; headline API source disabled");
    } else {
        out.push(Box::new(NewsApiProvider::new(&cfg.news_api, client.clone())));
    }

    for url in cfg.feeds.urls.iter().map(|u| u.trim()).filter(|u| !u.is_empty()) {
        out.push(Box::new(RssFeedProvider::from_url(
            url,
            client.clone(),
            cfg.feeds.max_items,
        )));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headline_api_only_with_key() {
        let mut cfg = AppConfig::default();
        cfg.feeds.urls = vec!["https://a.example/rss".into(), "  ".into()];
        let names: Vec<String> = build_providers(&cfg)
            .unwrap()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, vec!["https://a.example/rss".to_string()]);

        cfg.news_api.api_key = "k".into();
        let names: Vec<String> = build_providers(&cfg)
            .unwrap()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, vec!["newsapi".to_string(), "https://a.example/rss".to_string()]);
    }
}
