// src/ingest/providers/news_api.rs
//! Headline API adapter (NewsAPI `top-headlines`).

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::config::NewsApiConfig;
use crate::ingest::types::{RawItem, SourceProvider};
use crate::ingest::{clean_opt, parse_timestamp};

#[derive(Debug, Deserialize)]
struct Resp {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Article {
    source: Option<ArticleSource>,
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    url: Option<String>,
    url_to_image: Option<String>,
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArticleSource {
    name: Option<String>,
}

pub struct NewsApiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    country: String,
    page_size: usize,
}

impl NewsApiProvider {
    pub fn new(cfg: &NewsApiConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
            country: cfg.country.clone(),
            page_size: cfg.page_size.max(1),
        }
    }

    /// Map a `top-headlines` body into raw items, at most `cap` of them.
    pub fn parse_articles(body: &str, cap: usize) -> Result<Vec<RawItem>> {
        let resp: Resp = serde_json::from_str(body).context("parsing headline api json")?;
        let out = resp
            .articles
            .into_iter()
            .filter_map(|a| {
                let title = a.title.as_deref().map(str::trim).unwrap_or_default();
                if title.is_empty() {
                    return None;
                }
                Some(RawItem {
                    title: title.to_string(),
                    description: clean_opt(a.description.as_deref())
                        .or_else(|| clean_opt(a.content.as_deref())),
                    url: a.url.filter(|u| !u.is_empty()),
                    image: a.url_to_image.filter(|u| !u.is_empty()),
                    source: a.source.and_then(|s| s.name),
                    published_at: a.published_at.as_deref().and_then(parse_timestamp),
                })
            })
            .take(cap)
            .collect();
        Ok(out)
    }
}

#[async_trait]
impl SourceProvider for NewsApiProvider {
    async fn fetch_latest(&self) -> Result<Vec<RawItem>> {
        let page_size = self.page_size.to_string();
        let body = self
            .client
            .get(format!("{}/v2/top-headlines", self.base_url))
            .query(&[
                ("country", self.country.as_str()),
                ("pageSize", page_size.as_str()),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await
            .context("headline api get()")?
            .error_for_status()
            .context("headline api status")?
            .text()
            .await
            .context("headline api .text()")?;
        Self::parse_articles(&body, self.page_size)
    }

    fn name(&self) -> &str {
        "newsapi"
    }
}
