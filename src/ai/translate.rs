// src/ai/translate.rs
//! Translation proxy. On any failure the input text is echoed back.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use metrics::counter;
use serde::{Deserialize, Serialize};

use crate::config::TranslateConfig;
use crate::outcome::{FallbackReason, Outcome};

#[async_trait]
pub trait TranslationProvider: Send + Sync {
    async fn translate(&self, text: &str, target: &str) -> Result<String>;
    fn name(&self) -> &'static str;
}

/// LibreTranslate `/translate` endpoint.
pub struct LibreTranslateProvider {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
    source_lang: String,
}

#[derive(Serialize)]
struct Req<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Resp {
    translated_text: Option<String>,
}

impl LibreTranslateProvider {
    pub fn new(cfg: &TranslateConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(crate::ingest::providers::USER_AGENT)
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .build()
            .context("building translate http client")?;
        Ok(Self {
            http,
            url: cfg.url.clone(),
            api_key: cfg.api_key.clone().filter(|k| !k.is_empty()),
            source_lang: cfg.source_lang.clone(),
        })
    }
}

#[async_trait]
impl TranslationProvider for LibreTranslateProvider {
    async fn translate(&self, text: &str, target: &str) -> Result<String> {
        let req = Req {
            q: text,
            source: &self.source_lang,
            target,
            format: "text",
            api_key: self.api_key.as_deref(),
        };
        let resp = self
            .http
            .post(&self.url)
            .json(&req)
            .send()
            .await
            .context("translate post()")?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("translate returned {status}"));
        }
        let body: Resp = resp.json().await.context("translate json")?;
        Ok(body.translated_text.unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "libretranslate"
    }
}

pub struct TranslateService {
    provider: Option<Arc<dyn TranslationProvider>>,
}

impl TranslateService {
    pub fn new(provider: Arc<dyn TranslationProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    pub fn disabled() -> Self {
        Self { provider: None }
    }

    pub fn from_config(cfg: &TranslateConfig) -> Result<Self> {
        if cfg.url.trim().is_empty() {
            tracing::info!(target: "ai", "translate url not set; translation echoes input");
            return Ok(Self::disabled());
        }
        Ok(Self::new(Arc::new(LibreTranslateProvider::new(cfg)?)))
    }

    fn echo(text: &str, reason: FallbackReason) -> Outcome<String> {
        counter!("translate_fallback_total", "reason" => reason.as_str()).increment(1);
        Outcome::degraded(text.to_string(), reason)
    }

    pub async fn translate(&self, text: &str, target: &str) -> Outcome<String> {
        let Some(provider) = &self.provider else {
            return Self::echo(text, FallbackReason::Disabled);
        };
        match provider.translate(text, target).await {
            Ok(t) if !t.trim().is_empty() => Outcome::Fresh(t),
            Ok(_) => Self::echo(text, FallbackReason::EmptyResponse),
            Err(e) => {
                tracing::warn!(target: "ai", provider = provider.name(), error = ?e, "translation failed");
                Self::echo(text, FallbackReason::ProviderError)
            }
        }
    }
}
