// src/ai/mod.rs
//! Summaries, predictions and translation for the reading client.
//!
//! Every entry point returns an [`Outcome`]: a provider answer when one is
//! configured and healthy, otherwise a deterministic local fallback tagged with
//! the reason. Callers never see a provider error.

pub mod cache;
pub mod openai;
pub mod translate;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use metrics::counter;
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::clock::SharedClock;
use crate::config::AiConfig;
use crate::outcome::{FallbackReason, Outcome};
use cache::{DailyBudget, ResponseCache};
use openai::OpenAiProvider;

pub use translate::{LibreTranslateProvider, TranslateService, TranslationProvider};

/// Sentences kept by the extractive fallback.
pub const EXTRACTIVE_SENTENCES: usize = 3;

pub const CANNED_PREDICTIONS: &str = "• Stakeholders will watch developments\n\
• Further analysis and follow-ups will appear\n\
• Policy responses may follow";

/// What the client asked for. Anything other than `"predictions"` is a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryKind {
    Summary,
    Predictions,
}

impl SummaryKind {
    pub fn from_request(kind: Option<&str>) -> Self {
        match kind {
            Some("predictions") => SummaryKind::Predictions,
            _ => SummaryKind::Summary,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryKind::Summary => "summary",
            SummaryKind::Predictions => "predictions",
        }
    }

    pub fn prompt(&self, content: &str) -> String {
        match self {
            SummaryKind::Predictions => format!(
                "Make 3 concise predictions about likely next developments for the following news:\n\n{content}\n\nReturn as short bullet points."
            ),
            SummaryKind::Summary => {
                format!("Summarize the following article in 4-6 sentences:\n\n{content}")
            }
        }
    }
}

/// Low-level text completion. Separated so the caching/budget wrapper and the
/// fallback logic are shared between the real provider and test doubles.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
    fn name(&self) -> &'static str;
}

/// First `max_sentences` sentences of `text`. Text without sentence
/// punctuation is returned whole.
pub fn extractive_summary(text: &str, max_sentences: usize) -> String {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| Regex::new(r"[^.!?]+[.!?]+").unwrap());

    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }
    let sentences: Vec<&str> = re
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .take(max_sentences)
        .collect();
    if sentences.is_empty() {
        return text.to_string();
    }
    sentences.join(" ")
}

/// Deterministic local answer for `kind`.
pub fn fallback(kind: SummaryKind, content: &str) -> String {
    match kind {
        SummaryKind::Predictions => CANNED_PREDICTIONS.to_string(),
        SummaryKind::Summary => extractive_summary(content, EXTRACTIVE_SENTENCES),
    }
}

pub struct Summarizer {
    provider: Option<Arc<dyn CompletionProvider>>,
    cache: Option<ResponseCache>,
    budget: DailyBudget,
    clock: SharedClock,
}

impl Summarizer {
    /// No provider: every request gets the local fallback.
    pub fn disabled(clock: SharedClock) -> Self {
        Self {
            provider: None,
            cache: None,
            budget: DailyBudget::new(0),
            clock,
        }
    }

    pub fn new(provider: Arc<dyn CompletionProvider>, daily_limit: u32, clock: SharedClock) -> Self {
        Self {
            provider: Some(provider),
            cache: None,
            budget: DailyBudget::new(daily_limit),
            clock,
        }
    }

    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn from_config(cfg: &AiConfig, clock: SharedClock) -> Result<Self> {
        if !cfg.enabled() {
            tracing::info!(target: "ai", "OPENAI_API_KEY not set; summaries use local fallback");
            return Ok(Self::disabled(clock));
        }
        let provider = OpenAiProvider::new(cfg)?;
        let mut s = Self::new(Arc::new(provider), cfg.daily_limit, clock);
        if let Some(dir) = &cfg.cache_dir {
            s = s.with_cache(ResponseCache::new(dir.clone()));
        }
        Ok(s)
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.as_ref().map(|p| p.name()).unwrap_or("disabled")
    }

    fn degrade(&self, kind: SummaryKind, content: &str, reason: FallbackReason) -> Outcome<String> {
        counter!("ai_fallback_total", "kind" => kind.as_str(), "reason" => reason.as_str())
            .increment(1);
        Outcome::degraded(fallback(kind, content), reason)
    }

    pub async fn run(&self, content: &str, kind: SummaryKind) -> Outcome<String> {
        let Some(provider) = &self.provider else {
            return self.degrade(kind, content, FallbackReason::Disabled);
        };

        let key = ResponseCache::key(kind.as_str(), content);
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&key).await {
                tracing::debug!(target: "ai", kind = kind.as_str(), "cache hit");
                return Outcome::Fresh(hit);
            }
        }

        let today = self.clock.now().date_naive();
        if self.budget.exhausted(today) {
            tracing::warn!(target: "ai", limit = self.budget.limit(), "daily AI limit reached");
            return self.degrade(kind, content, FallbackReason::DailyLimit);
        }

        match provider.complete(&kind.prompt(content)).await {
            Ok(text) if !text.trim().is_empty() => {
                let text = text.trim().to_string();
                self.budget.record(today);
                if let Some(cache) = &self.cache {
                    if let Err(e) = cache.put(&key, &text).await {
                        tracing::warn!(target: "ai", error = %e, "ai cache write failed");
                    }
                }
                Outcome::Fresh(text)
            }
            Ok(_) => {
                self.budget.record(today);
                self.degrade(kind, content, FallbackReason::EmptyResponse)
            }
            Err(e) => {
                tracing::warn!(target: "ai", provider = provider.name(), error = ?e, "ai provider failed");
                self.degrade(kind, content, FallbackReason::ProviderError)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_defaults_to_summary() {
        assert_eq!(SummaryKind::from_request(None), SummaryKind::Summary);
        assert_eq!(SummaryKind::from_request(Some("nonsense")), SummaryKind::Summary);
        assert_eq!(
            SummaryKind::from_request(Some("predictions")),
            SummaryKind::Predictions
        );
    }

    #[test]
    fn extractive_takes_first_three_sentences() {
        let text = "One. Two! Three? Four. Five.";
        assert_eq!(extractive_summary(text, 3), "One. Two! Three?");
    }

    #[test]
    fn extractive_without_punctuation_returns_text() {
        assert_eq!(extractive_summary("  no full stop here ", 3), "no full stop here");
        assert_eq!(extractive_summary("", 3), "");
    }

    #[test]
    fn extractive_drops_unterminated_tail() {
        assert_eq!(extractive_summary("Done. trailing words", 3), "Done.");
    }

    #[test]
    fn prompts_embed_content() {
        assert!(SummaryKind::Summary.prompt("XYZ").contains("4-6 sentences:\n\nXYZ"));
        assert!(SummaryKind::Predictions
            .prompt("XYZ")
            .ends_with("XYZ\n\nReturn as short bullet points."));
    }
}
