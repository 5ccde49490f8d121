// src/config/ai.rs
use std::path::PathBuf;

use serde::Deserialize;

/// OpenAI-compatible chat completions. An empty `api_key` disables remote calls
/// and every request gets the deterministic fallback.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Remote calls allowed per UTC day; cache hits do not count.
    pub daily_limit: u32,
    /// Response cache directory; unset disables the cache.
    pub cache_dir: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 450,
            temperature: 0.2,
            daily_limit: 200,
            cache_dir: Some(PathBuf::from("cache/ai")),
            timeout_secs: 20,
        }
    }
}

impl AiConfig {
    pub fn enabled(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// LibreTranslate-compatible endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    /// Full URL of the `/translate` endpoint; empty disables remote calls.
    pub url: String,
    pub api_key: Option<String>,
    pub source_lang: String,
    pub timeout_secs: u64,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            url: "https://libretranslate.de/translate".to_string(),
            api_key: None,
            source_lang: "en".to_string(),
            timeout_secs: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ai_disabled_without_key() {
        let mut c = AiConfig::default();
        assert!(!c.enabled());
        c.api_key = "  ".into();
        assert!(!c.enabled());
        c.api_key = "sk-test".into();
        assert!(c.enabled());
    }
}
