// src/config/mod.rs
//! Application configuration.
//!
//! Resolution order:
//! 1) `$TATVAI_CONFIG_PATH` (must exist when set)
//! 2) `config/tatvai.toml`
//! 3) built-in defaults
//!
//! Environment overrides (`PORT`, `NEWS_API_KEY`, `OPENAI_API_KEY`, `RSS_FEEDS`,
//! `DATA_FILE`, `AGGREGATE_INTERVAL_SECS`, `TRANSLATE_URL`) are applied last.

pub mod ai;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::event::IdStrategy;
pub use ai::{AiConfig, TranslateConfig};

pub const ENV_CONFIG_PATH: &str = "TATVAI_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/tatvai.toml";

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.55;
pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const DEFAULT_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub port: u16,
    pub data_file: PathBuf,
    pub interval_secs: u64,
    pub fetch_timeout_secs: u64,
    pub similarity_threshold: f64,
    pub page_size: usize,
    pub id_strategy: IdStrategy,
    pub news_api: NewsApiConfig,
    pub feeds: FeedsConfig,
    pub ai: AiConfig,
    pub translate: TranslateConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            data_file: PathBuf::from("aggregated.json"),
            interval_secs: DEFAULT_INTERVAL_SECS,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            page_size: DEFAULT_PAGE_SIZE,
            id_strategy: IdStrategy::default(),
            news_api: NewsApiConfig::default(),
            feeds: FeedsConfig::default(),
            ai: AiConfig::default(),
            translate: TranslateConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NewsApiConfig {
    pub api_key: String,
    pub base_url: String,
    pub country: String,
    pub page_size: usize,
}

impl Default for NewsApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://newsapi.org".to_string(),
            country: "in".to_string(),
            page_size: 50,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedsConfig {
    pub urls: Vec<String>,
    /// Entries taken from the top of each feed.
    pub max_items: usize,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            urls: vec![
                "https://rss.cnn.com/rss/edition.rss".to_string(),
                "https://feeds.bbci.co.uk/news/rss.xml".to_string(),
                "https://www.thehindu.com/news/feeder/default.rss".to_string(),
                "https://timesofindia.indiatimes.com/rssfeedstopstories.cms".to_string(),
            ],
            max_items: 20,
        }
    }
}

impl AppConfig {
    /// Load using env var + fallbacks, then apply env overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from_file(&pb)?
        } else {
            let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default_p.exists() {
                Self::load_from_file(&default_p)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env();
        Ok(cfg.sanitized())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: AppConfig = toml::from_str(s)?;
        Ok(cfg.sanitized())
    }

    fn apply_env(&mut self) {
        if let Some(port) = env_parse::<u16>("PORT") {
            self.port = port;
        }
        if let Some(k) = env_nonempty("NEWS_API_KEY") {
            self.news_api.api_key = k;
        }
        if let Some(k) = env_nonempty("OPENAI_API_KEY") {
            self.ai.api_key = k;
        }
        if let Some(list) = env_nonempty("RSS_FEEDS") {
            self.feeds.urls = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(p) = env_nonempty("DATA_FILE") {
            self.data_file = PathBuf::from(p);
        }
        if let Some(secs) = env_parse::<u64>("AGGREGATE_INTERVAL_SECS") {
            self.interval_secs = secs;
        }
        if let Some(u) = env_nonempty("TRANSLATE_URL") {
            self.translate.url = u;
        }
    }

    /// Replace out-of-range values with defaults.
    fn sanitized(mut self) -> Self {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            self.similarity_threshold = DEFAULT_SIMILARITY_THRESHOLD;
        }
        if self.page_size == 0 {
            self.page_size = DEFAULT_PAGE_SIZE;
        }
        if self.interval_secs == 0 {
            self.interval_secs = DEFAULT_INTERVAL_SECS;
        }
        if self.fetch_timeout_secs == 0 {
            self.fetch_timeout_secs = DEFAULT_FETCH_TIMEOUT_SECS;
        }
        if self.feeds.max_items == 0 {
            self.feeds.max_items = FeedsConfig::default().max_items;
        }
        if self.news_api.page_size == 0 {
            self.news_api.page_size = NewsApiConfig::default().page_size;
        }
        self
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_nonempty(key).and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    const OVERRIDES: [&str; 7] = [
        "PORT",
        "NEWS_API_KEY",
        "OPENAI_API_KEY",
        "RSS_FEEDS",
        "DATA_FILE",
        "AGGREGATE_INTERVAL_SECS",
        "TRANSLATE_URL",
    ];

    fn clear_env() {
        env::remove_var(ENV_CONFIG_PATH);
        for k in OVERRIDES {
            env::remove_var(k);
        }
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = AppConfig::from_toml_str(
            r#"
            port = 5000
            [feeds]
            urls = ["https://a.example/rss"]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.port, 5000);
        assert_eq!(cfg.feeds.urls, vec!["https://a.example/rss".to_string()]);
        assert_eq!(cfg.feeds.max_items, 20);
        assert_eq!(cfg.page_size, 50);
        assert_eq!(cfg.id_strategy, IdStrategy::Random);
        assert_eq!(cfg.news_api.country, "in");
    }

    #[test]
    fn out_of_range_values_fall_back() {
        let cfg = AppConfig::from_toml_str(
            r#"
            similarity_threshold = 1.7
            page_size = 0
            interval_secs = 0
            id_strategy = "content-hash"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.similarity_threshold, DEFAULT_SIMILARITY_THRESHOLD);
        assert_eq!(cfg.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(cfg.interval_secs, DEFAULT_INTERVAL_SECS);
        assert_eq!(cfg.id_strategy, IdStrategy::ContentHash);
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        // Isolate CWD so a real config/ in the repo does not interfere
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        clear_env();

        // No files, no env -> defaults
        let cfg = AppConfig::load().unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.feeds.urls.len(), 4);

        // Explicit path wins, env overrides win over the file
        let p = tmp.path().join("custom.toml");
        fs::write(&p, "port = 9000\ninterval_secs = 60\n").unwrap();
        env::set_var(ENV_CONFIG_PATH, p.display().to_string());
        env::set_var("RSS_FEEDS", " https://x.example/rss , ,https://y.example/atom");
        env::set_var("PORT", "7070");
        let cfg = AppConfig::load().unwrap();
        assert_eq!(cfg.port, 7070);
        assert_eq!(cfg.interval_secs, 60);
        assert_eq!(
            cfg.feeds.urls,
            vec![
                "https://x.example/rss".to_string(),
                "https://y.example/atom".to_string()
            ]
        );

        // Missing explicit path is an error
        env::set_var(ENV_CONFIG_PATH, tmp.path().join("nope.toml").display().to_string());
        assert!(AppConfig::load().is_err());

        clear_env();
        env::set_current_dir(&old).unwrap();
    }
}
