// src/ai/openai.rs
//! OpenAI-compatible chat completions provider.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::CompletionProvider;
use crate::config::AiConfig;

pub struct OpenAiProvider {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct Resp {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMsg>,
    /// Legacy completions shape.
    text: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    content: Option<String>,
}

impl OpenAiProvider {
    pub fn new(cfg: &AiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(crate::ingest::providers::USER_AGENT)
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .build()
            .context("building ai http client")?;
        Ok(Self {
            http,
            endpoint: format!("{}/v1/chat/completions", cfg.base_url.trim_end_matches('/')),
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            max_tokens: cfg.max_tokens,
            temperature: cfg.temperature,
        })
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let req = Req {
            model: &self.model,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("chat completions post()")?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("chat completions returned {status}"));
        }
        let body: Resp = resp.json().await.context("chat completions json")?;
        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.and_then(|m| m.content).or(c.text))
            .unwrap_or_default();
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
