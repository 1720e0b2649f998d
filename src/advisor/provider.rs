use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::AdvisorConfig;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: Vec<RequestPart>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ImageUrl {
    pub url: String,
}

impl ChatRequest {
    /// Single user message: the prompt, plus the image as its own part when given.
    pub fn user_prompt(
        model: &str,
        prompt: String,
        image_url: Option<&str>,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        let mut content = vec![RequestPart::Text { text: prompt }];
        if let Some(url) = image_url.filter(|u| !u.is_empty()) {
            content.push(RequestPart::ImageUrl {
                image_url: ImageUrl { url: url.to_string() },
            });
        }
        Self {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".into(),
                content,
            }],
            max_tokens,
            temperature,
        }
    }

    pub fn with_model(&self, model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..self.clone()
        }
    }

    pub fn has_image_part(&self) -> bool {
        self.messages
            .iter()
            .flat_map(|m| m.content.iter())
            .any(|p| matches!(p, RequestPart::ImageUrl { .. }))
    }
}

/// Raw provider answer. Error statuses are returned, not raised.
#[derive(Debug, Clone)]
pub struct ProviderReply {
    pub status: u16,
    pub body: Value,
}

impl ProviderReply {
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }
}

#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// `Err` means the call never produced an HTTP response.
    async fn chat_completion(&self, request: &ChatRequest) -> anyhow::Result<ProviderReply>;
}

/// OpenAI-compatible `/chat/completions` endpoint (OpenRouter by default).
pub struct OpenRouterClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenRouterClient {
    pub fn new(cfg: &AdvisorConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("build chat-completion http client")?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
        })
    }
}

#[async_trait]
impl ChatProvider for OpenRouterClient {
    async fn chat_completion(&self, request: &ChatRequest) -> anyhow::Result<ProviderReply> {
        let api_key = self
            .api_key
            .as_deref()
            .context("OPENROUTER_API_KEY is not configured")?;

        debug!(model = %request.model, image_part = request.has_image_part(), "calling chat provider");
        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .context("chat completion request")?;

        let status = resp.status().as_u16();
        let text = resp.text().await.context("read chat completion body")?;
        let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));
        Ok(ProviderReply { status, body })
    }
}
