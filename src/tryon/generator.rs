use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bytes::Bytes;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::TryOnConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: Bytes,
}

/// What the model sent back; either part may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Generated {
    pub image: Option<InlineImage>,
    pub text: Option<String>,
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, images: &[InlineImage]) -> anyhow::Result<Generated>;
}

/// Gemini `generateContent` with text and image output.
pub struct GeminiGenerator {
    http: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiGenerator {
    pub fn new(cfg: &TryOnConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("build image generator http client")?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            model: cfg.model.trim().to_string(),
            api_key: cfg.api_key.clone(),
        })
    }

    fn endpoint(&self) -> String {
        let model_path = if self.model.starts_with("models/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        };
        format!("{}/{}:generateContent", self.base_url, model_path)
    }
}

pub(crate) fn build_payload(prompt: &str, images: &[InlineImage]) -> Value {
    let mut parts = vec![json!({ "text": prompt })];
    for img in images {
        parts.push(json!({
            "inline_data": {
                "mime_type": img.mime_type,
                "data": BASE64.encode(&img.data),
            }
        }));
    }
    json!({
        "contents": [{ "role": "user", "parts": parts }],
        "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] },
    })
}

/// Reads the first candidate; later parts of the same kind win.
pub(crate) fn parse_generated(body: &Value) -> anyhow::Result<Generated> {
    let parts = body
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut out = Generated::default();
    for part in parts {
        let inline = part.get("inlineData").or_else(|| part.get("inline_data"));
        if let Some(inline) = inline {
            let data = inline.get("data").and_then(Value::as_str).unwrap_or_default();
            if data.is_empty() {
                continue;
            }
            let bytes = BASE64
                .decode(data.as_bytes())
                .context("generated image base64 decode failed")?;
            let mime_type = inline
                .get("mimeType")
                .or_else(|| inline.get("mime_type"))
                .and_then(Value::as_str)
                .unwrap_or("image/png")
                .to_string();
            out.image = Some(InlineImage {
                mime_type,
                data: Bytes::from(bytes),
            });
        } else if let Some(text) = part.get("text").and_then(Value::as_str) {
            if !text.is_empty() {
                out.text = Some(text.to_string());
            }
        }
    }
    Ok(out)
}

#[async_trait]
impl ImageGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str, images: &[InlineImage]) -> anyhow::Result<Generated> {
        let api_key = self
            .api_key
            .as_deref()
            .context("GEMINI_API_KEY is not configured")?;

        debug!(model = %self.model, images = images.len(), "calling image generator");
        let resp = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&build_payload(prompt, images))
            .send()
            .await
            .context("image generation request")?;

        let status = resp.status();
        let text = resp.text().await.context("read image generation body")?;
        if !status.is_success() {
            warn!(%status, "image generator returned an error");
            anyhow::bail!("image generator returned {}: {}", status, text);
        }
        let body: Value =
            serde_json::from_str(&text).context("decode image generation response")?;
        parse_generated(&body)
    }
}
