use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use crate::config::ChatbotConfig;

#[derive(thiserror::Error, Debug)]
pub enum GenerationError {
    #[error("generative API key is not configured")]
    NotConfigured,
    #[error("http error: {0}")]
    Http(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("rate limited")]
    RateLimited,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// A text-generation backend for the chatbot.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce a reply to `prompt` following the `system` instruction.
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, GenerationError>;
}

/// Client for a Gemini-style `models/{model}:generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiGenerator {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl GeminiGenerator {
    pub fn new(client: reqwest::Client, config: &ChatbotConfig) -> Self {
        Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, GenerationError> {
        if self.api_key.is_empty() {
            return Err(GenerationError::NotConfigured);
        }

        let url = format!("{}/models/{}:generateContent", self.api_base, self.model);
        let body = serde_json::json!({
            "systemInstruction": { "parts": [{ "text": system }] },
            "contents": [
                { "role": "user", "parts": [{ "text": prompt }] }
            ]
        });

        let resp = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Http(e.to_string()))?;

        match resp.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(GenerationError::Unauthorized);
            }
            StatusCode::TOO_MANY_REQUESTS => return Err(GenerationError::RateLimited),
            _ => {}
        }

        let status = resp.status();
        let raw = resp
            .text()
            .await
            .map_err(|e| GenerationError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(GenerationError::Http(format!("{} {}", status.as_u16(), raw)));
        }

        extract_text(&raw)
    }
}

/// Pull `candidates[0].content.parts[*].text` out of a response body.
fn extract_text(raw: &str) -> Result<String, GenerationError> {
    let v: Value = serde_json::from_str(raw)
        .map_err(|e| GenerationError::InvalidResponse(format!("json parse failed: {e}")))?;

    let parts = v
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .ok_or_else(|| GenerationError::InvalidResponse("missing candidates[0]".into()))?;

    let text = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("\n");

    let text = text.trim();
    if text.is_empty() {
        return Err(GenerationError::InvalidResponse("empty reply".into()));
    }
    Ok(text.to_string())
}
