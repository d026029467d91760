//! Generation backend trait and the remote chat-completion backend.
//!
//! Backends:
//!   GroqBackend  — Groq (or any OpenAI-compatible) chat completions
//!   LocalBackend — seq2seq model on the local inference pool (see local.rs)

use std::time::{Duration, Instant};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use tutor_common::confidence::REMOTE_CONFIDENCE;
use tutor_common::Candidate;
use tutor_config::RemoteConfig;
use tutor_models::ModelError;

use crate::prompts::{PromptStyle, ShapedPrompt};

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    #[error("Rate limit exceeded")]
    RateLimitExceeded,
    #[error("API error [{status}]: {message}")]
    ApiError { status: u16, message: String },
    #[error("Response contained no choices")]
    EmptyResponse,
    #[error("Local model error: {0}")]
    Local(#[from] ModelError),
}

// ── Request / Response ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatCompletion {
    pub content: String,
    pub model: String,
    pub usage: TokenUsage,
}

// ── Trait ─────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Short provider name reported to clients.
    fn name(&self) -> &str;
    fn is_local(&self) -> bool;
    fn prompt_style(&self) -> PromptStyle;

    /// Produce candidates, best first.
    async fn generate(&self, prompt: &ShapedPrompt) -> Result<Vec<Candidate>, LlmError>;
}

// ── Helper: parse OpenAI-style response ──────────────────────────────────────

/// Extract the first choice. A body without choices is an error.
pub fn parse_chat_completion(json: &serde_json::Value, fallback_model: &str) -> Result<ChatCompletion, LlmError> {
    let content = json["choices"]
        .as_array()
        .and_then(|choices| choices.first())
        .ok_or(LlmError::EmptyResponse)?["message"]["content"]
        .as_str()
        .unwrap_or("")
        .to_string();

    Ok(ChatCompletion {
        content,
        model: json["model"].as_str().unwrap_or(fallback_model).to_string(),
        usage: TokenUsage {
            prompt_tokens:     json["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32,
            completion_tokens: json["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32,
        },
    })
}

async fn check_response_status(resp: reqwest::Response) -> Result<serde_json::Value, LlmError> {
    let status = resp.status().as_u16();
    let text = resp.text().await?;
    if status == 429 {
        return Err(LlmError::RateLimitExceeded);
    }
    if status >= 400 {
        let message = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|body| {
                body["error"]["message"]
                    .as_str()
                    .or_else(|| body["message"].as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| {
                let snippet: String = text.chars().take(200).collect();
                if snippet.is_empty() { "unknown API error".to_string() } else { snippet }
            });
        return Err(LlmError::ApiError { status, message });
    }
    Ok(serde_json::from_str(&text)?)
}

// ── Groq (OpenAI-compatible) ──────────────────────────────────────────────────

pub struct GroqBackend {
    pub base_url: String,
    pub model: String,
    pub top_p: f32,
    api_key: SecretString,
    client: reqwest::Client,
}

impl std::fmt::Debug for GroqBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqBackend")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GroqBackend {
    /// Build the HTTP client. Fails only if the TLS backend cannot initialize.
    pub fn new(api_key: SecretString, config: &RemoteConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            top_p: config.top_p,
            api_key,
            client,
        })
    }

    /// Single chat-completion call with one user message.
    pub async fn complete(&self, prompt: &str, max_tokens: u32, temperature: f32) -> Result<ChatCompletion, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "model":       &self.model,
            "messages":    [Message { role: "user".to_string(), content: prompt.to_string() }],
            "max_tokens":  max_tokens,
            "temperature": temperature,
            "top_p":       self.top_p,
        });

        info!(model = %self.model, max_tokens, temperature, "Remote completion request");
        let resp = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;
        let json = check_response_status(resp).await?;
        parse_chat_completion(&json, &self.model)
    }
}

#[async_trait]
impl GenerationBackend for GroqBackend {
    fn name(&self) -> &str { "groq" }
    fn is_local(&self) -> bool { false }
    fn prompt_style(&self) -> PromptStyle { PromptStyle::Chat }

    async fn generate(&self, prompt: &ShapedPrompt) -> Result<Vec<Candidate>, LlmError> {
        let start = Instant::now();
        let completion = self
            .complete(prompt.text_for(PromptStyle::Chat), prompt.max_tokens, prompt.temperature)
            .await?;

        info!(
            model = %completion.model,
            prompt_tokens = completion.usage.prompt_tokens,
            completion_tokens = completion.usage.completion_tokens,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Remote completion finished"
        );
        debug!(chars = completion.content.len(), "Remote completion content");

        Ok(vec![Candidate::new(completion.content, REMOTE_CONFIDENCE)])
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_first_choice() {
        let json = serde_json::json!({
            "model": "llama-3.3-70b-versatile",
            "choices": [
                {"message": {"role": "assistant", "content": "Gravity pulls."}},
                {"message": {"role": "assistant", "content": "ignored"}}
            ],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3}
        });
        let c = parse_chat_completion(&json, "fallback").unwrap();
        assert_eq!(c.content, "Gravity pulls.");
        assert_eq!(c.model, "llama-3.3-70b-versatile");
        assert_eq!(c.usage, TokenUsage { prompt_tokens: 12, completion_tokens: 3 });
    }

    #[test]
    fn test_parse_no_choices_is_error() {
        let json = serde_json::json!({"choices": []});
        assert!(matches!(parse_chat_completion(&json, "m"), Err(LlmError::EmptyResponse)));
        let json = serde_json::json!({"id": "x"});
        assert!(matches!(parse_chat_completion(&json, "m"), Err(LlmError::EmptyResponse)));
    }

    #[test]
    fn test_parse_missing_usage_defaults() {
        let json = serde_json::json!({"choices": [{"message": {"content": "ok"}}]});
        let c = parse_chat_completion(&json, "fallback").unwrap();
        assert_eq!(c.model, "fallback");
        assert_eq!(c.usage, TokenUsage::default());
    }

    #[test]
    fn test_groq_backend_is_remote_chat() {
        let b = GroqBackend::new(SecretString::from("gsk-test".to_string()), &RemoteConfig::default()).unwrap();
        assert!(!b.is_local());
        assert_eq!(b.name(), "groq");
        assert_eq!(b.prompt_style(), PromptStyle::Chat);
        assert!(!format!("{:?}", b).contains("gsk-test"));
    }
}
