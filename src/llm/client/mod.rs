//! LLM client for structured selector extraction.
//!
//! Supports Ollama, OpenAI-compatible chat completions, the Anthropic
//! Messages API and Gemini generateContent.

mod config;
mod prompts;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

pub use config::{LlmConfig, LlmProvider};
pub use prompts::{LISTING_SELECTOR_PROMPT, PRODUCT_SELECTOR_PROMPT};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("{provider} requires an API key (set LLM_API_KEY or {env})")]
    MissingApiKey {
        provider: LlmProvider,
        env: &'static str,
    },
    #[error("LLM call timed out after {0}s")]
    Timeout(u64),
}

/// One structured-extraction call.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    /// Rules the model must follow.
    pub instruction: &'a str,
    /// Empty JSON object naming the expected keys.
    pub schema: &'a Value,
    /// Page HTML.
    pub content: &'a str,
}

/// Anything that turns a page plus instructions into a JSON value.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete_json(&self, request: CompletionRequest<'_>) -> Result<Value, LlmError>;
}

/// HTTP client for the configured provider.
pub struct LlmClient {
    config: LlmConfig,
    client: Client,
}

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'a str,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

impl LlmClient {
    /// Create a new LLM client with the given configuration.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        if config.provider.requires_api_key() && config.api_key.is_none() {
            return Err(LlmError::MissingApiKey {
                provider: config.provider,
                env: config.provider.api_key_env().unwrap_or("LLM_API_KEY"),
            });
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Truncate content to configured maximum (UTF-8 safe).
    fn truncate_content<'a>(&self, text: &'a str) -> &'a str {
        if text.len() <= self.config.max_content_chars {
            return text;
        }
        let mut end = self.config.max_content_chars;
        while end > 0 && !text.is_char_boundary(end) {
            end -= 1;
        }
        &text[..end]
    }

    fn user_prompt(&self, request: &CompletionRequest<'_>) -> String {
        let schema = serde_json::to_string_pretty(request.schema).unwrap_or_default();
        format!(
            "Respond with ONE JSON object with exactly these keys:\n{}\n\nPage HTML:\n{}",
            schema,
            self.truncate_content(request.content)
        )
    }

    fn api_key(&self) -> &str {
        self.config.api_key.as_deref().unwrap_or_default()
    }

    async fn post_json<T: for<'de> Deserialize<'de>>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, LlmError> {
        let resp = request.send().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(self.config.timeout)
            } else {
                LlmError::Connection(e.to_string())
            }
        })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
        }

        resp.json().await.map_err(|e| LlmError::Parse(e.to_string()))
    }

    async fn call_ollama(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        let body = OllamaRequest {
            model: self.config.model(),
            system,
            prompt,
            stream: false,
            format: "json",
            options: OllamaOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens,
            },
        };
        let url = format!("{}/api/generate", self.config.endpoint());
        let resp: OllamaResponse = self.post_json(self.client.post(&url).json(&body)).await?;
        Ok(resp.response)
    }

    async fn call_openai(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        let body = json!({
            "model": self.config.model(),
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": prompt},
            ],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
            "response_format": {"type": "json_object"},
        });
        let url = format!("{}/v1/chat/completions", self.config.endpoint());
        let resp: ChatResponse = self
            .post_json(self.client.post(&url).bearer_auth(self.api_key()).json(&body))
            .await?;
        resp.choices
            .into_iter()
            .find_map(|c| c.message.content)
            .ok_or_else(|| LlmError::Parse("No choices in response".to_string()))
    }

    async fn call_anthropic(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        let body = json!({
            "model": self.config.model(),
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "system": system,
            "messages": [{"role": "user", "content": prompt}],
        });
        let url = format!("{}/v1/messages", self.config.endpoint());
        let resp: AnthropicResponse = self
            .post_json(
                self.client
                    .post(&url)
                    .header("x-api-key", self.api_key())
                    .header("anthropic-version", ANTHROPIC_VERSION)
                    .json(&body),
            )
            .await?;
        let text: String = resp.content.into_iter().filter_map(|b| b.text).collect();
        if text.is_empty() {
            return Err(LlmError::Parse("No text blocks in response".to_string()));
        }
        Ok(text)
    }

    async fn call_gemini(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        let body = json!({
            "systemInstruction": {"parts": [{"text": system}]},
            "contents": [{"parts": [{"text": prompt}]}],
            "generationConfig": {
                "temperature": self.config.temperature,
                "maxOutputTokens": self.config.max_tokens,
                "responseMimeType": "application/json",
            },
        });
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.endpoint(),
            self.config.model()
        );
        let resp: GeminiResponse = self
            .post_json(
                self.client
                    .post(&url)
                    .query(&[("key", self.api_key())])
                    .json(&body),
            )
            .await?;
        resp.candidates
            .into_iter()
            .flat_map(|c| c.content.parts)
            .find_map(|p| p.text)
            .ok_or_else(|| LlmError::Parse("No candidates in response".to_string()))
    }
}

#[async_trait]
impl CompletionBackend for LlmClient {
    async fn complete_json(&self, request: CompletionRequest<'_>) -> Result<Value, LlmError> {
        let prompt = self.user_prompt(&request);
        debug!(
            "Requesting selectors from {} ({}, {} prompt chars)",
            self.config.provider,
            self.config.model(),
            prompt.len()
        );

        let call = async {
            match self.config.provider {
                LlmProvider::Ollama => self.call_ollama(request.instruction, &prompt).await,
                LlmProvider::OpenAI => self.call_openai(request.instruction, &prompt).await,
                LlmProvider::Anthropic => self.call_anthropic(request.instruction, &prompt).await,
                LlmProvider::Gemini => self.call_gemini(request.instruction, &prompt).await,
            }
        };
        let text = tokio::time::timeout(Duration::from_secs(self.config.timeout), call)
            .await
            .map_err(|_| LlmError::Timeout(self.config.timeout))??;

        parse_json_response(&text)
    }
}

/// Parse a model response as JSON, tolerating markdown fences and prose
/// around the payload.
pub fn parse_json_response(text: &str) -> Result<Value, LlmError> {
    let trimmed = text.trim();
    let unfenced = strip_code_fence(trimmed);

    if let Ok(value) = serde_json::from_str(unfenced) {
        return Ok(value);
    }

    if let (Some(start), Some(end)) = (unfenced.find(['{', '[']), unfenced.rfind(['}', ']'])) {
        if end > start {
            if let Ok(value) = serde_json::from_str(&unfenced[start..=end]) {
                return Ok(value);
            }
        }
    }

    let preview: String = trimmed.chars().take(120).collect();
    Err(LlmError::Parse(format!("response is not JSON: {:?}", preview)))
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_object() {
        let value = parse_json_response(r#" {"name": "h1"} "#).unwrap();
        assert_eq!(value["name"], "h1");
    }

    #[test]
    fn test_parse_fenced_and_wrapped() {
        let value = parse_json_response("```json\n{\"price\": \".price\"}\n```").unwrap();
        assert_eq!(value["price"], ".price");

        let value =
            parse_json_response("Here you go: [{\"product_card\": \"li\"}] hope it helps").unwrap();
        assert_eq!(value[0]["product_card"], "li");
    }

    #[test]
    fn test_parse_rejects_prose() {
        assert!(matches!(
            parse_json_response("I could not find any selectors."),
            Err(LlmError::Parse(_))
        ));
        assert!(parse_json_response("").is_err());
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let config = LlmConfig::for_provider(LlmProvider::Anthropic);
        let err = LlmClient::new(config).err().unwrap();
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn test_truncate_content_respects_char_boundary() {
        let mut config = LlmConfig::for_provider(LlmProvider::Ollama);
        config.max_content_chars = 2;
        let client = LlmClient::new(config).unwrap();
        assert_eq!(client.truncate_content("héllo"), "h");
        assert_eq!(client.truncate_content("hi"), "hi");
    }
}
