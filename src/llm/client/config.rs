//! LLM client configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Ollama API (local, default)
    #[default]
    Ollama,
    /// OpenAI-compatible chat completions (OpenAI, Groq, Together.ai, etc.)
    #[serde(alias = "groq", alias = "together")]
    OpenAI,
    /// Anthropic Messages API
    #[serde(alias = "claude")]
    Anthropic,
    /// Google Gemini generateContent API
    #[serde(alias = "google")]
    Gemini,
}

impl LlmProvider {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Some(Self::Ollama),
            "openai" | "groq" | "together" => Some(Self::OpenAI),
            "anthropic" | "claude" => Some(Self::Anthropic),
            "gemini" | "google" => Some(Self::Gemini),
            _ => None,
        }
    }

    pub fn default_endpoint(self) -> &'static str {
        match self {
            Self::Ollama => "http://localhost:11434",
            Self::OpenAI => "https://api.openai.com",
            Self::Anthropic => "https://api.anthropic.com",
            Self::Gemini => "https://generativelanguage.googleapis.com",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Self::Ollama => "llama3:8b",
            Self::OpenAI => "gpt-4o-mini",
            Self::Anthropic => "claude-3-5-haiku-20241022",
            Self::Gemini => "gemini-1.5-pro",
        }
    }

    /// Provider-specific key variable consulted when no key is configured.
    pub fn api_key_env(self) -> Option<&'static str> {
        match self {
            Self::Ollama => None,
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::Gemini => Some("GEMINI_API_KEY"),
        }
    }

    pub fn requires_api_key(self) -> bool {
        self != Self::Ollama
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ollama => "ollama",
            Self::OpenAI => "openai",
            Self::Anthropic => "anthropic",
            Self::Gemini => "gemini",
        })
    }
}

/// Configuration for the LLM client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider to call
    #[serde(default)]
    pub provider: LlmProvider,
    /// API endpoint; provider default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// API key for hosted providers
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Model name; provider default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Maximum tokens in response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Temperature for generation (0.0 - 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum characters of page HTML sent to the LLM
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
    /// Per-call timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_content_chars() -> usize {
    120_000
}

fn default_timeout() -> u64 {
    300
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self::base_default().with_env_overrides()
    }
}

impl LlmConfig {
    /// Base default without env overrides.
    fn base_default() -> Self {
        Self {
            provider: LlmProvider::default(),
            endpoint: None,
            api_key: None,
            model: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            max_content_chars: default_max_content_chars(),
            timeout: default_timeout(),
        }
    }

    /// Config for one provider with its defaults, ignoring the environment.
    pub fn for_provider(provider: LlmProvider) -> Self {
        Self {
            provider,
            ..Self::base_default()
        }
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `LLM_PROVIDER`: "ollama" (default), "openai", "anthropic" or "gemini"
    /// - `LLM_ENDPOINT`: API endpoint (defaults based on provider)
    /// - `LLM_API_KEY`: API key for hosted providers
    /// - `LLM_MODEL`: Model name
    /// - `LLM_MAX_TOKENS`: Maximum tokens in response
    /// - `LLM_TEMPERATURE`: Generation temperature (0.0-1.0)
    /// - `LLM_MAX_CONTENT_CHARS`: Max HTML chars to send
    /// - `LLM_TIMEOUT`: Per-call timeout in seconds
    ///
    /// When no key is set, the provider's own variable (`OPENAI_API_KEY`,
    /// `ANTHROPIC_API_KEY`, `GEMINI_API_KEY`) is used. Keys never select a
    /// provider on their own.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(provider) = std::env::var("LLM_PROVIDER")
            .ok()
            .and_then(|val| LlmProvider::parse(&val))
        {
            self.provider = provider;
        }
        if let Ok(val) = std::env::var("LLM_ENDPOINT") {
            self.endpoint = Some(val);
        }
        if let Ok(val) = std::env::var("LLM_API_KEY") {
            self.api_key = Some(val);
        }
        if self.api_key.is_none() {
            if let Some(var) = self.provider.api_key_env() {
                self.api_key = std::env::var(var).ok().filter(|k| !k.is_empty());
            }
        }
        if let Ok(val) = std::env::var("LLM_MODEL") {
            self.model = Some(val);
        }
        if let Ok(val) = std::env::var("LLM_MAX_TOKENS") {
            if let Ok(n) = val.parse() {
                self.max_tokens = n;
            }
        }
        if let Ok(val) = std::env::var("LLM_TEMPERATURE") {
            if let Ok(t) = val.parse() {
                self.temperature = t;
            }
        }
        if let Ok(val) = std::env::var("LLM_MAX_CONTENT_CHARS") {
            if let Ok(n) = val.parse() {
                self.max_content_chars = n;
            }
        }
        if let Ok(val) = std::env::var("LLM_TIMEOUT") {
            if let Ok(n) = val.parse() {
                self.timeout = n;
            }
        }
        self
    }

    /// Switch provider. Endpoint, model and key set for the previous
    /// provider are dropped; the new provider's key variable is consulted.
    pub fn with_provider(mut self, provider: LlmProvider) -> Self {
        if provider == self.provider {
            return self;
        }
        self.provider = provider;
        self.endpoint = None;
        self.model = None;
        self.api_key = provider
            .api_key_env()
            .and_then(|var| std::env::var(var).ok())
            .filter(|k| !k.is_empty());
        self
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = Some(endpoint.to_string());
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = Some(model.to_string());
        self
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    /// Effective endpoint without a trailing slash.
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.provider.default_endpoint())
            .trim_end_matches('/')
    }

    /// Effective model name.
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_defaults() {
        let config = LlmConfig::for_provider(LlmProvider::Anthropic);
        assert_eq!(config.endpoint(), "https://api.anthropic.com");
        assert_eq!(config.model(), "claude-3-5-haiku-20241022");

        let config = LlmConfig::for_provider(LlmProvider::Ollama);
        assert_eq!(config.model(), "llama3:8b");
        assert!(!config.provider.requires_api_key());
    }

    #[test]
    fn test_explicit_values_win() {
        let config = LlmConfig::for_provider(LlmProvider::OpenAI)
            .with_endpoint("https://api.groq.com/openai/")
            .with_model("llama-3.1-70b-versatile");
        assert_eq!(config.endpoint(), "https://api.groq.com/openai");
        assert_eq!(config.model(), "llama-3.1-70b-versatile");
    }

    #[test]
    fn test_provider_parse_aliases() {
        assert_eq!(LlmProvider::parse("Claude"), Some(LlmProvider::Anthropic));
        assert_eq!(LlmProvider::parse("groq"), Some(LlmProvider::OpenAI));
        assert_eq!(LlmProvider::parse("google"), Some(LlmProvider::Gemini));
        assert_eq!(LlmProvider::parse("mystery"), None);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: LlmConfig =
            serde_json::from_str(r#"{"provider": "gemini", "max_tokens": 256}"#).unwrap();
        assert_eq!(config.provider, LlmProvider::Gemini);
        assert_eq!(config.max_tokens, 256);
        assert_eq!(config.model(), "gemini-1.5-pro");
        assert_eq!(config.timeout, 300);
    }

    #[test]
    fn test_switching_provider_drops_previous_choices() {
        let config = LlmConfig::for_provider(LlmProvider::Ollama)
            .with_endpoint("http://gpu-box:11434")
            .with_model("qwen2.5:14b")
            .with_provider(LlmProvider::Gemini);
        assert_eq!(config.provider, LlmProvider::Gemini);
        assert_eq!(config.endpoint(), "https://generativelanguage.googleapis.com");
        assert_eq!(config.model(), "gemini-1.5-pro");

        let same = LlmConfig::for_provider(LlmProvider::Ollama)
            .with_model("qwen2.5:14b")
            .with_provider(LlmProvider::Ollama);
        assert_eq!(same.model(), "qwen2.5:14b");
    }

    #[test]
    fn test_api_key_not_serialized() {
        let config = LlmConfig::for_provider(LlmProvider::Anthropic).with_api_key("sk-secret");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-secret"));
    }
}
