//! Provider configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

pub const GOOGLE_API_KEY_ENV: &str = "GOOGLE_API_KEY";
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const OPENROUTER_API_KEY_ENV: &str = "OPENROUTER_API_KEY";
pub const REPLICATE_API_TOKEN_ENV: &str = "REPLICATE_API_TOKEN";

/// Known providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Google,
    OpenRouter,
    Replicate,
    Fake,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [Self::Google, Self::OpenRouter, Self::Replicate, Self::Fake];

    /// Comma-separated provider names for error messages and help text.
    pub fn supported() -> String {
        Self::ALL
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::OpenRouter => "openrouter",
            Self::Replicate => "replicate",
            Self::Fake => "fake",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "openrouter" => Ok(Self::OpenRouter),
            "replicate" => Ok(Self::Replicate),
            "fake" => Ok(Self::Fake),
            _ => Err(ProviderError::UnsupportedProvider {
                name: s.to_string(),
            }),
        }
    }
}

/// Provider client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Google Gemini API key.
    #[serde(default)]
    pub google_api_key: Option<String>,

    /// OpenRouter API key.
    #[serde(default)]
    pub openrouter_api_key: Option<String>,

    /// Replicate API token.
    #[serde(default)]
    pub replicate_api_token: Option<String>,

    #[serde(default = "default_google_base_url")]
    pub google_base_url: String,

    #[serde(default = "default_openrouter_base_url")]
    pub openrouter_base_url: String,

    #[serde(default = "default_replicate_base_url")]
    pub replicate_base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries for transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay for exponential backoff, in milliseconds.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Delay between Replicate prediction polls, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub replicate_poll_interval_ms: u64,

    /// Maximum number of Replicate prediction polls.
    #[serde(default = "default_max_polls")]
    pub replicate_max_polls: u32,

    /// Answer returned by the fake judge ("0" or "1").
    #[serde(default = "default_fake_answer")]
    pub fake_answer: String,
}

fn default_google_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_openrouter_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_replicate_base_url() -> String {
    "https://api.replicate.com/v1".to_string()
}

fn default_timeout() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_max_polls() -> u32 {
    150
}

fn default_fake_answer() -> String {
    "1".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            google_api_key: None,
            openrouter_api_key: None,
            replicate_api_token: None,
            google_base_url: default_google_base_url(),
            openrouter_base_url: default_openrouter_base_url(),
            replicate_base_url: default_replicate_base_url(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            replicate_poll_interval_ms: default_poll_interval_ms(),
            replicate_max_polls: default_max_polls(),
            fake_answer: default_fake_answer(),
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl ProviderConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `GOOGLE_API_KEY` / `GEMINI_API_KEY` | Google Gemini key |
    /// | `OPENROUTER_API_KEY` | OpenRouter key |
    /// | `REPLICATE_API_TOKEN` | Replicate token |
    /// | `IGENBENCH_GOOGLE_BASE_URL` | Gemini API base URL |
    /// | `IGENBENCH_OPENROUTER_BASE_URL` | OpenRouter API base URL |
    /// | `IGENBENCH_REPLICATE_BASE_URL` | Replicate API base URL |
    /// | `IGENBENCH_HTTP_TIMEOUT` | Request timeout in seconds (default: 120) |
    /// | `IGENBENCH_MAX_RETRIES` | Max retries for transient failures (default: 3) |
    /// | `IGENBENCH_FAKE_ANSWER` | Answer of the fake judge (default: 1) |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            google_api_key: env_non_empty(GOOGLE_API_KEY_ENV)
                .or_else(|| env_non_empty(GEMINI_API_KEY_ENV)),
            openrouter_api_key: env_non_empty(OPENROUTER_API_KEY_ENV),
            replicate_api_token: env_non_empty(REPLICATE_API_TOKEN_ENV),
            google_base_url: env_non_empty("IGENBENCH_GOOGLE_BASE_URL")
                .unwrap_or(defaults.google_base_url),
            openrouter_base_url: env_non_empty("IGENBENCH_OPENROUTER_BASE_URL")
                .unwrap_or(defaults.openrouter_base_url),
            replicate_base_url: env_non_empty("IGENBENCH_REPLICATE_BASE_URL")
                .unwrap_or(defaults.replicate_base_url),
            timeout_secs: env_parse("IGENBENCH_HTTP_TIMEOUT").unwrap_or(defaults.timeout_secs),
            max_retries: env_parse("IGENBENCH_MAX_RETRIES").unwrap_or(defaults.max_retries),
            backoff_base_ms: defaults.backoff_base_ms,
            replicate_poll_interval_ms: defaults.replicate_poll_interval_ms,
            replicate_max_polls: defaults.replicate_max_polls,
            fake_answer: env_non_empty("IGENBENCH_FAKE_ANSWER").unwrap_or(defaults.fake_answer),
        }
    }

    pub fn with_google_api_key(mut self, key: impl Into<String>) -> Self {
        self.google_api_key = Some(key.into());
        self
    }

    pub fn with_openrouter_api_key(mut self, key: impl Into<String>) -> Self {
        self.openrouter_api_key = Some(key.into());
        self
    }

    pub fn with_replicate_api_token(mut self, token: impl Into<String>) -> Self {
        self.replicate_api_token = Some(token.into());
        self
    }

    /// Point every provider at the same base URL (mock servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.google_base_url = url.clone();
        self.openrouter_base_url = url.clone();
        self.replicate_base_url = url;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_backoff_base_ms(mut self, ms: u64) -> Self {
        self.backoff_base_ms = ms;
        self
    }

    pub fn with_replicate_polling(mut self, interval_ms: u64, max_polls: u32) -> Self {
        self.replicate_poll_interval_ms = interval_ms;
        self.replicate_max_polls = max_polls;
        self
    }

    pub fn with_fake_answer(mut self, answer: impl Into<String>) -> Self {
        self.fake_answer = answer.into();
        self
    }
}
