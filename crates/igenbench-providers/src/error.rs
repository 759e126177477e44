//! Error types for provider clients.

use std::time::Duration;

/// Provider errors.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Required API key is not configured.
    #[error("invalid provider configuration: missing API key, set {env_var}")]
    MissingApiKey { env_var: String },

    /// Provider name is not known.
    #[error("invalid provider '{name}': supported providers are google, openrouter, replicate, fake")]
    UnsupportedProvider { name: String },

    /// Request was rejected as malformed (400).
    #[error("bad request ({provider}): {message}")]
    BadRequest { provider: String, message: String },

    /// Authentication failed or key invalid (401/403).
    #[error("unauthorized ({provider}): {message}")]
    Unauthorized { provider: String, message: String },

    /// Model or resource not found (404).
    #[error("not found ({provider}): {message}")]
    NotFound { provider: String, message: String },

    /// Rate limit exceeded (429).
    #[error("rate limit exceeded ({provider}): retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    /// Provider-side failure (5xx).
    #[error("provider error ({provider}) HTTP {status}: {message}")]
    Server {
        provider: String,
        status: u16,
        message: String,
    },

    /// Transport failure.
    #[error("network error: {message}")]
    Network { message: String },

    /// Request or polling timed out.
    #[error("request timeout: {message}")]
    Timeout { message: String },

    /// Response could not be interpreted.
    #[error("invalid response ({provider}): {message}")]
    InvalidResponse { provider: String, message: String },

    /// Remote prediction finished without output.
    #[error("prediction {status} ({provider}): {message}")]
    PredictionFailed {
        provider: String,
        status: String,
        message: String,
    },

    /// Local configuration or policy error.
    #[error("config error: {message}")]
    Config { message: String },
}

impl ProviderError {
    /// Whether the error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. }
                | Self::Server { .. }
                | Self::Network { .. }
                | Self::Timeout { .. }
        )
    }

    /// HTTP status associated with the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::BadRequest { .. } => Some(400),
            Self::Unauthorized { .. } => Some(401),
            Self::NotFound { .. } => Some(404),
            Self::RateLimited { .. } => Some(429),
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Provider that produced the error, if known.
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::BadRequest { provider, .. }
            | Self::Unauthorized { provider, .. }
            | Self::NotFound { provider, .. }
            | Self::RateLimited { provider, .. }
            | Self::Server { provider, .. }
            | Self::InvalidResponse { provider, .. }
            | Self::PredictionFailed { provider, .. } => Some(provider),
            _ => None,
        }
    }

    pub(crate) fn invalid_response(provider: &str, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.to_string(),
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                message: err.to_string(),
            }
        } else {
            Self::Network {
                message: err.to_string(),
            }
        }
    }
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
