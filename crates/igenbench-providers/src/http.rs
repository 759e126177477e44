//! HTTP layer: status mapping, retry, VCR routing.
//!
//! The network policy is checked on live requests only; VCR replay stays
//! available when outbound traffic is denied.
//!
//! This is the ONLY place for status code handling. Provider clients never
//! interpret status codes.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::network::check_outbound;
use crate::types::ProviderConfig;
use crate::vcr::{VcrClient, VcrMode};

/// User agent for provider requests.
pub const USER_AGENT_VALUE: &str = concat!("igenbench/", env!("CARGO_PKG_VERSION"));

const MAX_BACKOFF: Duration = Duration::from_secs(30);
const MAX_ERROR_BODY: usize = 500;

/// HTTP backend shared by all provider clients.
#[derive(Debug, Clone)]
pub(crate) struct HttpBackend {
    client: reqwest::Client,
    provider: &'static str,
    max_retries: u32,
    backoff_base_ms: u64,
    vcr: Option<Arc<Mutex<VcrClient>>>,
}

impl HttpBackend {
    pub(crate) fn new(provider: &'static str, config: &ProviderConfig) -> ProviderResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| ProviderError::Network {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        let vcr = if VcrMode::from_env() != VcrMode::Off {
            let vcr = VcrClient::from_env().with_client(client.clone());
            debug!(mode = ?vcr.mode(), cassettes = vcr.cassette_count(), "VCR enabled");
            Some(Arc::new(Mutex::new(vcr)))
        } else {
            None
        };

        Ok(Self {
            client,
            provider,
            max_retries: config.max_retries,
            backoff_base_ms: config.backoff_base_ms,
            vcr,
        })
    }

    pub(crate) fn provider(&self) -> &'static str {
        self.provider
    }

    /// POST a JSON body and parse a JSON response, retrying transient failures.
    pub(crate) async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, String)],
        body: &Value,
    ) -> ProviderResult<Value> {
        self.with_retry(ProviderError::is_retryable, move || {
            self.post_json_once(url, headers, body)
        })
        .await
    }

    /// POST that starts billable work upstream. Only 429 is retried.
    pub(crate) async fn post_json_create(
        &self,
        url: &str,
        headers: &[(&str, String)],
        body: &Value,
    ) -> ProviderResult<Value> {
        self.with_retry(
            |e| matches!(e, ProviderError::RateLimited { .. }),
            move || self.post_json_once(url, headers, body),
        )
        .await
    }

    /// GET a JSON document, retrying transient failures.
    pub(crate) async fn get_json(
        &self,
        url: &str,
        headers: &[(&str, String)],
    ) -> ProviderResult<Value> {
        self.with_retry(ProviderError::is_retryable, move || async move {
            let response = self.get_once(url, headers).await?;
            let text = response.text().await?;
            self.parse_json(&text)
        })
        .await
    }

    /// GET raw bytes (image downloads), retrying transient failures.
    pub(crate) async fn get_bytes(
        &self,
        url: &str,
        headers: &[(&str, String)],
    ) -> ProviderResult<Vec<u8>> {
        self.with_retry(ProviderError::is_retryable, move || async move {
            let response = self.get_once(url, headers).await?;
            Ok(response.bytes().await?.to_vec())
        })
        .await
    }

    async fn with_retry<T, R, F, Fut>(&self, retry_on: R, mut op: F) -> ProviderResult<T>
    where
        R: Fn(&ProviderError) -> bool,
        F: FnMut() -> Fut,
        Fut: Future<Output = ProviderResult<T>>,
    {
        let mut retries = 0;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if retry_on(&e) && retries < self.max_retries => {
                    retries += 1;
                    let backoff = self.backoff_for(&e, retries);

                    warn!(
                        provider = self.provider,
                        error = %e,
                        retry = retries,
                        max_retries = self.max_retries,
                        backoff_ms = backoff.as_millis() as u64,
                        "recoverable provider error, will retry with backoff"
                    );

                    tokio::time::sleep(backoff).await;
                }
                Err(e) => {
                    if retry_on(&e) {
                        warn!(
                            provider = self.provider,
                            error = %e,
                            attempts = retries + 1,
                            "all retry attempts exhausted, check network connectivity or service status"
                        );
                    }
                    return Err(e);
                }
            }
        }
    }

    fn backoff_for(&self, err: &ProviderError, retries: u32) -> Duration {
        use rand::Rng;

        match err {
            ProviderError::RateLimited {
                retry_after: Some(retry_after),
                ..
            } => {
                let capped = (*retry_after).min(MAX_BACKOFF);
                let jitter_factor: f64 = rand::thread_rng().gen_range(0.9_f64..=1.1_f64);
                let jittered_ms = ((capped.as_millis() as f64) * jitter_factor).round() as u64;
                Duration::from_millis(jittered_ms.max(100))
            }
            _ => {
                let base_ms = self
                    .backoff_base_ms
                    .saturating_mul(1u64 << retries.min(16));
                let base = Duration::from_millis(base_ms).min(MAX_BACKOFF);
                let jittered_ms = rand::thread_rng().gen_range(0..=base.as_millis() as u64);
                Duration::from_millis(jittered_ms.max(10))
            }
        }
    }

    async fn post_json_once(
        &self,
        url: &str,
        headers: &[(&str, String)],
        body: &Value,
    ) -> ProviderResult<Value> {
        if let Some(vcr) = &self.vcr {
            let mut vcr = vcr.lock().await;
            let resp = vcr.post_json(self.provider, url, body, headers).await?;
            if !resp.is_success() {
                let text = match &resp.body {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                return Err(map_status(self.provider, resp.status, None, &text));
            }
            return Ok(resp.body);
        }

        check_outbound(url)?;
        debug!(provider = self.provider, url = %redact(url), "POST");
        let mut request = self.client.post(url).json(body);
        for (name, value) in headers {
            request = request.header(*name, value.as_str());
        }

        let response = check_status(self.provider, request.send().await?).await?;
        let text = response.text().await?;
        self.parse_json(&text)
    }

    async fn get_once(
        &self,
        url: &str,
        headers: &[(&str, String)],
    ) -> ProviderResult<reqwest::Response> {
        check_outbound(url)?;
        debug!(provider = self.provider, url = %redact(url), "GET");
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, value.as_str());
        }
        check_status(self.provider, request.send().await?).await
    }

    fn parse_json(&self, text: &str) -> ProviderResult<Value> {
        serde_json::from_str(text).map_err(|e| {
            ProviderError::invalid_response(self.provider, format!("malformed JSON body: {}", e))
        })
    }
}

async fn check_status(
    provider: &str,
    response: reqwest::Response,
) -> ProviderResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs);
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| status.to_string());

    Err(map_status(provider, status.as_u16(), retry_after, &body))
}

/// Map a non-success status code to a typed error.
pub(crate) fn map_status(
    provider: &str,
    status: u16,
    retry_after: Option<Duration>,
    body: &str,
) -> ProviderError {
    let provider = provider.to_string();
    let message = truncate(body.trim(), MAX_ERROR_BODY);

    match status {
        400 => ProviderError::BadRequest { provider, message },
        401 | 403 => ProviderError::Unauthorized { provider, message },
        404 => ProviderError::NotFound { provider, message },
        408 => ProviderError::Timeout {
            message: format!("{} returned 408: {}", provider, message),
        },
        429 => ProviderError::RateLimited {
            provider,
            retry_after,
        },
        500..=599 => ProviderError::Server {
            provider,
            status,
            message,
        },
        _ => ProviderError::InvalidResponse {
            provider,
            message: format!("unexpected HTTP {}: {}", status, message),
        },
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

fn redact(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}
