//! Replicate client (predictions API with polling).

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::client::ProviderClient;
use crate::error::{ProviderError, ProviderResult};
use crate::http::HttpBackend;
use crate::image::{decode_data_url, GeneratedImage, ImageInput};
use crate::types::{ProviderConfig, REPLICATE_API_TOKEN_ENV};

#[derive(Debug, Clone)]
pub struct ReplicateClient {
    http: HttpBackend,
    api_token: String,
    base_url: String,
    poll_interval: Duration,
    max_polls: u32,
}

impl ReplicateClient {
    pub fn new(config: &ProviderConfig) -> ProviderResult<Self> {
        let api_token = config
            .replicate_api_token
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ProviderError::MissingApiKey {
                env_var: REPLICATE_API_TOKEN_ENV.to_string(),
            })?;

        Ok(Self {
            http: HttpBackend::new("replicate", config)?,
            api_token,
            base_url: config.replicate_base_url.trim_end_matches('/').to_string(),
            poll_interval: Duration::from_millis(config.replicate_poll_interval_ms),
            max_polls: config.replicate_max_polls,
        })
    }

    fn auth(&self) -> (&'static str, String) {
        ("Authorization", format!("Bearer {}", self.api_token))
    }

    /// `owner/name` runs the latest model version; `owner/name:version` pins one.
    fn create_request(&self, model: &str, input: Value) -> (String, Value) {
        match model.split_once(':') {
            Some((_, version)) => (
                format!("{}/predictions", self.base_url),
                json!({ "version": version, "input": input }),
            ),
            None => (
                format!("{}/models/{}/predictions", self.base_url, model),
                json!({ "input": input }),
            ),
        }
    }

    /// Create a prediction and wait for a terminal state. Returns its `output`.
    async fn run_prediction(&self, model: &str, input: Value) -> ProviderResult<Value> {
        let (url, body) = self.create_request(model, input);
        let headers = [self.auth(), ("Prefer", "wait".to_string())];
        let mut prediction = self
            .http
            .post_json_create(&url, &headers, &body)
            .await?;

        let mut polls = 0;
        loop {
            let status = prediction
                .get("status")
                .and_then(Value::as_str)
                .unwrap_or("starting")
                .to_string();

            match status.as_str() {
                "succeeded" => {
                    return Ok(prediction.get("output").cloned().unwrap_or(Value::Null));
                }
                "failed" | "canceled" => {
                    let message = prediction
                        .get("error")
                        .map(|e| match e {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .unwrap_or_else(|| "no error detail".to_string());
                    return Err(ProviderError::PredictionFailed {
                        provider: "replicate".to_string(),
                        status,
                        message,
                    });
                }
                _ => {}
            }

            if polls >= self.max_polls {
                return Err(ProviderError::Timeout {
                    message: format!(
                        "replicate prediction still '{}' after {} polls",
                        status, polls
                    ),
                });
            }
            polls += 1;

            let poll_url = self.poll_url(&prediction)?;
            debug!(status = %status, poll = polls, "waiting for replicate prediction");
            tokio::time::sleep(self.poll_interval).await;
            prediction = self.http.get_json(&poll_url, &[self.auth()]).await?;
        }
    }

    fn poll_url(&self, prediction: &Value) -> ProviderResult<String> {
        if let Some(url) = prediction.pointer("/urls/get").and_then(Value::as_str) {
            return Ok(url.to_string());
        }
        prediction
            .get("id")
            .and_then(Value::as_str)
            .map(|id| format!("{}/predictions/{}", self.base_url, id))
            .ok_or_else(|| {
                ProviderError::invalid_response("replicate", "prediction has no id or poll url")
            })
    }
}

#[async_trait]
impl ProviderClient for ReplicateClient {
    async fn generate_image(&self, model: &str, prompt: &str) -> ProviderResult<GeneratedImage> {
        info!(model, "requesting image from replicate");
        let output = self
            .run_prediction(model, json!({ "prompt": prompt }))
            .await?;

        let url = first_output_url(&output).ok_or_else(|| {
            ProviderError::invalid_response("replicate", "prediction output has no image url")
        })?;

        if let Some(bytes) = decode_data_url(&url) {
            return Ok(GeneratedImage::new(bytes));
        }
        let bytes = self.http.get_bytes(&url, &[]).await?;
        Ok(GeneratedImage::new(bytes))
    }

    async fn understand_image(
        &self,
        model: &str,
        image: &ImageInput,
        prompt: &str,
    ) -> ProviderResult<String> {
        let output = self
            .run_prediction(model, json!({ "prompt": prompt, "image": image.data_url() }))
            .await?;

        let text = match output {
            Value::String(s) => s,
            Value::Array(chunks) => chunks
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(""),
            _ => String::new(),
        };
        if text.trim().is_empty() {
            return Err(ProviderError::invalid_response(
                "replicate",
                "prediction output has no text",
            ));
        }
        Ok(text)
    }

    fn provider_name(&self) -> &'static str {
        "replicate"
    }
}

fn first_output_url(output: &Value) -> Option<String> {
    match output {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(|v| v.as_str().map(str::to_string)),
        _ => None,
    }
}
