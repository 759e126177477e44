//! OpenRouter client (OpenAI-compatible chat completions).

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::client::ProviderClient;
use crate::error::{ProviderError, ProviderResult};
use crate::http::HttpBackend;
use crate::image::{decode_data_url, GeneratedImage, ImageInput};
use crate::types::{ProviderConfig, OPENROUTER_API_KEY_ENV};

#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    http: HttpBackend,
    api_key: String,
    base_url: String,
}

impl OpenRouterClient {
    pub fn new(config: &ProviderConfig) -> ProviderResult<Self> {
        let api_key = config
            .openrouter_api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ProviderError::MissingApiKey {
                env_var: OPENROUTER_API_KEY_ENV.to_string(),
            })?;

        Ok(Self {
            http: HttpBackend::new("openrouter", config)?,
            api_key,
            base_url: config.openrouter_base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn chat(&self, body: &Value) -> ProviderResult<Value> {
        let url = format!("{}/chat/completions", self.base_url);
        let headers = [("Authorization", format!("Bearer {}", self.api_key))];
        self.http.post_json(&url, &headers, body).await
    }
}

#[async_trait]
impl ProviderClient for OpenRouterClient {
    async fn generate_image(&self, model: &str, prompt: &str) -> ProviderResult<GeneratedImage> {
        info!(model, "requesting image from openrouter");
        let body = json!({
            "model": model,
            "messages": [{ "role": "user", "content": prompt }],
            "modalities": ["image", "text"],
        });
        let response = self.chat(&body).await?;

        let url = response
            .pointer("/choices/0/message/images/0/image_url/url")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ProviderError::invalid_response("openrouter", "no image in response")
            })?;

        if let Some(bytes) = decode_data_url(url) {
            return Ok(GeneratedImage::new(bytes));
        }
        if url.starts_with("http://") || url.starts_with("https://") {
            debug!("downloading openrouter image");
            let bytes = self.http.get_bytes(url, &[]).await?;
            return Ok(GeneratedImage::new(bytes));
        }
        Err(ProviderError::invalid_response(
            "openrouter",
            "image url is neither a base64 data URL nor http(s)",
        ))
    }

    async fn understand_image(
        &self,
        model: &str,
        image: &ImageInput,
        prompt: &str,
    ) -> ProviderResult<String> {
        let body = json!({
            "model": model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": prompt },
                    { "type": "image_url", "image_url": { "url": image.data_url() } },
                ],
            }],
        });
        let response = self.chat(&body).await?;

        message_text(&response).ok_or_else(|| {
            ProviderError::invalid_response("openrouter", "response has no message content")
        })
    }

    fn provider_name(&self) -> &'static str {
        "openrouter"
    }
}

/// Message content may be a plain string or an array of typed parts.
fn message_text(response: &Value) -> Option<String> {
    let content = response.pointer("/choices/0/message/content")?;
    let text = match content {
        Value::String(s) => s.clone(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(|p| p.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join(""),
        _ => return None,
    };
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_string_or_parts() {
        let plain = json!({"choices": [{"message": {"content": "hello"}}]});
        assert_eq!(message_text(&plain).as_deref(), Some("hello"));

        let parts = json!({"choices": [{"message": {"content": [
            {"type": "text", "text": "a"}, {"type": "text", "text": "b"}
        ]}}]});
        assert_eq!(message_text(&parts).as_deref(), Some("ab"));

        let empty = json!({"choices": [{"message": {"content": null}}]});
        assert!(message_text(&empty).is_none());
    }
}
