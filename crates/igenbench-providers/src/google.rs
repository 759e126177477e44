//! Google Gemini client (`generateContent`).

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::client::ProviderClient;
use crate::error::{ProviderError, ProviderResult};
use crate::http::HttpBackend;
use crate::image::{decode_base64, GeneratedImage, ImageInput};
use crate::types::{ProviderConfig, GOOGLE_API_KEY_ENV};

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone)]
pub struct GoogleClient {
    http: HttpBackend,
    api_key: String,
    base_url: String,
}

impl GoogleClient {
    pub fn new(config: &ProviderConfig) -> ProviderResult<Self> {
        let api_key = config
            .google_api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ProviderError::MissingApiKey {
                env_var: GOOGLE_API_KEY_ENV.to_string(),
            })?;

        Ok(Self {
            http: HttpBackend::new("google", config)?,
            api_key,
            base_url: config.google_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    async fn generate_content(&self, model: &str, body: &Value) -> ProviderResult<Value> {
        let headers = [(API_KEY_HEADER, self.api_key.clone())];
        let response = self
            .http
            .post_json(&self.endpoint(model), &headers, body)
            .await?;
        check_block_reason(self.http.provider(), &response)?;
        Ok(response)
    }
}

#[async_trait]
impl ProviderClient for GoogleClient {
    async fn generate_image(&self, model: &str, prompt: &str) -> ProviderResult<GeneratedImage> {
        info!(model, "requesting image from google");
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] },
        });
        let response = self.generate_content(model, &body).await?;

        for part in candidate_parts(&response) {
            let inline = part.get("inlineData").or_else(|| part.get("inline_data"));
            if let Some(data) = inline.and_then(|d| d.get("data")).and_then(Value::as_str) {
                let bytes = decode_base64(data).ok_or_else(|| {
                    ProviderError::invalid_response("google", "image part is not valid base64")
                })?;
                debug!(bytes = bytes.len(), "google returned image");
                return Ok(GeneratedImage::new(bytes));
            }
        }

        Err(ProviderError::invalid_response(
            "google",
            format!("no image in response (text: {:?})", joined_text(&response)),
        ))
    }

    async fn understand_image(
        &self,
        model: &str,
        image: &ImageInput,
        prompt: &str,
    ) -> ProviderResult<String> {
        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [
                    {
                        "inline_data": {
                            "mime_type": image.format.mime_type(),
                            "data": image.to_base64(),
                        }
                    },
                    { "text": prompt },
                ],
            }],
        });
        let response = self.generate_content(model, &body).await?;

        let text = joined_text(&response);
        if text.trim().is_empty() {
            return Err(ProviderError::invalid_response(
                "google",
                "response has no text parts",
            ));
        }
        Ok(text)
    }

    fn provider_name(&self) -> &'static str {
        "google"
    }
}

fn check_block_reason(provider: &str, response: &Value) -> ProviderResult<()> {
    match response
        .pointer("/promptFeedback/blockReason")
        .and_then(Value::as_str)
    {
        Some(reason) => Err(ProviderError::invalid_response(
            provider,
            format!("prompt blocked: {}", reason),
        )),
        None => Ok(()),
    }
}

fn candidate_parts(response: &Value) -> impl Iterator<Item = &Value> {
    response
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn joined_text(response: &Value) -> String {
    candidate_parts(response)
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("")
}
