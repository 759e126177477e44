//! Deterministic offline provider for tests and dry runs.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::client::ProviderClient;
use crate::error::ProviderResult;
use crate::image::{GeneratedImage, ImageInput, PLACEHOLDER_PNG};

#[derive(Debug, Clone)]
pub struct FakeClient {
    answer: String,
}

impl FakeClient {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
        }
    }
}

#[async_trait]
impl ProviderClient for FakeClient {
    async fn generate_image(&self, model: &str, prompt: &str) -> ProviderResult<GeneratedImage> {
        debug!(model, prompt_len = prompt.len(), "fake image generation");
        Ok(GeneratedImage::new(PLACEHOLDER_PNG.to_vec()))
    }

    async fn understand_image(
        &self,
        model: &str,
        image: &ImageInput,
        _prompt: &str,
    ) -> ProviderResult<String> {
        debug!(model, image_bytes = image.bytes.len(), "fake judgment");
        Ok(json!({
            "analysis": "fake judge",
            "answer": self.answer,
        })
        .to_string())
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageFormat;

    #[tokio::test]
    async fn fake_client_is_deterministic() {
        let client = FakeClient::new("0");
        let image = client.generate_image("any", "prompt").await.unwrap();
        assert_eq!(image.format, ImageFormat::Png);
        assert_eq!(image.bytes, PLACEHOLDER_PNG);

        let text = client
            .understand_image("judge", &ImageInput::new(image.bytes), "q")
            .await
            .unwrap();
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["answer"], "0");
    }
}
