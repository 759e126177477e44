//! Provider client abstraction and factory.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ProviderResult;
use crate::fake::FakeClient;
use crate::google::GoogleClient;
use crate::image::{GeneratedImage, ImageInput};
use crate::openrouter::OpenRouterClient;
use crate::replicate::ReplicateClient;
use crate::types::{ProviderConfig, ProviderKind};

/// A provider able to render images from text and to answer prompts about images.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Text-to-image generation.
    async fn generate_image(&self, model: &str, prompt: &str) -> ProviderResult<GeneratedImage>;

    /// Image understanding: returns the model's raw text answer.
    async fn understand_image(
        &self,
        model: &str,
        image: &ImageInput,
        prompt: &str,
    ) -> ProviderResult<String>;

    fn provider_name(&self) -> &'static str;
}

/// Build a client for a provider name (`google`, `openrouter`, `replicate`, `fake`).
pub fn build_client(
    provider: &str,
    config: &ProviderConfig,
) -> ProviderResult<Arc<dyn ProviderClient>> {
    let kind: ProviderKind = provider.parse()?;
    let client: Arc<dyn ProviderClient> = match kind {
        ProviderKind::Google => Arc::new(GoogleClient::new(config)?),
        ProviderKind::OpenRouter => Arc::new(OpenRouterClient::new(config)?),
        ProviderKind::Replicate => Arc::new(ReplicateClient::new(config)?),
        ProviderKind::Fake => Arc::new(FakeClient::new(config.fake_answer.clone())),
    };
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;

    #[test]
    fn factory_requires_api_keys() {
        let config = ProviderConfig::default();
        let err = build_client("google", &config).err().expect("missing key");
        assert!(matches!(
            err,
            ProviderError::MissingApiKey { ref env_var } if env_var == "GOOGLE_API_KEY"
        ));
        let err = build_client("openrouter", &config).err().expect("missing key");
        assert!(err.to_string().contains("OPENROUTER_API_KEY"));
        let err = build_client("replicate", &config).err().expect("missing key");
        assert!(err.to_string().contains("REPLICATE_API_TOKEN"));
    }

    #[test]
    fn factory_builds_known_providers() {
        let config = ProviderConfig::default()
            .with_google_api_key("g")
            .with_openrouter_api_key("o")
            .with_replicate_api_token("r");
        assert_eq!(
            build_client("google", &config).unwrap().provider_name(),
            "google"
        );
        assert_eq!(
            build_client("OpenRouter", &config).unwrap().provider_name(),
            "openrouter"
        );
        assert_eq!(
            build_client("replicate", &config).unwrap().provider_name(),
            "replicate"
        );
        assert_eq!(
            build_client("fake", &config).unwrap().provider_name(),
            "fake"
        );
        assert!(matches!(
            build_client("dall-e", &config).err(),
            Some(ProviderError::UnsupportedProvider { .. })
        ));
    }
}
